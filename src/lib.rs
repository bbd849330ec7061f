#![cfg_attr(not(test), warn(clippy::unwrap_used))]
#![cfg_attr(not(test), warn(clippy::expect_used))]

pub mod config;
pub mod genotype;
pub mod group;
pub mod indiv;
pub mod io;
pub mod utils;
pub mod vcf;
