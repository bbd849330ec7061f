pub mod args;
pub mod freq;
