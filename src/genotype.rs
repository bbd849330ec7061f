pub mod afreq;
