#![cfg_attr(not(test), warn(clippy::unwrap_used))]
#![cfg_attr(not(test), warn(clippy::expect_used))]

use clap::Parser;
use grpfreq::utils::error::show_snafu_error;
use grpfreq_imp::args::Cli;
use grpfreq_imp::freq;

mod grpfreq_imp;

pub fn main() {
    env_logger::Builder::new()
        .filter(None, log::LevelFilter::Info)
        .format_module_path(false)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    if let Err(e) = freq::main_freq(&cli) {
        show_snafu_error(e);
        std::process::exit(1);
    }
}
