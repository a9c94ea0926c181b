// CLI binary entry point for oggframe

mod cli;

use clap::Parser;
use env_logger::{Builder, Env};
use log::error;
use std::process;

fn init_logger(quiet: bool) {
    // RUST_LOG wins; otherwise info, or warn in quiet mode
    let default = if quiet { "warn" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .init();
}

fn main() {
    let config = cli::Config::parse();
    init_logger(config.quiet);

    match cli::run(&config) {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    }
}
