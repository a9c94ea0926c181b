// CLI module for oggframe
//
// The command-line tool is a thin user of the library: it walks pages,
// reads packets and re-frames streams, and formats reports.

pub mod commands;
pub mod config;
pub mod output;

pub use commands::run;
pub use config::Config;
