// CLI configuration
use clap::{Parser, Subcommand, ValueEnum};

use oggframe::OggConfig;

/// oggframe - inspect, verify and re-frame Ogg streams
#[derive(Parser, Debug)]
#[command(name = "oggframe")]
#[command(about = "Ogg page and packet inspection tool", long_about = None)]
#[command(version)]
#[command(author = "xwsjjctz <xwsjjctz@icloud.com>")]
pub struct Config {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub format: OutputFormat,

    /// Quiet mode (only warnings and errors on stderr)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Accept pages whose checksum does not match
    #[arg(long, global = true)]
    pub no_verify_crc: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Pretty,
    /// Compact JSON
    Json,
    /// Aligned columns
    Table,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize pages and logical streams of Ogg file(s)
    Info {
        /// Ogg file path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },

    /// List the packets of an Ogg file
    Packets {
        /// Ogg file path
        #[arg(value_name = "FILE")]
        file: String,

        /// Stop after this many packets
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Read every packet and report corruption
    Verify {
        /// Ogg file path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },

    /// Re-frame every logical stream into a new file
    Copy {
        /// Source Ogg file
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Target file
        #[arg(value_name = "TARGET")]
        target: String,

        /// Maximum segments per written page (1-255)
        #[arg(long)]
        page_segments: Option<u8>,
    },
}

impl Config {
    /// Library configuration: environment first, then command-line flags.
    pub fn ogg_config(&self) -> OggConfig {
        let mut cfg = OggConfig::from_env();
        if self.no_verify_crc {
            cfg = cfg.verify_checksums(false);
        }
        if let Commands::Copy {
            page_segments: Some(n),
            ..
        } = &self.command
        {
            cfg = cfg.max_segments_per_page(*n);
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_copy_with_flags() {
        let config = Config::parse_from([
            "oggframe",
            "--no-verify-crc",
            "copy",
            "in.ogg",
            "out.ogg",
            "--page-segments",
            "32",
        ]);
        let cfg = config.ogg_config();
        assert!(!cfg.verify_checksums);
        assert_eq!(cfg.max_segments_per_page, 32);
        assert_eq!(config.format, OutputFormat::Pretty);
    }

    #[test]
    fn test_parse_packets() {
        let config = Config::parse_from(["oggframe", "packets", "a.ogg", "-l", "5", "-f", "table"]);
        assert_eq!(config.format, OutputFormat::Table);
        match config.command {
            Commands::Packets { file, limit } => {
                assert_eq!(file, "a.ogg");
                assert_eq!(limit, Some(5));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
