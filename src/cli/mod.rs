pub mod config_file;
pub mod format;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "rulecascade",
    version,
    about = "Resolve cascading lint configuration into the effective rules for a file"
)]
pub struct Cli {
    /// Verbose output (repeat for more: -v warn, -vv info, -vvv debug, -vvvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the effective configuration for one file path (the file need not exist)
    Resolve {
        /// Path relative to the config file's directory
        path: String,

        /// Path to the config file (.toml or .json)
        #[arg(short, long, default_value = "rulecascade.toml")]
        config: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,

        /// Only show rules whose id matches this regex
        #[arg(long)]
        rule: Option<String>,

        /// Also show rules that are turned off
        #[arg(long)]
        all: bool,
    },

    /// Resolve every file under the given paths
    Batch {
        /// Files or directories to resolve
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Path to the config file (.toml or .json)
        #[arg(short, long, default_value = "rulecascade.toml")]
        config: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_resolve_command() {
        let cli = Cli::parse_from([
            "rulecascade",
            "-vv",
            "resolve",
            "src/app.js",
            "--config",
            "lint.json",
            "--rule",
            "^react:",
            "--all",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Resolve {
                path,
                config,
                format,
                rule,
                all,
            } => {
                assert_eq!(path, "src/app.js");
                assert_eq!(config, PathBuf::from("lint.json"));
                assert_eq!(format, OutputFormat::Pretty);
                assert_eq!(rule.as_deref(), Some("^react:"));
                assert!(all);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn batch_defaults() {
        let cli = Cli::parse_from(["rulecascade", "batch", "--format", "json"]);
        match cli.command {
            Commands::Batch {
                paths,
                config,
                format,
            } => {
                assert_eq!(paths, vec![PathBuf::from(".")]);
                assert_eq!(config, PathBuf::from("rulecascade.toml"));
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
