use clap::Parser;
use regex::Regex;
use rulecascade::cli::config_file::ConfigFile;
use rulecascade::cli::format::{self, RuleView};
use rulecascade::cli::{Cli, Commands, OutputFormat};
use rulecascade::scan;
use std::fmt::Display;
use std::process;

fn fail(e: impl Display) -> ! {
    eprintln!("\x1b[31merror\x1b[0m: {}", e);
    process::exit(2);
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "rulecascade=error",
        1 => "rulecascade=warn",
        2 => "rulecascade=info",
        3 => "rulecascade=debug",
        _ => "rulecascade=trace",
    };
    rulecascade::init_tracing(log_level);

    match cli.command {
        Commands::Resolve {
            path,
            config,
            format: output_format,
            rule,
            all,
        } => {
            let filter = match rule.as_deref().map(Regex::new).transpose() {
                Ok(f) => f,
                Err(e) => fail(format_args!("invalid --rule pattern: {}", e)),
            };
            let view = RuleView {
                filter,
                include_off: all,
            };

            let (resolver, document) = match ConfigFile::load(&config) {
                Ok(file) => file.into_parts(),
                Err(e) => fail(e),
            };
            let resolved = match resolver.resolve(&document, &path) {
                Ok(r) => r,
                Err(e) => fail(format_args!("failed to resolve config: {}", e)),
            };

            match output_format {
                OutputFormat::Pretty => format::print_pretty(&path, &resolved, &view),
                OutputFormat::Json => format::print_json(&path, &resolved, &view),
            }
        }
        Commands::Batch {
            paths,
            config,
            format: output_format,
        } => {
            let result = match scan::run_scan(&config, &paths) {
                Ok(r) => r,
                Err(e) => fail(e),
            };

            match output_format {
                OutputFormat::Pretty => format::print_batch_pretty(&result),
                OutputFormat::Json => format::print_batch_json(&result),
            }
        }
    }
}
