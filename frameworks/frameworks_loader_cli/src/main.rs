//! modload Binary Entry Point
//!
//! Builds a loader hierarchy from `--layer` directories and runs one command
//! against its innermost loader:
//! - `resolve <NAME> [--link]`: resolve a module, parent first
//! - `load-library <NAME>`: load a native library into the innermost loader
//! - `resource <NAME> [--all]`: locate a resource
//!
//! Logging goes to stderr, filtered by `MODLOAD_LOG` (default `warn`).

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use frameworks_loader_cli::{run, LoaderArgs};

/// Environment variable holding the log filter
const LOG_FILTER_VAR: &str = "MODLOAD_LOG";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_FILTER_VAR).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = LoaderArgs::parse();

    match run(&args) {
        Ok(lines) => {
            for line in lines {
                println!("{}", line);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
