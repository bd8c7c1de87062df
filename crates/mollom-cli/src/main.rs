//! Mollom command-line client.
//!
//! # Usage
//!
//! ```bash
//! # Keys from a config file
//! mollom --config mollom.toml check --body "Buy cheap watches"
//!
//! # Keys from the environment, REST API
//! MOLLOM_PUBLIC_KEY=... MOLLOM_PRIVATE_KEY=... mollom --rest sites
//! ```
//!
//! Results are written to stdout as JSON; logs go to stderr.

mod commands;
mod error;

use std::{io::Write, process::ExitCode};

use clap::Parser;
use commands::{Args, run};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            let _ = writeln!(std::io::stderr().lock(), "error: {e}");
            ExitCode::from(e.exit_code())
        },
    }
}
