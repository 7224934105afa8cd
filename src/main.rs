//! # multirotate
//!
//! Command-line driver for staggered rotation sets.
//!
//! ## Error Handling
//!
//! Library failures carry their named error; file and top-level failures
//! are wrapped with context. Any failure exits non-zero with the full chain
//! on stderr.
//!
//! ## Output
//!
//! JSON goes to stdout. Logs and summaries go to stderr, filtered by
//! `RUST_LOG` (default `info`).

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use multirotate::cli::Cli;
use multirotate::commands::execute_command;
use multirotate_reconciler::ReconcilerBuilder;

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let reconciler = ReconcilerBuilder::new().build();

    let outcome = execute_command(cli.command, &reconciler)?;
    if !outcome.output.is_empty() {
        println!("{}", outcome.output);
    }
    if let Some(summary) = outcome.summary {
        eprintln!("{summary}");
    }
    Ok(())
}

/// Initialize tracing subscriber with environment filter, writing to stderr.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
