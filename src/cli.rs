//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// multirotate - staggered rotation sets
#[derive(Parser, Debug)]
#[command(name = "multirotate")]
#[command(version)]
#[command(about = "Plan and apply staggered multi-slot rotation sets")]
#[command(
    long_about = "multirotate keeps a fixed number of slots rotating on a regular period, so one slot is always furthest from expiring. State is kept in a JSON file; configuration in TOML."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Preview the next state without writing anything
    Plan {
        /// Config file (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Committed state file (JSON); absent means the set does not exist yet
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Evaluation instant (RFC 3339)
        #[arg(long)]
        now: Option<String>,

        /// Version tag for rotated slots, overriding the config
        #[arg(long)]
        rotation_version: Option<String>,
    },

    /// Compute the next state and commit it to the state file
    Apply {
        /// Config file (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// State file (JSON), created if missing
        #[arg(short, long)]
        state: PathBuf,

        /// Evaluation instant (RFC 3339); defaults to the current time
        #[arg(long)]
        now: Option<String>,

        /// Version tag for rotated slots, overriding the config
        #[arg(long)]
        rotation_version: Option<String>,
    },

    /// Stamp the committed state with the current time
    Refresh {
        /// State file (JSON)
        #[arg(short, long)]
        state: PathBuf,
    },

    /// Remove the committed state
    Destroy {
        /// State file (JSON)
        #[arg(short, long)]
        state: PathBuf,
    },

    /// Print the attribute schema
    Schema,
}
