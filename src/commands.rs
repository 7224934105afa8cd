//! CLI command handlers.
//!
//! Handlers return what to print instead of printing, so the binary owns
//! stdout and tests can inspect the output directly.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use itertools::Itertools;
use multirotate_reconciler::{
    resource_schema, DeclaredConfig, Phase, Reconciler, Reconciliation, ResourceModel,
    ResourceRecord,
};
use tracing::info;

use crate::cli::Commands;
use crate::config::SetConfig;

/// What a command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Machine-readable output for stdout.
    pub output: String,
    /// Human-readable one-liner for stderr.
    pub summary: Option<String>,
}

impl Outcome {
    fn new(output: String, summary: impl Into<String>) -> Self {
        Self {
            output,
            summary: Some(summary.into()),
        }
    }
}

/// Execute a CLI command.
///
/// This is the main command dispatcher that routes to the appropriate handler.
///
/// # Errors
///
/// Returns an error if a file cannot be read or written, or reconciliation fails.
pub fn execute_command(command: Commands, reconciler: &Reconciler) -> Result<Outcome> {
    match command {
        Commands::Plan {
            config,
            state,
            now,
            rotation_version,
        } => cmd_plan(reconciler, &config, state.as_deref(), now, rotation_version),

        Commands::Apply {
            config,
            state,
            now,
            rotation_version,
        } => cmd_apply(reconciler, &config, &state, now, rotation_version),

        Commands::Refresh { state } => cmd_refresh(reconciler, &state),

        Commands::Destroy { state } => cmd_destroy(&state),

        Commands::Schema => Ok(Outcome {
            output: resource_schema().to_string(),
            summary: None,
        }),
    }
}

/// Preview the next state.
///
/// # Errors
///
/// Returns an error if the config or state cannot be loaded or reconciliation fails.
pub fn cmd_plan(
    reconciler: &Reconciler,
    config: &Path,
    state: Option<&Path>,
    now: Option<String>,
    rotation_version: Option<String>,
) -> Result<Outcome> {
    let declared = load_declared(config, now, rotation_version)?;
    let prior = match state {
        Some(path) => load_state(path)?,
        None => None,
    };

    let result = reconciler.plan(&declared, prior.as_ref())?;
    let model = ResourceModel::planned(&declared, &result);
    Ok(Outcome::new(
        model.to_json_pretty()?,
        summarize(&result, prior.as_ref()),
    ))
}

/// Compute and commit the next state.
///
/// # Errors
///
/// Returns an error if the config or state cannot be loaded, reconciliation
/// fails, or the state cannot be written.
pub fn cmd_apply(
    reconciler: &Reconciler,
    config: &Path,
    state: &Path,
    now: Option<String>,
    rotation_version: Option<String>,
) -> Result<Outcome> {
    let declared = load_declared(config, now, rotation_version)?;
    let prior = load_state(state)?;

    let result = reconciler.reconcile(Phase::Apply, &declared, prior.as_ref())?;
    let summary = summarize(&result, prior.as_ref());
    let record = result.into_record()?;
    let output = write_state(state, &record)?;

    info!(state = %state.display(), current_index = record.state.current_index, "Committed rotation set");
    Ok(Outcome::new(output, summary))
}

/// Stamp the committed state with the reconciler's clock.
///
/// # Errors
///
/// Returns an error if the state file is missing, corrupted, or cannot be written.
pub fn cmd_refresh(reconciler: &Reconciler, state: &Path) -> Result<Outcome> {
    let record = load_state(state)?
        .with_context(|| format!("No state at {}; apply first", state.display()))?;
    let refreshed = reconciler.refresh(&record);
    let output = write_state(state, &refreshed)?;
    Ok(Outcome::new(output, format!("refreshed at {}", refreshed.now)))
}

/// Remove the committed state. Removing an absent state succeeds.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn cmd_destroy(state: &Path) -> Result<Outcome> {
    if !state.exists() {
        info!(state = %state.display(), "No state to destroy");
        return Ok(Outcome::new(String::new(), "nothing to destroy"));
    }
    std::fs::remove_file(state)
        .with_context(|| format!("Failed to remove {}", state.display()))?;
    info!(state = %state.display(), "Destroyed rotation set");
    Ok(Outcome::new(String::new(), "destroyed"))
}

fn load_declared(
    config: &Path,
    now: Option<String>,
    rotation_version: Option<String>,
) -> Result<DeclaredConfig> {
    let config = SetConfig::load(config)?
        .with_now(now)
        .with_version(rotation_version);
    Ok(config.to_declared()?)
}

/// Load committed state. A missing file means the set does not exist yet.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not decode.
pub fn load_state(path: &Path) -> Result<Option<ResourceRecord>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state {}", path.display()))?;
    let record = ResourceModel::from_json(&text)
        .and_then(|model| model.decode())
        .with_context(|| format!("Corrupted state {}", path.display()))?;
    Ok(Some(record))
}

/// Write committed state through a temporary sibling and a rename.
fn write_state(path: &Path, record: &ResourceRecord) -> Result<String> {
    let json = ResourceModel::encode(record).to_json_pretty()?;
    let temp = temp_sibling(path);
    std::fs::write(&temp, &json)
        .with_context(|| format!("Failed to write {}", temp.display()))?;
    std::fs::rename(&temp, path)
        .with_context(|| format!("Failed to move state into {}", path.display()))?;
    Ok(json)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// One line describing what the pass does.
fn summarize(result: &Reconciliation, prior: Option<&ResourceRecord>) -> String {
    match result {
        Reconciliation::Deferred { missing } => {
            format!("create: slots known after apply ('{missing}' undetermined)")
        }
        Reconciliation::Reconciled { record, rotated } => {
            let current = record.state.current_index;
            if prior.is_none() {
                format!(
                    "create: {} slots, current index {current}",
                    record.state.slots.len()
                )
            } else if rotated.is_empty() {
                format!("no changes, current index {current}")
            } else {
                let indices = rotated.iter().join(", ");
                format!("rotate: slots {indices}, current index {current}")
            }
        }
    }
}
