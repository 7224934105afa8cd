#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # multirotate
//!
//! Staggered multi-slot rotation sets, planned and applied against a
//! file-backed state.
//!
//! This library re-exports the workspace crates for convenience.

pub use multirotate_core;
pub use multirotate_reconciler;

pub mod cli;
pub mod commands;
pub mod config;
