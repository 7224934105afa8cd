//! Reconciliation of multi-slot rotation sets.
//!
//! A rotation set is a fixed number of slots, each expiring at a different
//! time, rotated on a regular period so that one slot is always furthest
//! from expiring. Every evaluation runs the same pipeline:
//!
//! - **Create**: with no committed record, lay out `count` slots staggered
//!   one period apart ([`window::initialize`])
//! - **Advance**: catch the last-rotate pointer up to the evaluation instant
//!   ([`rotation::advance`])
//! - **Evaluate**: re-create each expired slot at the pointer
//!   ([`rotation::evaluate`])
//! - **Select**: point `current_index` at the furthest-out slot
//!   ([`select::select_current`])
//!
//! Plan and apply run the identical pipeline against the same inputs, so a
//! preview always matches what gets committed.
//!
//! # Example
//!
//! ```
//! use multirotate_reconciler::{reconcile, DeclaredConfig};
//!
//! let declared = DeclaredConfig::new("1h").with_now("2024-01-01T00:00:00Z");
//! let created = reconcile(&declared, None)?.into_record()?;
//! assert_eq!(created.state.current_index, 1);
//!
//! let later = DeclaredConfig::new("1h").with_now("2024-01-01T01:01:00Z");
//! let rotated = reconcile(&later, Some(&created))?;
//! assert_eq!(rotated.rotated(), &[0]);
//! # Ok::<(), multirotate_reconciler::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod model;
pub mod reconciler;
pub mod rotation;
pub mod schema;
pub mod select;
pub mod types;
pub mod window;

pub use multirotate_core::{Clock, Error, FixedClock, Period, Result, SystemClock, Timestamp};
pub use model::{ResourceModel, SlotModel};
pub use reconciler::{reconcile, Reconciler, ReconcilerBuilder};
pub use schema::{resource_schema, Schema, RESOURCE_TYPE};
pub use types::{
    DeclaredConfig, Field, Phase, Reconciliation, ResourceRecord, RotationConfig, RotationState,
    Slot, DEFAULT_COUNT, MAX_COUNT,
};
