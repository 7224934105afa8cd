//! Core types for multirotate.
//!
//! - [`Error`] and [`Result`]: the named failures every reconciliation reports
//! - [`Period`]: a strictly positive rotation period parsed from `"1h30m"`-style text
//! - [`Timestamp`]: an RFC 3339 instant normalized to UTC
//! - [`Clock`]: the injectable time source used when an apply pass leaves
//!   the evaluation instant undetermined

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod clock;
pub mod error;
pub mod result;
pub mod time;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::Error;
pub use result::Result;
pub use time::{Period, Timestamp};

/// Largest number of slots a rotation set may hold.
pub const MAX_COUNT: usize = 65_536;
