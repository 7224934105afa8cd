//! Error types for rotation reconciliation.
//!
//! Every failure is detected locally, aborts the reconciliation call, and is
//! reported verbatim to the caller. Nothing is silently corrected.

use thiserror::Error;

/// Core error type for multirotate operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The declared rotation period did not parse to a positive duration.
    #[error("invalid rotation period '{input}': {reason}")]
    InvalidPeriod { input: String, reason: String },

    /// A supplied or persisted timestamp did not parse.
    #[error("invalid timestamp for '{field}' ('{input}'): {reason}")]
    InvalidTimestamp {
        field: String,
        input: String,
        reason: String,
    },

    /// A persisted slot expiration did not parse. The prior state is corrupted.
    #[error("invalid expiration for slot {index} ('{input}'): {reason}")]
    InvalidExpiration {
        index: usize,
        input: String,
        reason: String,
    },

    /// A field that is fixed at creation differs from its committed value.
    #[error("'{field}' cannot be changed after creation (committed {prior}, declared {declared})")]
    ImmutableFieldChanged {
        field: String,
        prior: String,
        declared: String,
    },

    /// The slot count is zero, negative, or too large to schedule.
    #[error("invalid slot count {count}: must be between 1 and {max}", max = crate::MAX_COUNT)]
    InvalidCount { count: i64 },

    /// Timestamp arithmetic left the representable range.
    #[error("time out of range: {reason}")]
    OutOfRange { reason: String },

    /// A persisted record is structurally inconsistent.
    #[error("invalid record: {reason}")]
    InvalidRecord { reason: String },

    /// A field needed to commit was still undetermined at apply time.
    #[error("'{field}' must be known before apply")]
    Undetermined { field: String },
}

impl Error {
    /// Create an invalid period error.
    pub fn invalid_period(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPeriod {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid timestamp error.
    pub fn invalid_timestamp(
        field: impl Into<String>,
        input: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidTimestamp {
            field: field.into(),
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid expiration error.
    pub fn invalid_expiration(
        index: usize,
        input: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidExpiration {
            index,
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create an immutable field changed error.
    pub fn immutable_field_changed(
        field: impl Into<String>,
        prior: impl ToString,
        declared: impl ToString,
    ) -> Self {
        Self::ImmutableFieldChanged {
            field: field.into(),
            prior: prior.to_string(),
            declared: declared.to_string(),
        }
    }

    /// Create an invalid count error.
    pub const fn invalid_count(count: i64) -> Self {
        Self::InvalidCount { count }
    }

    /// Create an out of range error.
    pub fn out_of_range(reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            reason: reason.into(),
        }
    }

    /// Create an invalid record error.
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            reason: reason.into(),
        }
    }

    /// Create an undetermined field error.
    pub fn undetermined(field: impl Into<String>) -> Self {
        Self::Undetermined {
            field: field.into(),
        }
    }

    /// Stable name of the error kind, as reported to the orchestrator.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPeriod { .. } => "InvalidPeriod",
            Self::InvalidTimestamp { .. } => "InvalidTimestamp",
            Self::InvalidExpiration { .. } => "InvalidExpiration",
            Self::ImmutableFieldChanged { .. } => "ImmutableFieldChanged",
            Self::InvalidCount { .. } => "InvalidCount",
            Self::OutOfRange { .. } => "OutOfRange",
            Self::InvalidRecord { .. } => "InvalidRecord",
            Self::Undetermined { .. } => "Undetermined",
        }
    }
}
