//! Core types for the reconciler.

use std::fmt;

use multirotate_core::{Error, Period, Result, Timestamp};

pub use multirotate_core::MAX_COUNT;

/// Slot count used when the declaration does not name one.
pub const DEFAULT_COUNT: usize = 2;

/// A declared input that is either known or not yet decided by the caller.
///
/// Deferred inputs fall back to the previously committed value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field<T> {
    /// The caller supplied this value.
    Known(T),
    /// The caller has not decided this value for this pass.
    #[default]
    Deferred,
}

impl<T> Field<T> {
    /// Check if the value is known.
    pub const fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Borrow the known value.
    pub const fn as_known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            Self::Deferred => None,
        }
    }

    /// The known value, or the committed one when deferred.
    pub fn or_committed(self, committed: Option<T>) -> Option<T> {
        match self {
            Self::Known(value) => Some(value),
            Self::Deferred => committed,
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Deferred, Self::Known)
    }
}

/// Resolved rotation configuration, as committed with a record.
///
/// The period is kept as declared and re-parsed on every evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    /// Rotation period as declared, e.g. `"1h30m"`.
    pub period: String,
    /// Number of slots. Fixed once the set exists.
    pub count: usize,
    /// Tag stamped onto newly rotated slots.
    pub version: String,
}

impl RotationConfig {
    /// Create a config with the default count and an empty version.
    pub fn new(period: impl Into<String>) -> Self {
        Self {
            period: period.into(),
            count: DEFAULT_COUNT,
            version: String::new(),
        }
    }

    /// Parse the declared period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` if the period is not a positive duration.
    pub fn period(&self) -> Result<Period> {
        self.period.parse()
    }
}

/// Declared configuration for one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredConfig {
    /// Rotation period text.
    pub rotation_period: Field<String>,
    /// Slot count.
    pub count: Field<usize>,
    /// Version tag for future rotations.
    pub version: Field<String>,
    /// Evaluation instant, RFC 3339.
    pub now: Field<String>,
}

impl DeclaredConfig {
    /// Declare a set with the given period, default count and version, and
    /// an undetermined evaluation instant.
    pub fn new(rotation_period: impl Into<String>) -> Self {
        Self {
            rotation_period: Field::Known(rotation_period.into()),
            count: Field::Known(DEFAULT_COUNT),
            version: Field::Known(String::new()),
            now: Field::Deferred,
        }
    }

    /// Set the slot count.
    #[must_use]
    pub const fn with_count(mut self, count: usize) -> Self {
        self.count = Field::Known(count);
        self
    }

    /// Set the version tag.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Field::Known(version.into());
        self
    }

    /// Pin the evaluation instant.
    #[must_use]
    pub fn with_now(mut self, now: impl Into<String>) -> Self {
        self.now = Field::Known(now.into());
        self
    }
}

/// One rotating object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// When the slot was last (re)created.
    pub creation: Timestamp,
    /// When the slot expires.
    pub expiration: Timestamp,
    /// Version tag the slot was created with.
    pub version: String,
}

impl Slot {
    /// A slot is expired once `now` is strictly after its expiration.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expiration
    }
}

/// The staggered window of slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationState {
    /// Exactly `count` slots, in stored order.
    pub slots: Vec<Slot>,
    /// Start of the most recently assigned rotation period.
    pub last_rotate: Timestamp,
    /// Index of the slot expiring furthest out.
    pub current_index: usize,
}

impl RotationState {
    /// Check the structural invariants against the committed count.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` if the slot list length differs from `count`
    /// or the current index is out of range.
    pub fn validate(&self, count: usize) -> Result<()> {
        if self.slots.len() != count {
            return Err(Error::invalid_record(format!(
                "expected {count} slots, found {}",
                self.slots.len()
            )));
        }
        if self.current_index >= count {
            return Err(Error::invalid_record(format!(
                "current index {} out of range for {count} slots",
                self.current_index
            )));
        }
        Ok(())
    }
}

/// Everything committed for one rotation set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    /// Configuration the state was computed with.
    pub config: RotationConfig,
    /// The slot window.
    pub state: RotationState,
    /// Instant the state was last evaluated or refreshed at.
    pub now: Timestamp,
}

/// Which pass of the orchestrator is asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Dry run. The result may be discarded.
    Plan,
    /// Commit. The result will be persisted.
    Apply,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plan => write!(f, "plan"),
            Self::Apply => write!(f, "apply"),
        }
    }
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// A full record was computed.
    Reconciled {
        /// The new record.
        record: ResourceRecord,
        /// Indices of slots that were (re)created by this pass.
        rotated: Vec<usize>,
    },
    /// An input needed to build a fresh window is not yet known and nothing
    /// was committed before. The computed fields stay undetermined.
    Deferred {
        /// The first undetermined input.
        missing: &'static str,
    },
}

impl Reconciliation {
    /// The computed record, if any.
    pub const fn record(&self) -> Option<&ResourceRecord> {
        match self {
            Self::Reconciled { record, .. } => Some(record),
            Self::Deferred { .. } => None,
        }
    }

    /// Take the computed record.
    ///
    /// # Errors
    ///
    /// Returns `Undetermined` naming the missing input when deferred.
    pub fn into_record(self) -> Result<ResourceRecord> {
        match self {
            Self::Reconciled { record, .. } => Ok(record),
            Self::Deferred { missing } => Err(Error::undetermined(missing)),
        }
    }

    /// Indices rotated by this pass.
    pub fn rotated(&self) -> &[usize] {
        match self {
            Self::Reconciled { rotated, .. } => rotated,
            Self::Deferred { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn ts(raw: &str) -> Timestamp {
        Timestamp::parse("now", raw).unwrap()
    }

    #[test]
    fn test_field_fallback() {
        assert_eq!(Field::Known(3).or_committed(Some(2)), Some(3));
        assert_eq!(Field::<u32>::Deferred.or_committed(Some(2)), Some(2));
        assert_eq!(Field::<u32>::Deferred.or_committed(None), None);
        assert_eq!(Field::from(Some("x")), Field::Known("x"));
        assert!(!Field::<u8>::from(None).is_known());
    }

    #[test]
    fn test_declared_defaults() {
        let declared = DeclaredConfig::new("1h");
        assert_eq!(declared.count, Field::Known(DEFAULT_COUNT));
        assert_eq!(declared.version, Field::Known(String::new()));
        assert_eq!(declared.now, Field::Deferred);
    }

    #[test]
    fn test_slot_expiry_is_strict() {
        let slot = Slot {
            creation: ts("2024-01-01T00:00:00Z"),
            expiration: ts("2024-01-01T01:00:00Z"),
            version: String::new(),
        };
        assert!(!slot.is_expired_at(ts("2024-01-01T01:00:00Z")));
        assert!(slot.is_expired_at(ts("2024-01-01T01:00:01Z")));
    }

    #[test]
    fn test_state_validate() {
        let slot = Slot {
            creation: ts("2024-01-01T00:00:00Z"),
            expiration: ts("2024-01-01T01:00:00Z"),
            version: String::new(),
        };
        let state = RotationState {
            slots: vec![slot],
            last_rotate: ts("2024-01-01T00:00:00Z"),
            current_index: 0,
        };
        assert!(state.validate(1).is_ok());
        assert!(matches!(
            state.validate(2),
            Err(Error::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_deferred_has_no_record() {
        let deferred = Reconciliation::Deferred { missing: "now" };
        assert!(deferred.record().is_none());
        assert!(deferred.rotated().is_empty());
        assert!(matches!(
            deferred.into_record(),
            Err(Error::Undetermined { .. })
        ));
    }
}
