//! Wire representation of a rotation set.
//!
//! [`ResourceModel`] is what the orchestrator stores and diffs. Conversion to
//! and from [`ResourceRecord`] is explicit so every parse failure maps to a
//! named error and nothing is half-decoded.

use multirotate_core::{Error, Period, Result, Timestamp, MAX_COUNT};
use serde::{Deserialize, Serialize};

use crate::types::{
    DeclaredConfig, Reconciliation, ResourceRecord, RotationConfig, RotationState, Slot,
};

/// One slot on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotModel {
    /// RFC 3339 creation instant.
    pub creation: String,
    /// RFC 3339 expiration instant.
    pub expiration: String,
    /// Version tag.
    pub version: String,
}

/// A rotation set on the wire. `None` marks a value not yet known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceModel {
    /// Rotation period text.
    pub rotation_period: Option<String>,
    /// Slot count.
    pub count: Option<i64>,
    /// Version tag for future rotations.
    pub version: Option<String>,
    /// Instant last evaluated or refreshed at.
    pub now: Option<String>,
    /// The slots, in stored order.
    pub slots: Option<Vec<SlotModel>>,
    /// Last-rotate pointer.
    pub last_rotate: Option<String>,
    /// Index of the furthest-out slot.
    pub current_index: Option<i64>,
}

impl ResourceModel {
    /// Encode a committed record.
    pub fn encode(record: &ResourceRecord) -> Self {
        Self {
            rotation_period: Some(record.config.period.clone()),
            count: Some(i64::try_from(record.config.count).unwrap_or(i64::MAX)),
            version: Some(record.config.version.clone()),
            now: Some(record.now.to_string()),
            slots: Some(
                record
                    .state
                    .slots
                    .iter()
                    .map(|slot| SlotModel {
                        creation: slot.creation.to_string(),
                        expiration: slot.expiration.to_string(),
                        version: slot.version.clone(),
                    })
                    .collect(),
            ),
            last_rotate: Some(record.state.last_rotate.to_string()),
            current_index: Some(i64::try_from(record.state.current_index).unwrap_or(i64::MAX)),
        }
    }

    /// Encode the outcome of a pass. Deferred outcomes carry the declared
    /// configuration and leave every computed field unknown.
    pub fn planned(declared: &DeclaredConfig, reconciliation: &Reconciliation) -> Self {
        match reconciliation.record() {
            Some(record) => Self::encode(record),
            None => Self {
                rotation_period: declared.rotation_period.as_known().cloned(),
                count: declared
                    .count
                    .as_known()
                    .map(|c| i64::try_from(*c).unwrap_or(i64::MAX)),
                version: declared.version.as_known().cloned(),
                now: declared.now.as_known().cloned(),
                ..Self::default()
            },
        }
    }

    /// Decode a persisted record.
    ///
    /// # Errors
    ///
    /// - `InvalidRecord` if a field is missing or the slot list is inconsistent
    /// - `InvalidPeriod` if the stored period is not a positive duration
    /// - `InvalidCount` if the stored count is out of range
    /// - `InvalidTimestamp` if `now`, `last_rotate`, or a slot creation does not parse
    /// - `InvalidExpiration` if a slot expiration does not parse
    pub fn decode(&self) -> Result<ResourceRecord> {
        let period = required(self.rotation_period.as_ref(), "rotation_period")?;
        period.parse::<Period>()?;

        let raw_count = *required(self.count.as_ref(), "count")?;
        let count = usize::try_from(raw_count)
            .ok()
            .filter(|c| (1..=MAX_COUNT).contains(c))
            .ok_or_else(|| Error::invalid_count(raw_count))?;

        let version = required(self.version.as_ref(), "version")?;
        let now = Timestamp::parse("now", required(self.now.as_ref(), "now")?)?;
        let last_rotate = Timestamp::parse(
            "last_rotate",
            required(self.last_rotate.as_ref(), "last_rotate")?,
        )?;

        let slots = required(self.slots.as_ref(), "slots")?
            .iter()
            .enumerate()
            .map(|(index, slot)| decode_slot(index, slot))
            .collect::<Result<Vec<_>>>()?;

        let raw_index = *required(self.current_index.as_ref(), "current_index")?;
        let current_index = usize::try_from(raw_index).map_err(|_| {
            Error::invalid_record(format!("current index {raw_index} is negative"))
        })?;

        let state = RotationState {
            slots,
            last_rotate,
            current_index,
        };
        state.validate(count)?;

        Ok(ResourceRecord {
            config: RotationConfig {
                period: period.clone(),
                count,
                version: version.clone(),
            },
            state,
            now,
        })
    }

    /// Parse from JSON.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` if the text is not a valid model.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::invalid_record(e.to_string()))
    }

    /// Render as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::invalid_record(e.to_string()))
    }
}

fn required<'a, T>(value: Option<&'a T>, field: &str) -> Result<&'a T> {
    value.ok_or_else(|| Error::invalid_record(format!("missing '{field}'")))
}

fn decode_slot(index: usize, slot: &SlotModel) -> Result<Slot> {
    let expiration = Timestamp::parse("expiration", &slot.expiration)
        .map_err(|e| match e {
            Error::InvalidTimestamp { input, reason, .. } => {
                Error::invalid_expiration(index, input, reason)
            }
            other => other,
        })?;
    let creation = Timestamp::parse(&format!("slots[{index}].creation"), &slot.creation)?;
    Ok(Slot {
        creation,
        expiration,
        version: slot.version.clone(),
    })
}
