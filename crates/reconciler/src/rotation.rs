//! Rotation advancer and slot evaluator.
//!
//! These two steps run on every evaluation of an existing set, in order:
//! [`advance`] catches the last-rotate pointer up to the evaluation instant,
//! then [`evaluate`] re-creates every expired slot against that pointer.

use multirotate_core::{Error, Period, Result, Timestamp};
use tracing::debug;

use crate::types::Slot;

/// Catch the last-rotate pointer up so it is never more than `count`
/// periods behind `now`.
///
/// Equivalent to adding `period` to `last_rotate` while
/// `last_rotate < now - count * period`, computed in one step so the cost
/// does not depend on how long the set sat idle. Slots are not touched.
///
/// # Errors
///
/// Returns `OutOfRange` if the target instant is not representable.
pub fn advance(
    last_rotate: Timestamp,
    period: Period,
    now: Timestamp,
    count: usize,
) -> Result<Timestamp> {
    let horizon = now.checked_sub_periods(period, count)?;
    if last_rotate >= horizon {
        return Ok(last_rotate);
    }

    let gap = last_rotate.nanos_until(&horizon);
    let step = i128::from(period.as_nanos());
    let periods = gap
        .checked_add(step.saturating_sub(1))
        .and_then(|g| g.checked_div(step))
        .ok_or_else(|| Error::out_of_range(format!("catching up {gap}ns by {period}")))?;
    let shift = periods
        .checked_mul(step)
        .ok_or_else(|| Error::out_of_range(format!("catching up {periods} x {period}")))?;

    let advanced = last_rotate.checked_add_nanos(shift)?;
    debug!(from = %last_rotate, to = %advanced, periods, "Caught up last-rotate pointer");
    Ok(advanced)
}

/// Output of [`evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Slots in stored order, expired ones replaced.
    pub slots: Vec<Slot>,
    /// Pointer after one advance per rotated slot.
    pub last_rotate: Timestamp,
    /// Indices of the slots that were rotated, ascending.
    pub rotated: Vec<usize>,
}

/// Re-create every slot that has expired at `now`.
///
/// Slots are visited in stored order. An expired slot is replaced in place:
/// born at `now`, expiring `count` periods after the pointer, tagged with
/// `version`, after which the pointer moves one period. Live slots keep
/// everything, including a stale version tag.
///
/// # Errors
///
/// Returns `OutOfRange` if a new expiration is not representable.
pub fn evaluate(
    slots: &[Slot],
    last_rotate: Timestamp,
    period: Period,
    now: Timestamp,
    version: &str,
) -> Result<Evaluation> {
    let count = slots.len();
    let mut last_rotate = last_rotate;
    let mut rotated = Vec::new();
    let mut next = Vec::with_capacity(count);

    for (index, slot) in slots.iter().enumerate() {
        if !slot.is_expired_at(now) {
            next.push(slot.clone());
            continue;
        }

        let expiration = last_rotate.checked_add_periods(period, count)?;
        last_rotate = last_rotate.checked_add_periods(period, 1)?;
        debug!(
            index,
            expired = %slot.expiration,
            %expiration,
            version,
            "Rotating slot"
        );
        next.push(Slot {
            creation: now,
            expiration,
            version: version.to_string(),
        });
        rotated.push(index);
    }

    Ok(Evaluation {
        slots: next,
        last_rotate,
        rotated,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    fn ts(raw: &str) -> Timestamp {
        Timestamp::parse("now", raw).unwrap()
    }

    fn hour() -> Period {
        "1h".parse().unwrap()
    }

    fn slot(expiration: &str, version: &str) -> Slot {
        Slot {
            creation: ts("2024-01-01T00:00:00Z"),
            expiration: ts(expiration),
            version: version.to_string(),
        }
    }

    /// Reference behavior: the literal catch-up loop.
    fn advance_by_loop(
        mut last_rotate: Timestamp,
        period: Period,
        now: Timestamp,
        count: usize,
    ) -> Timestamp {
        let horizon = now.checked_sub_periods(period, count).unwrap();
        while last_rotate < horizon {
            last_rotate = last_rotate.checked_add_periods(period, 1).unwrap();
        }
        last_rotate
    }

    #[test]
    fn test_advance_is_noop_when_recent() {
        let lr = ts("2024-01-01T01:00:00Z");
        let now = ts("2024-01-01T02:30:00Z");
        assert_eq!(advance(lr, hour(), now, 2).unwrap(), lr);
    }

    #[test]
    fn test_advance_catches_up_whole_periods() {
        let lr = ts("2024-01-01T00:00:00Z");
        let now = ts("2024-01-01T10:30:00Z");
        // Horizon is 08:30, so the pointer lands on 09:00.
        let advanced = advance(lr, hour(), now, 2).unwrap();
        assert_eq!(advanced, ts("2024-01-01T09:00:00Z"));
        assert_eq!(advanced, advance_by_loop(lr, hour(), now, 2));
    }

    #[test]
    fn test_advance_lands_exactly_on_horizon() {
        let lr = ts("2024-01-01T00:00:00Z");
        let now = ts("2024-01-01T05:00:00Z");
        assert_eq!(
            advance(lr, hour(), now, 2).unwrap(),
            ts("2024-01-01T03:00:00Z")
        );
    }

    #[test]
    fn test_advance_with_odd_period() {
        let period: Period = "7m13s".parse().unwrap();
        let lr = ts("2024-01-01T00:00:00Z");
        let now = ts("2024-01-03T17:42:19Z");
        assert_eq!(
            advance(lr, period, now, 3).unwrap(),
            advance_by_loop(lr, period, now, 3)
        );
    }

    #[test]
    fn test_evaluate_rotates_only_expired() {
        let slots = vec![
            slot("2024-01-01T01:00:00Z", "old"),
            slot("2024-01-01T02:00:00Z", "old"),
        ];
        let now = ts("2024-01-01T01:01:00Z");
        let result = evaluate(&slots, ts("2024-01-01T01:00:00Z"), hour(), now, "new").unwrap();

        assert_eq!(result.rotated, vec![0]);
        assert_eq!(result.slots[0].expiration, ts("2024-01-01T03:00:00Z"));
        assert_eq!(result.slots[0].creation, now);
        assert_eq!(result.slots[0].version, "new");
        assert_eq!(result.slots[1], slots[1]);
        assert_eq!(result.last_rotate, ts("2024-01-01T02:00:00Z"));
    }

    #[test]
    fn test_evaluate_expiry_boundary_is_exclusive() {
        let slots = vec![slot("2024-01-01T01:00:00Z", "")];
        let now = ts("2024-01-01T01:00:00Z");
        let result = evaluate(&slots, ts("2024-01-01T01:00:00Z"), hour(), now, "").unwrap();
        assert!(result.rotated.is_empty());
        assert_eq!(result.slots, slots);
    }

    #[test]
    fn test_evaluate_staggers_multiple_expired() {
        let slots = vec![
            slot("2024-01-01T01:00:00Z", ""),
            slot("2024-01-01T02:00:00Z", ""),
            slot("2024-01-01T03:00:00Z", ""),
        ];
        let now = ts("2024-01-01T04:30:00Z");
        let lr = advance(ts("2024-01-01T01:00:00Z"), hour(), now, 3).unwrap();
        let result = evaluate(&slots, lr, hour(), now, "").unwrap();

        assert_eq!(result.rotated, vec![0, 1, 2]);
        assert_eq!(result.slots[0].expiration, ts("2024-01-01T05:00:00Z"));
        assert_eq!(result.slots[2].expiration, ts("2024-01-01T07:00:00Z"));
        assert_eq!(result.last_rotate, ts("2024-01-01T05:00:00Z"));
        assert!(result.slots[0].expiration < result.slots[1].expiration);
        assert!(result.slots[1].expiration < result.slots[2].expiration);
        assert!(result.slots.iter().all(|s| s.expiration > now));
    }

    #[test]
    fn test_evaluate_empty_set() {
        let lr = ts("2024-01-01T00:00:00Z");
        let result = evaluate(&[], lr, hour(), lr, "").unwrap();
        assert!(result.slots.is_empty());
        assert_eq!(result.last_rotate, lr);
    }
}
