//! Initial window construction.

use multirotate_core::{Period, Result, Timestamp};
use tracing::debug;

use crate::types::Slot;

/// Build the first `count` slots at `now`.
///
/// The pointer starts `count - 1` periods before `now`. Each slot expires
/// `count` periods after the pointer, then the pointer advances one period,
/// so slot `i` expires at `now + (i + 1) * period`. Every slot is born at
/// `now`. Returns the slots and the pointer after `count` advances.
///
/// # Errors
///
/// Returns `OutOfRange` if the schedule leaves the representable time range.
pub fn initialize(
    now: Timestamp,
    period: Period,
    count: usize,
    version: &str,
) -> Result<(Vec<Slot>, Timestamp)> {
    let mut last_rotate = now.checked_sub_periods(period, count.saturating_sub(1))?;
    let mut slots = Vec::with_capacity(count);

    for _ in 0..count {
        let expiration = last_rotate.checked_add_periods(period, count)?;
        last_rotate = last_rotate.checked_add_periods(period, 1)?;
        slots.push(Slot {
            creation: now,
            expiration,
            version: version.to_string(),
        });
    }

    debug!(count, %period, %last_rotate, "Initialized rotation window");
    Ok((slots, last_rotate))
}
