//! Furthest-out slot selection.

use crate::types::Slot;

/// Index of the slot with the latest expiration.
///
/// Ties keep the earliest index. Returns `None` for an empty slice.
pub fn select_current(slots: &[Slot]) -> Option<usize> {
    let mut iter = slots.iter().enumerate();
    let (mut best, first) = iter.next()?;
    let mut furthest = first.expiration;

    for (index, slot) in iter {
        if slot.expiration > furthest {
            furthest = slot.expiration;
            best = index;
        }
    }

    Some(best)
}
