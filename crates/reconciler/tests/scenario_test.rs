//! End-to-end rotation scenarios through the public reconciler API.
//!
//! Each test walks a set through create and successive evaluations the way
//! an orchestrator would: plan, apply, persist, repeat.

#![allow(clippy::panic)]
#![allow(clippy::indexing_slicing)]
#![allow(clippy::arithmetic_side_effects)]

use std::sync::Arc;
use std::thread;

use multirotate_reconciler::{
    reconcile, DeclaredConfig, Error, FixedClock, Reconciler, ReconcilerBuilder,
    Reconciliation, ResourceModel, ResourceRecord, Timestamp, MAX_COUNT,
};

const T: &str = "2024-06-01T00:00:00Z";

/// Test helper: Unwrap a Result or panic with context
fn unwrap_result<V, E: std::fmt::Display>(result: std::result::Result<V, E>, context: &str) -> V {
    match result {
        Ok(value) => value,
        Err(e) => panic!("{}: {}", context, e),
    }
}

fn ts(raw: &str) -> Timestamp {
    unwrap_result(Timestamp::parse("now", raw), "timestamp should parse")
}

fn at(hours: i64, minutes: i64) -> String {
    let base = ts(T).as_datetime();
    let shifted = base + chrono::TimeDelta::hours(hours) + chrono::TimeDelta::minutes(minutes);
    Timestamp::from_datetime(shifted).to_string()
}

fn hourly(now: &str) -> DeclaredConfig {
    DeclaredConfig::new("1h").with_now(now)
}

fn fixed_reconciler(now: &str) -> (Reconciler, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(ts(now)));
    let reconciler = ReconcilerBuilder::new().with_clock(clock.clone()).build();
    (reconciler, clock)
}

/// Plan then apply, asserting the preview matches the commit.
fn plan_and_apply(
    reconciler: &Reconciler,
    declared: &DeclaredConfig,
    prior: Option<&ResourceRecord>,
) -> ResourceRecord {
    let planned = unwrap_result(reconciler.plan(declared, prior), "plan should succeed");
    let applied = unwrap_result(reconciler.apply(declared, prior), "apply should succeed");
    assert_eq!(planned.record(), Some(&applied), "plan must match apply");
    applied
}

fn expirations(record: &ResourceRecord) -> Vec<String> {
    record
        .state
        .slots
        .iter()
        .map(|s| s.expiration.to_string())
        .collect()
}

#[test]
fn test_hourly_pair_rotates_alternately() {
    let (reconciler, _clock) = fixed_reconciler(T);

    // GIVEN: a fresh hourly set of two
    let created = plan_and_apply(&reconciler, &hourly(T), None);
    assert_eq!(expirations(&created), vec![at(1, 0), at(2, 0)]);
    assert_eq!(created.state.current_index, 1);
    assert_eq!(created.state.last_rotate, ts(&at(1, 0)));

    // WHEN: the first slot lapses
    let second = plan_and_apply(&reconciler, &hourly(&at(1, 1)), Some(&created));
    // THEN: only it is replaced, and it becomes current
    assert_eq!(expirations(&second), vec![at(3, 0), at(2, 0)]);
    assert_eq!(second.state.current_index, 0);
    assert_eq!(second.state.slots[0].creation, ts(&at(1, 1)));
    assert_eq!(second.state.slots[1], created.state.slots[1]);

    // WHEN: the second slot lapses
    let third = plan_and_apply(&reconciler, &hourly(&at(2, 1)), Some(&second));
    assert_eq!(expirations(&third), vec![at(3, 0), at(4, 0)]);
    assert_eq!(third.state.current_index, 1);
    assert_eq!(third.state.last_rotate, ts(&at(3, 0)));
}

#[test]
fn test_long_idle_set_catches_up_in_one_pass() {
    let created = unwrap_result(
        unwrap_result(reconcile(&hourly(T), None), "create").into_record(),
        "record",
    );
    let now = at(10, 30);

    let result = unwrap_result(reconcile(&hourly(&now), Some(&created)), "rotate");
    let record = unwrap_result(result.clone().into_record(), "record");

    assert_eq!(result.rotated(), &[0, 1]);
    assert_eq!(expirations(&record), vec![at(11, 0), at(12, 0)]);
    assert_eq!(record.state.last_rotate, ts(&at(11, 0)));
    assert_eq!(record.state.current_index, 1);
    assert!(record.state.slots.iter().all(|s| s.expiration > ts(&now)));
}

#[test]
fn test_version_bump_reaches_only_rotated_slots() {
    let created = unwrap_result(
        unwrap_result(reconcile(&hourly(T).with_version("v1"), None), "create").into_record(),
        "record",
    );
    let declared = hourly(&at(1, 1)).with_version("v2");
    let record = unwrap_result(
        unwrap_result(reconcile(&declared, Some(&created)), "rotate").into_record(),
        "record",
    );

    assert_eq!(record.config.version, "v2");
    assert_eq!(record.state.slots[0].version, "v2");
    assert_eq!(record.state.slots[1].version, "v1");
}

#[test]
fn test_count_change_rejected_and_state_untouched() {
    let created = unwrap_result(
        unwrap_result(reconcile(&hourly(T), None), "create").into_record(),
        "record",
    );
    let snapshot = created.clone();

    let result = reconcile(&hourly(&at(5, 0)).with_count(3), Some(&created));
    assert_eq!(
        result,
        Err(Error::immutable_field_changed("count", 2, 3))
    );
    assert_eq!(created, snapshot);
}

#[test]
fn test_apply_with_undetermined_now_uses_clock() {
    let (reconciler, clock) = fixed_reconciler(T);
    let declared = DeclaredConfig::new("30m").with_count(3);

    // Plan has no instant and nothing committed: computed fields stay unknown.
    let planned = unwrap_result(reconciler.plan(&declared, None), "plan");
    assert_eq!(planned, Reconciliation::Deferred { missing: "now" });

    let created = unwrap_result(reconciler.apply(&declared, None), "apply");
    assert_eq!(created.now, ts(T));
    assert_eq!(created.state.slots.len(), 3);

    // Later plan without an instant reuses the committed one and rotates nothing.
    clock.set(ts(&at(2, 0)));
    let replanned = unwrap_result(reconciler.plan(&declared, Some(&created)), "plan");
    assert_eq!(replanned.record(), Some(&created));
    assert!(replanned.rotated().is_empty());

    // Refresh stamps the clock, after which plan sees the lapse.
    let refreshed = reconciler.refresh(&created);
    assert_eq!(refreshed.now, ts(&at(2, 0)));
    let after = unwrap_result(reconciler.plan(&declared, Some(&refreshed)), "plan");
    assert!(!after.rotated().is_empty());
}

#[test]
fn test_count_boundary() {
    // GIVEN: the largest accepted count with a tiny period
    let declared = DeclaredConfig::new("1ns").with_count(MAX_COUNT).with_now(T);

    // WHEN: the set is created
    let created = unwrap_result(
        unwrap_result(reconcile(&declared, None), "create at MAX_COUNT").into_record(),
        "record",
    );

    // THEN: every slot exists and the last one is current
    assert_eq!(created.state.slots.len(), MAX_COUNT);
    assert_eq!(created.state.current_index, MAX_COUNT - 1);

    // One past the bound is rejected before anything is allocated.
    let over = DeclaredConfig::new("1ns").with_count(MAX_COUNT + 1).with_now(T);
    match reconcile(&over, None) {
        Err(Error::InvalidCount { count }) => {
            assert_eq!(count, i64::try_from(MAX_COUNT + 1).unwrap_or(i64::MAX));
        }
        other => panic!("expected InvalidCount, got {:?}", other),
    }
    let huge = DeclaredConfig::new("1h").with_count(usize::MAX).with_now(T);
    assert!(matches!(reconcile(&huge, None), Err(Error::InvalidCount { .. })));
}

#[test]
fn test_corrupted_expiration_surfaces_on_decode() {
    let created = unwrap_result(
        unwrap_result(reconcile(&hourly(T), None), "create").into_record(),
        "record",
    );
    let mut model = ResourceModel::encode(&created);
    if let Some(slots) = model.slots.as_mut() {
        slots[0].expiration = "2024-13-40T00:00:00Z".to_string();
    }

    match model.decode() {
        Err(Error::InvalidExpiration { index, input, .. }) => {
            assert_eq!(index, 0);
            assert_eq!(input, "2024-13-40T00:00:00Z");
        }
        other => panic!("expected InvalidExpiration, got {:?}", other),
    }
}

#[test]
fn test_concurrent_sets_share_one_reconciler() {
    let (reconciler, _clock) = fixed_reconciler(T);

    let results: Vec<ResourceRecord> = thread::scope(|scope| {
        let handles: Vec<_> = (1..=8usize)
            .map(|count| {
                let reconciler = &reconciler;
                scope.spawn(move || {
                    let declared = hourly(T).with_count(count);
                    let mut record = unwrap_result(reconciler.apply(&declared, None), "create");
                    for hour in 1..=24 {
                        let declared = hourly(&at(hour, 1)).with_count(count);
                        record = unwrap_result(reconciler.apply(&declared, Some(&record)), "rotate");
                    }
                    record
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| unwrap_result(h.join().map_err(|_| "thread panicked"), "join"))
            .collect()
    });

    for (offset, record) in results.iter().enumerate() {
        let count = offset + 1;
        assert_eq!(record.state.slots.len(), count);
        let now = ts(&at(24, 1));
        assert!(record.state.slots.iter().all(|s| !s.is_expired_at(now)));
        let sequential = {
            let mut r = unwrap_result(
                unwrap_result(reconcile(&hourly(T).with_count(count), None), "create")
                    .into_record(),
                "record",
            );
            for hour in 1..=24 {
                let declared = hourly(&at(hour, 1)).with_count(count);
                r = unwrap_result(
                    unwrap_result(reconcile(&declared, Some(&r)), "rotate").into_record(),
                    "record",
                );
            }
            r
        };
        assert_eq!(record, &sequential);
    }
}
