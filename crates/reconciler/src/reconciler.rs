//! Reconciler implementation.
//!
//! A set moves from uninitialized (no prior record) to reconciled (a record
//! computed for one instant) to committed (the orchestrator persisted it).
//! Plan and apply run the same pure computation; they differ only in how an
//! undetermined evaluation instant is resolved.

use std::sync::Arc;

use multirotate_core::{Clock, Error, Period, Result, SystemClock, Timestamp};
use tracing::{debug, info, warn};

use crate::rotation::{advance, evaluate};
use crate::select::select_current;
use crate::types::{
    DeclaredConfig, Field, Phase, Reconciliation, ResourceRecord, RotationConfig, RotationState,
    MAX_COUNT,
};
use crate::window::initialize;

/// Compute the record for `declared` given the last committed record.
///
/// Deterministic: the result depends only on the arguments. Deferred inputs
/// fall back to `prior`; the evaluation instant falls back to the instant
/// the prior record was last evaluated or refreshed at.
///
/// # Errors
///
/// - `InvalidPeriod` if the period does not parse to a positive duration
/// - `InvalidTimestamp` if the declared instant does not parse
/// - `InvalidCount` if the count is zero or too large
/// - `ImmutableFieldChanged` if the count differs from the committed one
/// - `InvalidRecord` if `prior` is structurally corrupted
/// - `OutOfRange` if the schedule leaves the representable time range
pub fn reconcile(
    declared: &DeclaredConfig,
    prior: Option<&ResourceRecord>,
) -> Result<Reconciliation> {
    reconcile_at(declared, None, prior)
}

fn reconcile_at(
    declared: &DeclaredConfig,
    now_override: Option<Timestamp>,
    prior: Option<&ResourceRecord>,
) -> Result<Reconciliation> {
    if let (Field::Known(count), Some(prior)) = (&declared.count, prior) {
        if *count != prior.config.count {
            return Err(Error::immutable_field_changed(
                "count",
                prior.config.count,
                count,
            ));
        }
    }
    if let Some(count) = declared.count.as_known() {
        validate_count(*count)?;
    }
    if let Some(raw) = declared.rotation_period.as_known() {
        raw.parse::<Period>()?;
    }
    let declared_now = match (now_override, declared.now.as_known()) {
        (Some(now), _) => Some(now),
        (None, Some(raw)) => Some(Timestamp::parse("now", raw)?),
        (None, None) => None,
    };

    let committed = prior.map(|p| &p.config);
    let Some(count) = declared
        .count
        .clone()
        .or_committed(committed.map(|c| c.count))
    else {
        return Ok(Reconciliation::Deferred { missing: "count" });
    };
    let Some(period_text) = declared
        .rotation_period
        .clone()
        .or_committed(committed.map(|c| c.period.clone()))
    else {
        return Ok(Reconciliation::Deferred {
            missing: "rotation_period",
        });
    };
    let Some(version) = declared
        .version
        .clone()
        .or_committed(committed.map(|c| c.version.clone()))
    else {
        return Ok(Reconciliation::Deferred { missing: "version" });
    };
    let Some(now) = declared_now.or_else(|| prior.map(|p| p.now)) else {
        return Ok(Reconciliation::Deferred { missing: "now" });
    };

    let config = RotationConfig {
        period: period_text,
        count,
        version,
    };
    let period = config.period()?;

    match prior {
        None => create(config, period, now),
        Some(prior) => rotate(config, period, now, &prior.state),
    }
}

fn validate_count(count: usize) -> Result<()> {
    if count == 0 || count > MAX_COUNT {
        return Err(Error::invalid_count(
            i64::try_from(count).unwrap_or(i64::MAX),
        ));
    }
    Ok(())
}

fn create(config: RotationConfig, period: Period, now: Timestamp) -> Result<Reconciliation> {
    let (slots, last_rotate) = initialize(now, period, config.count, &config.version)?;
    // The last slot created is the furthest out.
    let current_index = config.count.saturating_sub(1);
    let rotated = (0..config.count).collect();

    Ok(Reconciliation::Reconciled {
        record: ResourceRecord {
            config,
            state: RotationState {
                slots,
                last_rotate,
                current_index,
            },
            now,
        },
        rotated,
    })
}

fn rotate(
    config: RotationConfig,
    period: Period,
    now: Timestamp,
    prior: &RotationState,
) -> Result<Reconciliation> {
    prior.validate(config.count)?;

    let last_rotate = advance(prior.last_rotate, period, now, config.count)?;
    let evaluation = evaluate(&prior.slots, last_rotate, period, now, &config.version)?;
    let current_index = select_current(&evaluation.slots)
        .ok_or_else(|| Error::invalid_record("rotation set has no slots"))?;

    Ok(Reconciliation::Reconciled {
        record: ResourceRecord {
            config,
            state: RotationState {
                slots: evaluation.slots,
                last_rotate: evaluation.last_rotate,
                current_index,
            },
            now,
        },
        rotated: evaluation.rotated,
    })
}

/// Drives plan and apply passes for rotation sets.
///
/// Holds no per-set state, so one reconciler can serve any number of sets
/// from any number of threads.
#[derive(Debug, Clone)]
pub struct Reconciler {
    /// Source of the instant used when an apply pass leaves `now` undetermined.
    clock: Arc<dyn Clock>,
}

impl Reconciler {
    /// Create a new reconciler.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Create a reconciler backed by the wall clock.
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock::new()))
    }

    /// Run one pass.
    ///
    /// A plan pass never reads the clock: with no instant declared it uses the
    /// committed one, or defers when nothing was committed. An apply pass
    /// takes an undetermined instant from the clock and must produce a record.
    ///
    /// # Errors
    ///
    /// Propagates every error of [`reconcile`]. An apply pass also fails with
    /// `Undetermined` if an input other than the instant is still unknown.
    pub fn reconcile(
        &self,
        phase: Phase,
        declared: &DeclaredConfig,
        prior: Option<&ResourceRecord>,
    ) -> Result<Reconciliation> {
        let now_override = match (phase, &declared.now, prior) {
            (Phase::Apply, Field::Deferred, _) => Some(self.clock.now()),
            (Phase::Plan, Field::Deferred, Some(prior)) => {
                warn!(%phase, now = %prior.now, "Evaluation instant undetermined, reusing committed instant");
                None
            }
            _ => None,
        };

        let result = reconcile_at(declared, now_override, prior)
            .inspect_err(|e| warn!(%phase, error = %e, kind = e.kind(), "Reconciliation failed"))?;

        match &result {
            Reconciliation::Reconciled { record, rotated } => {
                info!(
                    %phase,
                    created = prior.is_none(),
                    count = record.config.count,
                    rotated = rotated.len(),
                    current_index = record.state.current_index,
                    now = %record.now,
                    "Reconciled rotation set"
                );
            }
            Reconciliation::Deferred { missing } => {
                if phase == Phase::Apply {
                    warn!(%phase, missing, "Cannot commit with undetermined input");
                    return Err(Error::undetermined(*missing));
                }
                debug!(%phase, missing, "Deferring computed fields");
            }
        }

        Ok(result)
    }

    /// Dry-run pass.
    ///
    /// # Errors
    ///
    /// See [`Reconciler::reconcile`].
    pub fn plan(
        &self,
        declared: &DeclaredConfig,
        prior: Option<&ResourceRecord>,
    ) -> Result<Reconciliation> {
        self.reconcile(Phase::Plan, declared, prior)
    }

    /// Commit pass. Returns the record to persist.
    ///
    /// # Errors
    ///
    /// See [`Reconciler::reconcile`].
    pub fn apply(
        &self,
        declared: &DeclaredConfig,
        prior: Option<&ResourceRecord>,
    ) -> Result<ResourceRecord> {
        self.reconcile(Phase::Apply, declared, prior)?.into_record()
    }

    /// Re-read a committed record: stamp the current instant, rotate nothing.
    pub fn refresh(&self, record: &ResourceRecord) -> ResourceRecord {
        let now = self.clock.now();
        debug!(from = %record.now, to = %now, "Refreshed rotation set");
        ResourceRecord {
            now,
            ..record.clone()
        }
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::with_system_clock()
    }
}

/// Builder for Reconciler.
#[derive(Debug, Default)]
pub struct ReconcilerBuilder {
    clock: Option<Arc<dyn Clock>>,
}

impl ReconcilerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the clock used for undetermined apply-time instants.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the reconciler. Uses the wall clock unless one was set.
    pub fn build(self) -> Reconciler {
        self.clock
            .map_or_else(Reconciler::with_system_clock, Reconciler::new)
    }
}
