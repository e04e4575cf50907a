//! Cascading delay: when a match goes live late, later matches at the same venue slide back.

use crate::models::{MatchId, MatchStatus, TournamentResult};
use crate::store::{ChangeFilter, MatchChange, MatchPatch, ScheduleStore, WriteBatch};
use chrono::Duration;
use log::{debug, error, info, warn};
use std::sync::Arc;

/// Result of reacting to one change.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DelayOutcome {
    /// Not a scheduled -> live transition.
    Ignored,
    /// Started on time or early.
    OnTime,
    Shifted { delay: Duration, shifted: Vec<MatchId> },
}

/// Shift later same-event, same-venue matches by the observed start delay.
///
/// All shifts go out as one batch: either every selected match moves or none does. Matches
/// that are no longer `scheduled` keep their time.
pub fn propagate_delay(
    store: &dyn ScheduleStore,
    change: &MatchChange,
) -> TournamentResult<DelayOutcome> {
    if !change.is_transition(MatchStatus::Scheduled, MatchStatus::Live) {
        return Ok(DelayOutcome::Ignored);
    }
    let (Some(before), Some(actual_start)) = (change.before.as_ref(), change.after.actual_start)
    else {
        return Ok(DelayOutcome::Ignored);
    };
    let original = before.scheduled_at;
    let delay = actual_start - original;
    if delay <= Duration::zero() {
        debug!("{} started on time ({}s early)", before.id, -delay.num_seconds());
        return Ok(DelayOutcome::OnTime);
    }

    let later = store.matches_at_venue_after(&before.event_id, &before.venue, original)?;
    let mut batch = WriteBatch::new();
    let mut shifted = Vec::new();
    for m in later.into_iter().filter(|m| m.id != before.id) {
        if m.status != MatchStatus::Scheduled {
            warn!("Not shifting {}: already {:?}", m.id, m.status);
            continue;
        }
        batch = batch.update(
            m.id.clone(),
            MatchPatch {
                scheduled_at: Some(m.scheduled_at + delay),
                ..MatchPatch::default()
            },
        );
        shifted.push(m.id);
    }
    if !batch.is_empty() {
        store.commit(batch)?;
        info!(
            "{} started {}s late at {}: shifted {} match(es)",
            before.id,
            delay.num_seconds(),
            before.venue,
            shifted.len()
        );
    }
    Ok(DelayOutcome::Shifted { delay, shifted })
}

/// Background worker bound to the store's change feed.
pub struct DelayPropagator {
    store: Arc<dyn ScheduleStore>,
}

impl DelayPropagator {
    pub fn new(store: Arc<dyn ScheduleStore>) -> Self {
        Self { store }
    }

    pub async fn run(self) {
        let mut changes = self.store.subscribe(ChangeFilter::All);
        while let Some(change) = changes.recv().await {
            if !change.is_transition(MatchStatus::Scheduled, MatchStatus::Live) {
                continue;
            }
            if let Err(e) = propagate_delay(self.store.as_ref(), &change) {
                // Nothing was shifted; the start has to be replayed to retry.
                error!("Delay propagation for {} failed: {e}", change.match_id());
            }
        }
        debug!("change feed closed, delay propagator stopping");
    }
}
