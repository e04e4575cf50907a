//! Persistence contract: record queries, atomic multi-record batches, push subscriptions.

mod memory;

pub use memory::MemoryStore;

use crate::models::{
    Event, EventId, GameMatch, MatchId, MatchStatus, SlotTable, Team, TournamentError,
    TournamentResult,
};
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Field-level update of one match. `None` leaves the field as is.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchPatch {
    #[serde(default)]
    pub status: Option<MatchStatus>,
    #[serde(default)]
    pub score_a: Option<u32>,
    #[serde(default)]
    pub score_b: Option<u32>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_start: Option<DateTime<Utc>>,
    /// Reject the write unless the stored record is in this status.
    #[serde(default)]
    pub expect_status: Option<MatchStatus>,
}

impl MatchPatch {
    pub fn is_empty(&self) -> bool {
        *self == MatchPatch::default()
    }

    /// Apply onto `game`, enforcing the per-record invariants.
    pub fn apply_to(&self, game: &mut GameMatch) -> TournamentResult<()> {
        if let Some(expected) = self.expect_status {
            if game.status != expected {
                return Err(TournamentError::InvalidStatus {
                    expected,
                    actual: game.status,
                });
            }
        }
        if self.scheduled_at.is_some() && game.status != MatchStatus::Scheduled {
            return Err(TournamentError::InvariantViolation(format!(
                "scheduled_at of {} cannot change once it is {:?}",
                game.id, game.status
            )));
        }
        if let Some(at) = self.scheduled_at {
            game.scheduled_at = at;
        }
        if let Some(status) = self.status {
            game.status = status;
        }
        if let Some(s) = self.score_a {
            game.score_a = Some(s);
        }
        if let Some(s) = self.score_b {
            game.score_b = Some(s);
        }
        if let Some(at) = self.actual_start {
            game.actual_start = Some(at);
        }
        if game.status == MatchStatus::Void {
            game.score_a = None;
            game.score_b = None;
        }
        check_invariants(game)
    }
}

/// Record-level invariants every stored match satisfies.
pub fn check_invariants(game: &GameMatch) -> TournamentResult<()> {
    if !game.status.carries_score() && (game.score_a.is_some() || game.score_b.is_some()) {
        return Err(TournamentError::InvariantViolation(format!(
            "{} carries a score while {:?}",
            game.id, game.status
        )));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum WriteOp {
    Insert(GameMatch),
    Update { id: MatchId, patch: MatchPatch },
}

/// Operations applied all-or-nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, game: GameMatch) -> Self {
        self.ops.push(WriteOp::Insert(game));
        self
    }

    pub fn update(mut self, id: impl Into<MatchId>, patch: MatchPatch) -> Self {
        self.ops.push(WriteOp::Update {
            id: id.into(),
            patch,
        });
        self
    }

    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// A committed write, with the record as it was before and after.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchChange {
    /// `None` for inserts.
    pub before: Option<GameMatch>,
    pub after: GameMatch,
}

impl MatchChange {
    pub fn match_id(&self) -> &str {
        &self.after.id
    }

    /// True when the write moved the match from `from` to `to`.
    pub fn is_transition(&self, from: MatchStatus, to: MatchStatus) -> bool {
        self.before.as_ref().map(|b| b.status) == Some(from) && self.after.status == to
    }
}

/// Which changes a subscription receives.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChangeFilter {
    All,
    Match(MatchId),
    Event(EventId),
}

impl ChangeFilter {
    pub fn accepts(&self, change: &MatchChange) -> bool {
        match self {
            ChangeFilter::All => true,
            ChangeFilter::Match(id) => change.after.id == *id,
            ChangeFilter::Event(id) => change.after.event_id == *id,
        }
    }
}

/// Push subscription over the store's change feed. Dropping it unsubscribes.
pub struct Subscription {
    rx: broadcast::Receiver<MatchChange>,
    filter: ChangeFilter,
}

impl Subscription {
    pub fn new(rx: broadcast::Receiver<MatchChange>, filter: ChangeFilter) -> Self {
        Self { rx, filter }
    }

    pub fn filter(&self) -> &ChangeFilter {
        &self.filter
    }

    /// Next matching change; `None` once the store is gone.
    pub async fn recv(&mut self) -> Option<MatchChange> {
        loop {
            match self.rx.recv().await {
                Ok(change) if self.filter.accepts(&change) => return Some(change),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("subscriber {:?} lagged, skipped {} change(s)", self.filter, skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-delivered matching change, without waiting.
    pub fn try_recv(&mut self) -> Option<MatchChange> {
        loop {
            match self.rx.try_recv() {
                Ok(change) if self.filter.accepts(&change) => return Some(change),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("subscriber {:?} lagged, skipped {} change(s)", self.filter, skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

/// What the core needs from persistence.
pub trait ScheduleStore: Send + Sync {
    fn event(&self, id: &str) -> TournamentResult<Event>;

    fn events(&self) -> TournamentResult<Vec<Event>>;

    fn teams_for_event(&self, event_id: &str) -> TournamentResult<Vec<Team>>;

    fn get_match(&self, id: &str) -> TournamentResult<GameMatch>;

    /// All matches of the event, ordered by id.
    fn matches_for_event(&self, event_id: &str) -> TournamentResult<Vec<GameMatch>>;

    /// Matches of the event at `venue` scheduled strictly after `after`, earliest first.
    fn matches_at_venue_after(
        &self,
        event_id: &str,
        venue: &str,
        after: DateTime<Utc>,
    ) -> TournamentResult<Vec<GameMatch>>;

    fn slot_table(&self, event_id: &str) -> TournamentResult<SlotTable>;

    /// Apply the batch atomically and publish one change per written record.
    fn commit(&self, batch: WriteBatch) -> TournamentResult<Vec<MatchChange>>;

    fn subscribe(&self, filter: ChangeFilter) -> Subscription;
}
