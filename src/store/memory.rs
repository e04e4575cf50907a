//! In-memory store backing the server and the tests.

use crate::models::{
    Event, EventId, GameMatch, MatchId, SlotEntry, SlotTable, Team, TeamId, TournamentError,
    TournamentResult,
};
use crate::store::{
    check_invariants, ChangeFilter, MatchChange, ScheduleStore, Subscription, WriteBatch, WriteOp,
};
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

/// Buffered changes per subscriber before it starts lagging.
const CHANGE_FEED_CAPACITY: usize = 1024;

#[derive(Default)]
struct Records {
    events: BTreeMap<EventId, Event>,
    teams: BTreeMap<(EventId, TeamId), Team>,
    matches: BTreeMap<MatchId, GameMatch>,
    slots: SlotTable,
}

pub struct MemoryStore {
    records: RwLock<Records>,
    changes: broadcast::Sender<MatchChange>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            records: RwLock::new(Records::default()),
            changes,
        }
    }

    fn read(&self) -> TournamentResult<RwLockReadGuard<'_, Records>> {
        self.records
            .read()
            .map_err(|_| TournamentError::Store("lock error".into()))
    }

    fn write(&self) -> TournamentResult<RwLockWriteGuard<'_, Records>> {
        self.records
            .write()
            .map_err(|_| TournamentError::Store("lock error".into()))
    }

    pub fn put_event(&self, event: Event) -> TournamentResult<()> {
        self.write()?.events.insert(event.id.clone(), event);
        Ok(())
    }

    pub fn put_team(&self, team: Team) -> TournamentResult<()> {
        self.write()?
            .teams
            .insert((team.event_id.clone(), team.id.clone()), team);
        Ok(())
    }

    pub fn put_slots(&self, entries: impl IntoIterator<Item = SlotEntry>) -> TournamentResult<()> {
        self.write()?.slots.extend(entries);
        Ok(())
    }

    /// Bulk reset of one event (administrative surface). Publishes nothing.
    pub fn clear_event(&self, event_id: &str) -> TournamentResult<usize> {
        let mut g = self.write()?;
        let before = g.matches.len();
        g.matches.retain(|_, m| m.event_id != event_id);
        g.teams.retain(|(e, _), _| e != event_id);
        g.slots.remove_event(event_id);
        let removed = before - g.matches.len();
        info!("Cleared event {}: removed {} match(es)", event_id, removed);
        Ok(removed)
    }
}

impl ScheduleStore for MemoryStore {
    fn event(&self, id: &str) -> TournamentResult<Event> {
        self.read()?
            .events
            .get(id)
            .cloned()
            .ok_or_else(|| TournamentError::EventNotFound(id.to_string()))
    }

    fn events(&self) -> TournamentResult<Vec<Event>> {
        Ok(self.read()?.events.values().cloned().collect())
    }

    fn teams_for_event(&self, event_id: &str) -> TournamentResult<Vec<Team>> {
        Ok(self
            .read()?
            .teams
            .values()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect())
    }

    fn get_match(&self, id: &str) -> TournamentResult<GameMatch> {
        self.read()?
            .matches
            .get(id)
            .cloned()
            .ok_or_else(|| TournamentError::MatchNotFound(id.to_string()))
    }

    fn matches_for_event(&self, event_id: &str) -> TournamentResult<Vec<GameMatch>> {
        Ok(self
            .read()?
            .matches
            .values()
            .filter(|m| m.event_id == event_id)
            .cloned()
            .collect())
    }

    fn matches_at_venue_after(
        &self,
        event_id: &str,
        venue: &str,
        after: DateTime<Utc>,
    ) -> TournamentResult<Vec<GameMatch>> {
        let mut found: Vec<GameMatch> = self
            .read()?
            .matches
            .values()
            .filter(|m| m.event_id == event_id && m.venue == venue && m.scheduled_at > after)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    fn slot_table(&self, event_id: &str) -> TournamentResult<SlotTable> {
        Ok(self.read()?.slots.for_event(event_id))
    }

    fn commit(&self, batch: WriteBatch) -> TournamentResult<Vec<MatchChange>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let changes = {
            let mut g = self.write()?;
            // Stage every write first; nothing lands unless the whole batch validates.
            let mut staged: HashMap<MatchId, GameMatch> = HashMap::new();
            let mut originals: HashMap<MatchId, Option<GameMatch>> = HashMap::new();
            let mut order: Vec<MatchId> = Vec::new();
            for op in batch.into_ops() {
                match op {
                    WriteOp::Insert(game) => {
                        if g.matches.contains_key(&game.id) || staged.contains_key(&game.id) {
                            return Err(TournamentError::InvariantViolation(format!(
                                "match {} already exists",
                                game.id
                            )));
                        }
                        check_invariants(&game)?;
                        originals.insert(game.id.clone(), None);
                        order.push(game.id.clone());
                        staged.insert(game.id.clone(), game);
                    }
                    WriteOp::Update { id, patch } => {
                        if !staged.contains_key(&id) {
                            let current = g
                                .matches
                                .get(&id)
                                .cloned()
                                .ok_or_else(|| TournamentError::MatchNotFound(id.clone()))?;
                            originals.insert(id.clone(), Some(current.clone()));
                            order.push(id.clone());
                            staged.insert(id.clone(), current);
                        }
                        if let Some(game) = staged.get_mut(&id) {
                            patch.apply_to(game)?;
                        }
                    }
                }
            }
            let mut changes = Vec::with_capacity(order.len());
            for id in order {
                if let Some(mut after) = staged.remove(&id) {
                    let before = originals.remove(&id).flatten();
                    if let Some(before) = &before {
                        after.revision = before.revision + 1;
                    }
                    g.matches.insert(id, after.clone());
                    changes.push(MatchChange { before, after });
                }
            }
            changes
        };
        debug!("committed {} record(s)", changes.len());
        for change in &changes {
            // No receivers is fine.
            let _ = self.changes.send(change.clone());
        }
        Ok(changes)
    }

    fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        Subscription::new(self.changes.subscribe(), filter)
    }
}
