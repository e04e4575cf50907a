//! Server-side owner of the authoritative match clocks.
//!
//! Every open view of a match shares one [`MatchClock`]. Sessions hold the clocks they look
//! at; when the last holder lets go, pending score writes are flushed and the clock is dropped.
//! Its countdown state is parked and restored the next time the match is opened.

use crate::config::DurationTable;
use crate::logic::clock::{ClockMemo, ClockView, MatchClock, TickOutcome};
use crate::models::{MatchId, Operator, TournamentError, TournamentResult};
use crate::store::{ChangeFilter, MatchChange, ScheduleStore};
use chrono::Utc;
use log::{debug, error, info};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::interval;
use uuid::Uuid;

/// Identifies one browser/operator session.
pub type SessionId = Uuid;

const VIEW_CHANNEL_CAPACITY: usize = 64;
const FLUSH_INTERVAL: Duration = Duration::from_millis(100);

struct ClockEntry {
    clock: MatchClock,
    holders: HashSet<SessionId>,
    views: broadcast::Sender<ClockView>,
}

impl ClockEntry {
    /// Push the current state to subscribers. Pushed views are read-only; each stream
    /// re-applies its own viewer's permissions.
    fn publish(&self) {
        let _ = self.views.send(self.clock.view(true));
    }
}

pub struct ClockRegistry {
    store: Arc<dyn ScheduleStore>,
    durations: DurationTable,
    debounce: Duration,
    entries: Mutex<HashMap<MatchId, ClockEntry>>,
    /// Countdown state of released clocks. Locked after `entries` when both are needed.
    parked: Mutex<HashMap<MatchId, ClockMemo>>,
}

impl ClockRegistry {
    pub fn new(store: Arc<dyn ScheduleStore>, durations: DurationTable, debounce: Duration) -> Self {
        Self {
            store,
            durations,
            debounce,
            entries: Mutex::new(HashMap::new()),
            parked: Mutex::new(HashMap::new()),
        }
    }

    pub fn durations(&self) -> &DurationTable {
        &self.durations
    }

    fn lock(&self) -> TournamentResult<MutexGuard<'_, HashMap<MatchId, ClockEntry>>> {
        self.entries
            .lock()
            .map_err(|_| TournamentError::Store("clock registry lock error".into()))
    }

    fn lock_parked(&self) -> TournamentResult<MutexGuard<'_, HashMap<MatchId, ClockMemo>>> {
        self.parked
            .lock()
            .map_err(|_| TournamentError::Store("parked clock lock error".into()))
    }

    fn load_entry(&self, match_id: &str) -> TournamentResult<ClockEntry> {
        let game = self.store.get_match(match_id)?;
        let (views, _) = broadcast::channel(VIEW_CHANNEL_CAPACITY);
        debug!("loading clock for {}", match_id);
        let now = Utc::now();
        let mut clock = MatchClock::load(game, &self.durations, self.debounce, now);
        if let Some(memo) = self.lock_parked()?.get(match_id) {
            clock.restore(memo, now);
        }
        Ok(ClockEntry {
            clock,
            holders: HashSet::new(),
            views,
        })
    }

    fn entry_for<'a>(
        &self,
        entries: &'a mut HashMap<MatchId, ClockEntry>,
        match_id: &str,
        session: SessionId,
    ) -> TournamentResult<&'a mut ClockEntry> {
        if !entries.contains_key(match_id) {
            let entry = self.load_entry(match_id)?;
            entries.insert(match_id.to_string(), entry);
        }
        let entry = entries
            .get_mut(match_id)
            .ok_or_else(|| TournamentError::MatchNotFound(match_id.to_string()))?;
        entry.holders.insert(session);
        Ok(entry)
    }

    /// Hold the match's clock for `session`, loading it if nobody holds it yet.
    pub fn acquire(&self, match_id: &str, session: SessionId) -> TournamentResult<ClockView> {
        let mut entries = self.lock()?;
        let entry = self.entry_for(&mut entries, match_id, session)?;
        Ok(entry.clock.view(true))
    }

    /// Hold the clock and subscribe to its pushed views.
    pub fn watch(
        &self,
        match_id: &str,
        session: SessionId,
    ) -> TournamentResult<(ClockView, broadcast::Receiver<ClockView>)> {
        let mut entries = self.lock()?;
        let entry = self.entry_for(&mut entries, match_id, session)?;
        Ok((entry.clock.view(true), entry.views.subscribe()))
    }

    /// Current view without holding the clock. Unheld clocks are built from the record.
    pub fn view(&self, match_id: &str, read_only: bool) -> TournamentResult<ClockView> {
        let entries = self.lock()?;
        if let Some(entry) = entries.get(match_id) {
            return Ok(entry.clock.view(read_only));
        }
        drop(entries);
        Ok(self.load_entry(match_id)?.clock.view(read_only))
    }

    /// Drop `session`'s hold. The last holder flushes and unloads the clock.
    pub fn release(&self, match_id: &str, session: SessionId) -> TournamentResult<()> {
        let mut entries = self.lock()?;
        let Some(entry) = entries.get_mut(match_id) else {
            return Ok(());
        };
        entry.holders.remove(&session);
        if !entry.holders.is_empty() {
            return Ok(());
        }
        if let Some(mut entry) = entries.remove(match_id) {
            if let Err(e) = entry.clock.flush(self.store.as_ref()) {
                error!("Dropping unsaved scores for {}: {e}", match_id);
            }
            self.lock_parked()?
                .insert(match_id.to_string(), entry.clock.memo(Utc::now()));
            info!("Released clock for {} (no viewers left)", match_id);
        }
        Ok(())
    }

    /// Release every clock `session` holds (logout or inactivity expiry).
    pub fn release_all(&self, session: SessionId) -> TournamentResult<()> {
        let held: Vec<MatchId> = self
            .lock()?
            .iter()
            .filter(|(_, e)| e.holders.contains(&session))
            .map(|(id, _)| id.clone())
            .collect();
        for id in held {
            self.release(&id, session)?;
        }
        Ok(())
    }

    /// Run a clock action on behalf of `operator`. Only the assigned operator or an admin may
    /// act; everyone else is refused before anything changes.
    pub fn operate<T>(
        &self,
        operator: &Operator,
        match_id: &str,
        session: SessionId,
        action: impl FnOnce(&mut MatchClock, &dyn ScheduleStore, &DurationTable) -> TournamentResult<T>,
    ) -> TournamentResult<(T, ClockView)> {
        let game = self.store.get_match(match_id)?;
        if !operator.may_operate(&game) {
            return Err(TournamentError::Unauthorized {
                operator: operator.id.clone(),
                match_id: match_id.to_string(),
            });
        }
        let mut entries = self.lock()?;
        let entry = self.entry_for(&mut entries, match_id, session)?;
        let result = action(&mut entry.clock, self.store.as_ref(), &self.durations);
        entry.publish();
        Ok((result?, entry.clock.view(false)))
    }

    /// Advance every running clock by one second.
    pub fn tick_all(&self) -> usize {
        let Ok(mut entries) = self.lock() else {
            return 0;
        };
        let mut ticked = 0;
        for entry in entries.values_mut() {
            if entry.clock.tick() != TickOutcome::Idle {
                ticked += 1;
                entry.publish();
            }
        }
        ticked
    }

    /// Write debounced scores that are due.
    pub fn flush_due(&self, now: Instant) {
        let Ok(mut entries) = self.lock() else {
            return;
        };
        for (id, entry) in entries.iter_mut() {
            if let Err(e) = entry.clock.flush_due(self.store.as_ref(), now) {
                error!("Score write for {} failed, re-enter the score: {e}", id);
                entry.publish();
            }
        }
    }

    /// Fold a committed store change into the clock that tracks it, if any.
    pub fn apply_change(&self, change: &MatchChange) {
        let Ok(mut entries) = self.lock() else {
            return;
        };
        if let Some(entry) = entries.get_mut(change.match_id()) {
            entry.clock.apply_remote(&change.after);
            entry.publish();
        }
    }

    pub fn active(&self) -> usize {
        self.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn holders(&self, match_id: &str) -> usize {
        self.lock()
            .ok()
            .and_then(|e| e.get(match_id).map(|entry| entry.holders.len()))
            .unwrap_or(0)
    }

    /// Ticker: one countdown step per second, debounce flushes, and store pushes.
    pub async fn run(self: Arc<Self>) {
        let mut seconds = interval(Duration::from_secs(1));
        let mut flushes = interval(FLUSH_INTERVAL);
        let mut changes = self.store.subscribe(ChangeFilter::All);
        // Skip the immediate first tick so a fresh start doesn't lose a second.
        seconds.tick().await;
        loop {
            tokio::select! {
                _ = seconds.tick() => {
                    self.tick_all();
                }
                _ = flushes.tick() => {
                    self.flush_due(Instant::now());
                }
                change = changes.recv() => match change {
                    Some(change) => self.apply_change(&change),
                    None => break,
                },
            }
        }
        debug!("change feed closed, clock ticker stopping");
    }
}
