//! Integration tests for the delay cascade.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tournament_progression::{
    propagate_delay, ChangeFilter, DelayOutcome, DelayPropagator, Event, GameMatch, MatchChange,
    MatchPatch, MatchStatus, MatchType, MemoryStore, ScheduleStore, SlotTable, TournamentError,
    TournamentResult, WriteBatch,
};
use tournament_progression::store::Subscription;

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, hour, min, 0).unwrap()
}

fn qualifier(id: &str, event: &str, venue: &str, when: DateTime<Utc>) -> GameMatch {
    GameMatch::new(id, event, MatchType::Qualifier, "t1", "t2", when, venue)
}

/// Court 1 of volleyball: Q1 09:00, Q2 09:30, Q3 10:00; court 2: Q4 09:30; basketball on
/// "court-1" too: B1 09:30.
fn seeded() -> MemoryStore {
    let store = MemoryStore::new();
    store.put_event(Event::new("vb", "Volleyball", 6, 10)).unwrap();
    store.put_event(Event::new("bb", "Basketball", 5, 8)).unwrap();
    let batch = WriteBatch::new()
        .insert(qualifier("Q1", "vb", "court-1", at(9, 0)))
        .insert(qualifier("Q2", "vb", "court-1", at(9, 30)))
        .insert(qualifier("Q3", "vb", "court-1", at(10, 0)))
        .insert(qualifier("Q4", "vb", "court-2", at(9, 30)))
        .insert(qualifier("B1", "bb", "court-1", at(9, 30)));
    store.commit(batch).unwrap();
    store
}

fn go_live(store: &dyn ScheduleStore, id: &str, when: DateTime<Utc>) -> MatchChange {
    let patch = MatchPatch {
        status: Some(MatchStatus::Live),
        actual_start: Some(when),
        score_a: Some(0),
        score_b: Some(0),
        ..MatchPatch::default()
    };
    store
        .commit(WriteBatch::new().update(id, patch))
        .unwrap()
        .remove(0)
}

fn scheduled(store: &dyn ScheduleStore, id: &str) -> DateTime<Utc> {
    store.get_match(id).unwrap().scheduled_at
}

#[test]
fn late_start_shifts_later_matches_at_same_venue() {
    let store = seeded();
    let change = go_live(&store, "Q2", at(9, 42));

    let outcome = propagate_delay(&store, &change).unwrap();

    assert_eq!(
        outcome,
        DelayOutcome::Shifted {
            delay: Duration::minutes(12),
            shifted: vec!["Q3".to_string()],
        }
    );
    assert_eq!(scheduled(&store, "Q3"), at(10, 12));
    // Earlier match, other venue, other event: untouched.
    assert_eq!(scheduled(&store, "Q1"), at(9, 0));
    assert_eq!(scheduled(&store, "Q4"), at(9, 30));
    assert_eq!(scheduled(&store, "B1"), at(9, 30));
    // The trigger keeps its original slot.
    assert_eq!(scheduled(&store, "Q2"), at(9, 30));
}

#[test]
fn every_later_match_moves_by_the_same_delay() {
    let store = seeded();
    let change = go_live(&store, "Q1", at(9, 5));
    propagate_delay(&store, &change).unwrap();
    assert_eq!(scheduled(&store, "Q2"), at(9, 35));
    assert_eq!(scheduled(&store, "Q3"), at(10, 5));
    assert_eq!(scheduled(&store, "Q4"), at(9, 30));
}

fn drain(sub: &mut Subscription) -> Vec<MatchChange> {
    std::iter::from_fn(|| sub.try_recv()).collect()
}

#[test]
fn on_time_or_early_start_writes_nothing_else() {
    for start in [at(9, 30), at(9, 20)] {
        let store = seeded();
        let mut feed = store.subscribe(ChangeFilter::All);
        let change = go_live(&store, "Q2", start);
        assert_eq!(propagate_delay(&store, &change).unwrap(), DelayOutcome::OnTime);
        let writes = drain(&mut feed);
        assert_eq!(writes.len(), 1, "only the start itself");
        assert_eq!(writes[0].after.id, "Q2");
        assert_eq!(scheduled(&store, "Q3"), at(10, 0));
    }
}

#[test]
fn non_start_changes_are_ignored() {
    let store = seeded();
    let change = go_live(&store, "Q2", at(9, 50));
    let score = store
        .commit(WriteBatch::new().update(
            "Q2",
            MatchPatch {
                score_a: Some(3),
                ..MatchPatch::default()
            },
        ))
        .unwrap()
        .remove(0);
    assert_eq!(propagate_delay(&store, &score).unwrap(), DelayOutcome::Ignored);
    // The real transition still works afterwards.
    assert!(matches!(
        propagate_delay(&store, &change).unwrap(),
        DelayOutcome::Shifted { .. }
    ));
}

#[test]
fn started_later_match_is_not_shifted() {
    let store = seeded();
    go_live(&store, "Q3", at(9, 58));
    let change = go_live(&store, "Q2", at(9, 45));
    let outcome = propagate_delay(&store, &change).unwrap();
    assert_eq!(
        outcome,
        DelayOutcome::Shifted {
            delay: Duration::minutes(15),
            shifted: vec![],
        }
    );
    assert_eq!(scheduled(&store, "Q3"), at(10, 0));
}

/// Store whose writes can be made to fail.
struct FlakyStore {
    inner: MemoryStore,
    failing: AtomicBool,
}

impl ScheduleStore for FlakyStore {
    fn event(&self, id: &str) -> TournamentResult<Event> {
        self.inner.event(id)
    }
    fn events(&self) -> TournamentResult<Vec<Event>> {
        self.inner.events()
    }
    fn teams_for_event(&self, event_id: &str) -> TournamentResult<Vec<tournament_progression::Team>> {
        self.inner.teams_for_event(event_id)
    }
    fn get_match(&self, id: &str) -> TournamentResult<GameMatch> {
        self.inner.get_match(id)
    }
    fn matches_for_event(&self, event_id: &str) -> TournamentResult<Vec<GameMatch>> {
        self.inner.matches_for_event(event_id)
    }
    fn matches_at_venue_after(
        &self,
        event_id: &str,
        venue: &str,
        after: DateTime<Utc>,
    ) -> TournamentResult<Vec<GameMatch>> {
        self.inner.matches_at_venue_after(event_id, venue, after)
    }
    fn slot_table(&self, event_id: &str) -> TournamentResult<SlotTable> {
        self.inner.slot_table(event_id)
    }
    fn commit(&self, batch: WriteBatch) -> TournamentResult<Vec<MatchChange>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(TournamentError::Store("disk full".into()));
        }
        self.inner.commit(batch)
    }
    fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        self.inner.subscribe(filter)
    }
}

#[test]
fn failed_write_shifts_nothing() {
    let store = FlakyStore {
        inner: seeded(),
        failing: AtomicBool::new(false),
    };
    let change = go_live(&store, "Q1", at(9, 10));
    store.failing.store(true, Ordering::SeqCst);

    let err = propagate_delay(&store, &change).unwrap_err();
    assert!(matches!(err, TournamentError::Store(_)));
    assert_eq!(scheduled(&store, "Q2"), at(9, 30));
    assert_eq!(scheduled(&store, "Q3"), at(10, 0));

    // Retrying the whole operation once the store recovers applies every shift.
    store.failing.store(false, Ordering::SeqCst);
    propagate_delay(&store, &change).unwrap();
    assert_eq!(scheduled(&store, "Q2"), at(9, 40));
    assert_eq!(scheduled(&store, "Q3"), at(10, 10));
}

#[tokio::test]
async fn worker_reacts_to_live_transitions() {
    let store: Arc<dyn ScheduleStore> = Arc::new(seeded());
    let worker = tokio::spawn(DelayPropagator::new(store.clone()).run());
    // Let the worker subscribe before the start is written.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    go_live(store.as_ref(), "Q1", at(9, 20));

    let mut shifted = false;
    for _ in 0..50 {
        if scheduled(store.as_ref(), "Q2") == at(9, 50) {
            shifted = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(shifted, "Q2 should have moved back 20 minutes");
    assert_eq!(scheduled(store.as_ref(), "Q3"), at(10, 20));
    // Shifted matches stay scheduled, so nothing cascades a second time.
    assert_eq!(store.get_match("Q2").unwrap().status, MatchStatus::Scheduled);
    worker.abort();
}
