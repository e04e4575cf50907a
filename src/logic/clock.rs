//! Live match clock: status transitions, scoring, countdown, pause and overtime.
//!
//! A clock holds the logical score of each competitor. What the operator sees as the left and
//! right side is a display transform on top of that ([`MatchClock::swap_sides`]); only logical
//! scores are ever written to the store.

use crate::config::DurationTable;
use crate::models::{GameMatch, MatchStatus, Side, TeamId, TournamentError, TournamentResult};
use crate::store::{MatchPatch, ScheduleStore, WriteBatch};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Largest overtime the prompt accepts, in minutes.
const MAX_OVERTIME_MINUTES: u32 = 120;

/// A side as the operator sees it on screen.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplaySlot {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownPhase {
    /// Not started; duration may still be edited.
    #[default]
    Ready,
    Running,
    Paused,
    /// Hit zero with overtime still available.
    AwaitingOvertime,
    /// Parked at zero; nothing further happens automatically.
    Expired,
    /// Match ended (or voided).
    Stopped,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TickOutcome {
    Idle,
    Ticked(u32),
    OvertimePrompt,
    Expired,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum OvertimeDecision {
    Granted { secs: u32 },
    Declined,
}

/// Coalescing single-slot buffer per score field.
///
/// Every push replaces the pending value and restarts the window; a flush writes only the
/// latest value of each field.
#[derive(Clone, Debug)]
pub struct ScoreBuffer {
    window: Duration,
    score_a: Option<u32>,
    score_b: Option<u32>,
    deadline: Option<Instant>,
}

impl ScoreBuffer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            score_a: None,
            score_b: None,
            deadline: None,
        }
    }

    pub fn push(&mut self, side: Side, value: u32, now: Instant) {
        match side {
            Side::A => self.score_a = Some(value),
            Side::B => self.score_b = Some(value),
        }
        self.deadline = Some(now + self.window);
    }

    pub fn is_pending(&self, side: Side) -> bool {
        match side {
            Side::A => self.score_a.is_some(),
            Side::B => self.score_b.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.score_a.is_none() && self.score_b.is_none()
    }

    /// Pending values once the window has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<MatchPatch> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.take(),
            _ => None,
        }
    }

    /// Pending values regardless of the window.
    pub fn take(&mut self) -> Option<MatchPatch> {
        self.deadline = None;
        if self.is_empty() {
            return None;
        }
        Some(MatchPatch {
            score_a: self.score_a.take(),
            score_b: self.score_b.take(),
            ..MatchPatch::default()
        })
    }

    pub fn clear(&mut self) {
        self.score_a = None;
        self.score_b = None;
        self.deadline = None;
    }
}

/// One side of the operator's screen.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SideView {
    /// Logical side the on-screen buttons are bound to.
    pub side: Side,
    pub competitor: TeamId,
    pub score: u32,
}

/// Snapshot pushed to every open view of a match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ClockView {
    pub match_id: String,
    pub status: MatchStatus,
    pub phase: CountdownPhase,
    pub remaining_secs: u32,
    /// `M:SS`
    pub display: String,
    pub overtime_used: bool,
    pub swapped: bool,
    pub left: SideView,
    pub right: SideView,
    pub read_only: bool,
}

impl ClockView {
    /// Same snapshot as seen by a viewer with different permissions.
    pub fn for_viewer(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

/// Countdown state kept after the last view of a match closes, so a reloaded clock carries on
/// where it stopped.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClockMemo {
    pub remaining: u32,
    pub phase: CountdownPhase,
    pub overtime_used: bool,
    pub duration_edited: bool,
    pub swapped: bool,
    pub taken_at: DateTime<Utc>,
}

pub struct MatchClock {
    game: GameMatch,
    score_a: u32,
    score_b: u32,
    swapped: bool,
    remaining: u32,
    phase: CountdownPhase,
    overtime_used: bool,
    duration_edited: bool,
    buffer: ScoreBuffer,
}

impl MatchClock {
    /// Build a clock for the match as currently stored.
    ///
    /// A match that is already live resumes paused, with the default duration minus the time
    /// elapsed since it started.
    pub fn load(
        game: GameMatch,
        durations: &DurationTable,
        debounce: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let default_secs = durations.lookup(&game.event_id, game.match_type);
        let (remaining, phase) = match game.status {
            MatchStatus::Scheduled => (default_secs, CountdownPhase::Ready),
            MatchStatus::Live => {
                let elapsed = game
                    .actual_start
                    .map(|s| (now - s).num_seconds().max(0) as u64)
                    .unwrap_or(0);
                let left = u64::from(default_secs).saturating_sub(elapsed) as u32;
                if left == 0 {
                    (0, CountdownPhase::AwaitingOvertime)
                } else {
                    (left, CountdownPhase::Paused)
                }
            }
            MatchStatus::Final | MatchStatus::Void => (0, CountdownPhase::Stopped),
        };
        Self {
            score_a: game.score_a.unwrap_or(0),
            score_b: game.score_b.unwrap_or(0),
            game,
            swapped: false,
            remaining,
            phase,
            overtime_used: false,
            duration_edited: false,
            buffer: ScoreBuffer::new(debounce),
        }
    }

    /// Snapshot of the countdown for [`MatchClock::restore`].
    pub fn memo(&self, now: DateTime<Utc>) -> ClockMemo {
        ClockMemo {
            remaining: self.remaining,
            phase: self.phase,
            overtime_used: self.overtime_used,
            duration_edited: self.duration_edited,
            swapped: self.swapped,
            taken_at: now,
        }
    }

    /// Carry a memo over onto a freshly loaded clock.
    ///
    /// A countdown that was running keeps losing time while unheld and comes back paused.
    /// A memo taken before start is dropped if the match has since gone past scheduled,
    /// and a memo from a started match is dropped if the match was reset to scheduled.
    pub fn restore(&mut self, memo: &ClockMemo, now: DateTime<Utc>) {
        let memo_started = memo.phase != CountdownPhase::Ready;
        match self.game.status {
            MatchStatus::Scheduled => {
                if memo_started {
                    return;
                }
                self.remaining = memo.remaining;
                self.duration_edited = memo.duration_edited;
            }
            MatchStatus::Live => {
                if !memo_started {
                    return;
                }
                self.overtime_used = memo.overtime_used;
                self.swapped = memo.swapped;
                let (remaining, phase) = match memo.phase {
                    CountdownPhase::Running => {
                        let elapsed = (now - memo.taken_at)
                            .num_seconds()
                            .clamp(0, i64::from(u32::MAX));
                        match memo.remaining.saturating_sub(elapsed as u32) {
                            0 if memo.overtime_used => (0, CountdownPhase::Expired),
                            0 => (0, CountdownPhase::AwaitingOvertime),
                            left => (left, CountdownPhase::Paused),
                        }
                    }
                    // Reopened after it ended; keep the countdown rebuilt from the record.
                    CountdownPhase::Stopped => (self.remaining, self.phase),
                    phase => (memo.remaining, phase),
                };
                self.remaining = remaining;
                self.phase = phase;
            }
            MatchStatus::Final | MatchStatus::Void => {
                self.overtime_used = memo.overtime_used;
                self.swapped = memo.swapped;
            }
        }
        debug!(
            "{}: restored countdown {} ({:?})",
            self.game.id,
            format_clock(self.remaining),
            self.phase
        );
    }

    pub fn match_id(&self) -> &str {
        &self.game.id
    }

    pub fn game(&self) -> &GameMatch {
        &self.game
    }

    pub fn status(&self) -> MatchStatus {
        self.game.status
    }

    pub fn phase(&self) -> CountdownPhase {
        self.phase
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining
    }

    pub fn overtime_used(&self) -> bool {
        self.overtime_used
    }

    pub fn is_swapped(&self) -> bool {
        self.swapped
    }

    pub fn has_pending_writes(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Logical score of a competitor side.
    pub fn score(&self, side: Side) -> u32 {
        match side {
            Side::A => self.score_a,
            Side::B => self.score_b,
        }
    }

    fn score_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::A => &mut self.score_a,
            Side::B => &mut self.score_b,
        }
    }

    /// Logical side currently bound to a display slot.
    pub fn side_at(&self, slot: DisplaySlot) -> Side {
        let left = if self.swapped { Side::B } else { Side::A };
        match slot {
            DisplaySlot::Left => left,
            DisplaySlot::Right => left.other(),
        }
    }

    fn require_status(&self, expected: MatchStatus) -> TournamentResult<()> {
        if self.game.status != expected {
            return Err(TournamentError::InvalidStatus {
                expected,
                actual: self.game.status,
            });
        }
        Ok(())
    }

    /// Replace the countdown before the match starts. Accepts `M:SS`, `MM:SS` or whole minutes.
    pub fn set_duration(&mut self, text: &str) -> TournamentResult<u32> {
        self.require_status(MatchStatus::Scheduled)?;
        if self.phase != CountdownPhase::Ready {
            return Err(TournamentError::InvalidState(
                "countdown can only be edited before start",
            ));
        }
        let secs = parse_countdown(text)?;
        self.remaining = secs;
        self.duration_edited = true;
        debug!("{}: countdown set to {}", self.game.id, format_clock(secs));
        Ok(secs)
    }

    /// Scheduled -> Live. Records the actual start and opens both scores at zero.
    pub fn start(
        &mut self,
        store: &dyn ScheduleStore,
        durations: &DurationTable,
        now: DateTime<Utc>,
    ) -> TournamentResult<()> {
        self.require_status(MatchStatus::Scheduled)?;
        let current = store.get_match(&self.game.id)?;
        if current.status != MatchStatus::Scheduled {
            let actual = current.status;
            self.apply_remote(&current);
            return Err(TournamentError::InvalidStatus {
                expected: MatchStatus::Scheduled,
                actual,
            });
        }
        let patch = MatchPatch {
            status: Some(MatchStatus::Live),
            actual_start: Some(now),
            score_a: Some(0),
            score_b: Some(0),
            expect_status: Some(MatchStatus::Scheduled),
            ..MatchPatch::default()
        };
        let changes = store.commit(WriteBatch::new().update(self.game.id.clone(), patch))?;
        if let Some(change) = changes.into_iter().next() {
            self.game = change.after;
        }
        if !self.duration_edited {
            self.remaining = durations.lookup(&self.game.event_id, self.game.match_type);
        }
        self.score_a = 0;
        self.score_b = 0;
        self.phase = CountdownPhase::Running;
        info!(
            "{} is live ({} vs {}), countdown {}",
            self.game.id,
            self.game.competitor_a,
            self.game.competitor_b,
            format_clock(self.remaining)
        );
        Ok(())
    }

    /// Apply a signed delta to whichever competitor is shown in `slot`. Never goes below zero.
    /// The write is buffered; see [`MatchClock::flush_due`].
    pub fn adjust_score(
        &mut self,
        slot: DisplaySlot,
        delta: i32,
        now: Instant,
    ) -> TournamentResult<u32> {
        self.require_status(MatchStatus::Live)?;
        let side = self.side_at(slot);
        let current = i64::from(self.score(side));
        let next = (current + i64::from(delta)).clamp(0, i64::from(u32::MAX)) as u32;
        *self.score_mut(side) = next;
        self.buffer.push(side, next, now);
        Ok(next)
    }

    /// Flip which competitor is shown on the left. Scores stay with their competitor.
    pub fn swap_sides(&mut self) -> TournamentResult<bool> {
        self.require_status(MatchStatus::Live)?;
        self.swapped = !self.swapped;
        Ok(self.swapped)
    }

    /// Pause or resume. Returns whether the clock is now paused.
    pub fn toggle_pause(&mut self) -> TournamentResult<bool> {
        self.phase = match self.phase {
            CountdownPhase::Running => CountdownPhase::Paused,
            CountdownPhase::Paused => CountdownPhase::Running,
            _ => return Err(TournamentError::InvalidState("countdown is not running")),
        };
        Ok(self.phase == CountdownPhase::Paused)
    }

    /// Advance one second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != CountdownPhase::Running {
            return TickOutcome::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining > 0 {
            return TickOutcome::Ticked(self.remaining);
        }
        if self.overtime_used {
            self.phase = CountdownPhase::Expired;
            info!("{}: overtime expired", self.game.id);
            TickOutcome::Expired
        } else {
            self.phase = CountdownPhase::AwaitingOvertime;
            info!("{}: time expired, overtime available", self.game.id);
            TickOutcome::OvertimePrompt
        }
    }

    /// Answer the overtime prompt with a number of minutes.
    ///
    /// Blank input declines. Anything else that is not a positive whole number is rejected
    /// and also closes the prompt; either way the clock stays parked at zero.
    pub fn grant_overtime(&mut self, minutes: &str) -> TournamentResult<OvertimeDecision> {
        if self.phase != CountdownPhase::AwaitingOvertime {
            return Err(TournamentError::InvalidState("no overtime prompt pending"));
        }
        let input = minutes.trim();
        if input.is_empty() {
            self.phase = CountdownPhase::Expired;
            info!("{}: overtime declined", self.game.id);
            return Ok(OvertimeDecision::Declined);
        }
        match parse_overtime_minutes(input) {
            Ok(mins) => {
                let secs = mins * 60;
                self.remaining = secs;
                self.overtime_used = true;
                self.phase = CountdownPhase::Running;
                info!("{}: overtime of {} min started", self.game.id, mins);
                Ok(OvertimeDecision::Granted { secs })
            }
            Err(e) => {
                self.phase = CountdownPhase::Expired;
                Err(e)
            }
        }
    }

    /// Live -> Final. Commits status and logical scores in one write, stops the countdown, and
    /// drops any buffered score write.
    pub fn end(&mut self, store: &dyn ScheduleStore, confirmed: bool) -> TournamentResult<()> {
        if !confirmed {
            return Err(TournamentError::ConfirmationRequired);
        }
        self.require_status(MatchStatus::Live)?;
        let current = store.get_match(&self.game.id)?;
        if current.status != MatchStatus::Live {
            let actual = current.status;
            self.apply_remote(&current);
            return Err(TournamentError::InvalidStatus {
                expected: MatchStatus::Live,
                actual,
            });
        }
        let patch = MatchPatch {
            status: Some(MatchStatus::Final),
            score_a: Some(self.score_a),
            score_b: Some(self.score_b),
            expect_status: Some(MatchStatus::Live),
            ..MatchPatch::default()
        };
        let changes = store.commit(WriteBatch::new().update(self.game.id.clone(), patch))?;
        if let Some(change) = changes.into_iter().next() {
            self.game = change.after;
        }
        self.buffer.clear();
        self.phase = CountdownPhase::Stopped;
        info!(
            "{} final: {} {} - {} {}",
            self.game.id, self.game.competitor_a, self.score_a, self.score_b, self.game.competitor_b
        );
        Ok(())
    }

    /// Write buffered scores whose debounce window has elapsed. Returns whether a write was made.
    ///
    /// On failure the buffered value is dropped, not retried; the operator re-enters it.
    pub fn flush_due(&mut self, store: &dyn ScheduleStore, now: Instant) -> TournamentResult<bool> {
        let Some(patch) = self.buffer.take_due(now) else {
            return Ok(false);
        };
        self.write_scores(store, patch)
    }

    /// Write buffered scores immediately.
    pub fn flush(&mut self, store: &dyn ScheduleStore) -> TournamentResult<bool> {
        let Some(patch) = self.buffer.take() else {
            return Ok(false);
        };
        self.write_scores(store, patch)
    }

    fn write_scores(&mut self, store: &dyn ScheduleStore, patch: MatchPatch) -> TournamentResult<bool> {
        if self.game.status != MatchStatus::Live {
            return Ok(false);
        }
        debug!("{}: flushing scores {:?}/{:?}", self.game.id, patch.score_a, patch.score_b);
        let patch = MatchPatch {
            expect_status: Some(MatchStatus::Live),
            ..patch
        };
        match store.commit(WriteBatch::new().update(self.game.id.clone(), patch)) {
            Ok(changes) => {
                if let Some(change) = changes.into_iter().next() {
                    self.game = change.after;
                }
                Ok(true)
            }
            Err(TournamentError::InvalidStatus { actual, .. }) => {
                // Ended or voided elsewhere; the stored result stands.
                info!("{}: dropping buffered scores, match is {:?}", self.game.id, actual);
                self.buffer.clear();
                let current = store.get_match(&self.game.id)?;
                self.apply_remote(&current);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Merge a committed record from the store, last write wins per field. Scores with a
    /// buffered local write keep the local value. Snapshots older than the one the clock
    /// already holds are ignored.
    pub fn apply_remote(&mut self, game: &GameMatch) {
        if game.id != self.game.id {
            return;
        }
        if game.revision < self.game.revision {
            debug!(
                "{}: ignoring stale revision {} (at {})",
                game.id, game.revision, self.game.revision
            );
            return;
        }
        let previous = self.game.status;
        if matches!(game.status, MatchStatus::Final | MatchStatus::Void) {
            self.buffer.clear();
        }
        for side in [Side::A, Side::B] {
            if !self.buffer.is_pending(side) {
                if let Some(s) = game.score(side) {
                    *self.score_mut(side) = s;
                }
            }
        }
        self.game = game.clone();
        if previous == game.status {
            return;
        }
        match game.status {
            MatchStatus::Live if self.phase == CountdownPhase::Ready => {
                self.phase = CountdownPhase::Running;
            }
            MatchStatus::Final | MatchStatus::Void => {
                self.phase = CountdownPhase::Stopped;
            }
            _ => {}
        }
        debug!("{}: status {:?} -> {:?} from store", game.id, previous, game.status);
    }

    pub fn view(&self, read_only: bool) -> ClockView {
        let side_view = |slot| {
            let side = self.side_at(slot);
            SideView {
                side,
                competitor: self.game.competitor(side).clone(),
                score: self.score(side),
            }
        };
        ClockView {
            match_id: self.game.id.clone(),
            status: self.game.status,
            phase: self.phase,
            remaining_secs: self.remaining,
            display: format_clock(self.remaining),
            overtime_used: self.overtime_used,
            swapped: self.swapped,
            left: side_view(DisplaySlot::Left),
            right: side_view(DisplaySlot::Right),
            read_only,
        }
    }
}

/// `M:SS`
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse free-text countdown: `M:SS`, `MM:SS`, or whole minutes. Must be positive.
pub fn parse_countdown(text: &str) -> TournamentResult<u32> {
    let t = text.trim();
    let invalid = || {
        TournamentError::Validation(format!("{t:?} is not a countdown (use M:SS or minutes)"))
    };
    let secs = match t.split_once(':') {
        Some((m, s)) => {
            let m = digits(m).ok_or_else(invalid)?;
            if s.len() != 2 {
                return Err(invalid());
            }
            let s = digits(s).filter(|s| *s < 60).ok_or_else(invalid)?;
            m.checked_mul(60).and_then(|m| m.checked_add(s))
        }
        None => digits(t).and_then(|m| m.checked_mul(60)),
    }
    .ok_or_else(invalid)?;
    if secs == 0 {
        return Err(invalid());
    }
    Ok(secs)
}

/// Parse the overtime prompt: a positive whole number of minutes.
pub fn parse_overtime_minutes(text: &str) -> TournamentResult<u32> {
    let t = text.trim();
    match digits(t) {
        Some(m) if (1..=MAX_OVERTIME_MINUTES).contains(&m) => Ok(m),
        _ => Err(TournamentError::Validation(format!(
            "{t:?} is not a number of overtime minutes"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_text_forms() {
        assert_eq!(parse_countdown("10").unwrap(), 600);
        assert_eq!(parse_countdown("9:30").unwrap(), 570);
        assert_eq!(parse_countdown(" 12:05 ").unwrap(), 725);
        assert_eq!(parse_countdown("0:45").unwrap(), 45);
    }

    #[test]
    fn countdown_rejects_malformed() {
        for bad in ["", "0", "0:00", "9:60", "9:5", "-3", "ten", "1:2:3", "+5"] {
            assert!(
                matches!(parse_countdown(bad), Err(TournamentError::Validation(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn overtime_minutes_must_be_positive_integers() {
        assert_eq!(parse_overtime_minutes("5").unwrap(), 5);
        assert!(parse_overtime_minutes("0").is_err());
        assert!(parse_overtime_minutes("2.5").is_err());
        assert!(parse_overtime_minutes("-1").is_err());
        assert!(parse_overtime_minutes("abc").is_err());
    }

    #[test]
    fn buffer_keeps_latest_and_waits_for_window() {
        let t0 = Instant::now();
        let mut b = ScoreBuffer::new(Duration::from_millis(400));
        b.push(Side::A, 1, t0);
        b.push(Side::A, 2, t0 + Duration::from_millis(100));
        b.push(Side::B, 7, t0 + Duration::from_millis(200));
        assert!(b.take_due(t0 + Duration::from_millis(500)).is_none());
        let patch = b.take_due(t0 + Duration::from_millis(600)).unwrap();
        assert_eq!(patch.score_a, Some(2));
        assert_eq!(patch.score_b, Some(7));
        assert!(b.is_empty());
        assert!(b.take_due(t0 + Duration::from_secs(5)).is_none());
    }

    fn live_at(start: DateTime<Utc>) -> GameMatch {
        let mut game = GameMatch::new(
            "Q1",
            "vb",
            crate::models::MatchType::Qualifier,
            "red",
            "blue",
            start,
            "court-1",
        );
        game.status = MatchStatus::Live;
        game.actual_start = Some(start);
        game.score_a = Some(0);
        game.score_b = Some(0);
        game
    }

    #[test]
    fn restored_running_countdown_loses_unheld_time() {
        let now = Utc::now();
        let table = DurationTable::default();
        let mut clock = MatchClock::load(live_at(now), &table, Duration::from_millis(400), now);
        let memo = ClockMemo {
            remaining: 100,
            phase: CountdownPhase::Running,
            overtime_used: true,
            duration_edited: false,
            swapped: true,
            taken_at: now - chrono::Duration::seconds(30),
        };
        clock.restore(&memo, now);
        assert_eq!((clock.remaining_secs(), clock.phase()), (70, CountdownPhase::Paused));
        assert!(clock.overtime_used() && clock.is_swapped());

        let mut clock = MatchClock::load(live_at(now), &table, Duration::from_millis(400), now);
        clock.restore(
            &ClockMemo {
                taken_at: now - chrono::Duration::seconds(500),
                ..memo
            },
            now,
        );
        assert_eq!((clock.remaining_secs(), clock.phase()), (0, CountdownPhase::Expired));
    }

    #[test]
    fn started_memo_is_ignored_after_reset_to_scheduled() {
        let now = Utc::now();
        let mut game = live_at(now);
        game.status = MatchStatus::Scheduled;
        game.actual_start = None;
        game.score_a = None;
        game.score_b = None;
        let mut clock =
            MatchClock::load(game, &DurationTable::default(), Duration::from_millis(400), now);
        clock.restore(
            &ClockMemo {
                remaining: 12,
                phase: CountdownPhase::Expired,
                overtime_used: true,
                duration_edited: false,
                swapped: false,
                taken_at: now,
            },
            now,
        );
        assert_eq!(clock.phase(), CountdownPhase::Ready);
        assert!(!clock.overtime_used());
        assert_eq!(clock.remaining_secs(), 600);
    }

    #[test]
    fn clock_display_format() {
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(550), "9:10");
        assert_eq!(format_clock(0), "0:00");
    }
}
