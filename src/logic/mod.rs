//! Progression logic: delay cascade, dependency gate, standings, match clock.

mod clock;
mod delay;
mod registry;
mod standings;
mod visibility;

pub use clock::{
    format_clock, parse_countdown, parse_overtime_minutes, ClockMemo, ClockView, CountdownPhase,
    DisplaySlot, MatchClock, OvertimeDecision, ScoreBuffer, SideView, TickOutcome,
};
pub use delay::{propagate_delay, DelayOutcome, DelayPropagator};
pub use registry::{ClockRegistry, SessionId};
pub use standings::{
    attach_names, compute_standings, normalize_pool, pool_rank, pool_standings, ranking_order,
    standings_csv,
};
pub use visibility::{board, decider_needed, display_order, should_display, visible_matches, BoardEntry};
