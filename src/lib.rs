//! Multi-sport tournament progression: library with models, store contract and business logic.

pub mod api;
pub mod config;
pub mod logic;
pub mod models;
pub mod seed;
pub mod session;
pub mod store;

pub use config::{AppConfig, DurationTable, EventDurations};
pub use logic::{
    board, compute_standings, decider_needed, display_order, pool_rank, propagate_delay,
    should_display, visible_matches, ClockRegistry, ClockView, CountdownPhase, DelayOutcome,
    DelayPropagator, DisplaySlot, MatchClock, OvertimeDecision, TickOutcome,
};
pub use models::{
    Event, EventId, EventStatus, GameMatch, IdentityProvider, MatchId, MatchStatus, MatchType,
    Operator, Role, SeriesLeg, Side, SlotEntry, SlotKind, SlotTable, Standing, StaticDirectory,
    Team, TeamId, TournamentError, TournamentResult,
};
pub use seed::Seed;
pub use store::{ChangeFilter, MatchChange, MatchPatch, MemoryStore, ScheduleStore, WriteBatch};
