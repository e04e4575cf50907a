//! Data structures for the tournament: events, teams, matches, operators, standings.

mod error;
mod event;
mod game;
mod operator;
mod slot;
mod standing;
mod team;

pub use error::{TournamentError, TournamentResult};
pub use event::{Event, EventId, EventStatus};
pub use game::{GameMatch, MatchId, MatchStatus, MatchType, SeriesLeg, Side};
pub use operator::{IdentityProvider, Operator, OperatorId, Role, StaticDirectory, VenueAssignment};
pub use slot::{SlotEntry, SlotKind, SlotTable};
pub use standing::Standing;
pub use team::{Team, TeamId};
