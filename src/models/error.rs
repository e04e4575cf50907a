//! Crate-wide error type.

use crate::models::event::EventId;
use crate::models::game::{MatchId, MatchStatus};
use thiserror::Error;

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TournamentError {
    /// Malformed operator input (countdown text, overtime minutes).
    #[error("Invalid input: {0}")]
    Validation(String),
    /// Operator is not assigned to the match.
    #[error("Operator {operator} may not operate match {match_id}")]
    Unauthorized { operator: String, match_id: MatchId },
    /// No operator session.
    #[error("Sign in as an operator first")]
    NotSignedIn,
    #[error("Match {0} no longer exists")]
    MatchNotFound(MatchId),
    #[error("Event {0} not found")]
    EventNotFound(EventId),
    /// Match is not in a status that allows this action.
    #[error("Match is {actual:?}, action requires {expected:?}")]
    InvalidStatus {
        expected: MatchStatus,
        actual: MatchStatus,
    },
    /// Clock phase does not allow this action.
    #[error("Invalid state for this action: {0}")]
    InvalidState(&'static str),
    #[error("Ending a match must be confirmed")]
    ConfirmationRequired,
    /// A batch would break a record invariant; nothing was written.
    #[error("Rejected write: {0}")]
    InvariantViolation(String),
    /// The store failed to write; the action must be repeated.
    #[error("Store unavailable: {0}")]
    Store(String),
}

pub type TournamentResult<T> = Result<T, TournamentError>;
