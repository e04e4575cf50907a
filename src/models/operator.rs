//! Operators as supplied by the identity/role service.

use crate::models::event::EventId;
use crate::models::game::{GameMatch, MatchId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type OperatorId = String;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Operator,
    #[default]
    Viewer,
}

/// A venue assignment covers every match of the event played there.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct VenueAssignment {
    pub event_id: EventId,
    pub venue: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub matches: Vec<MatchId>,
    #[serde(default)]
    pub venues: Vec<VenueAssignment>,
}

impl Operator {
    pub fn new(id: impl Into<OperatorId>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            matches: Vec::new(),
            venues: Vec::new(),
        }
    }

    pub fn assign_match(mut self, id: impl Into<MatchId>) -> Self {
        self.matches.push(id.into());
        self
    }

    pub fn assign_venue(mut self, event_id: impl Into<EventId>, venue: impl Into<String>) -> Self {
        self.venues.push(VenueAssignment {
            event_id: event_id.into(),
            venue: venue.into(),
        });
        self
    }

    /// Admins may operate any match; operators only the ones assigned to them.
    pub fn may_operate(&self, game: &GameMatch) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Viewer => false,
            Role::Operator => {
                self.matches.iter().any(|id| *id == game.id)
                    || self
                        .venues
                        .iter()
                        .any(|v| v.event_id == game.event_id && v.venue == game.venue)
            }
        }
    }
}

/// Identity/role lookup consulted by the clock's authorization gate.
pub trait IdentityProvider: Send + Sync {
    fn operator(&self, id: &str) -> Option<Operator>;
}

/// Fixed operator directory (loaded from the seed file).
#[derive(Clone, Debug, Default)]
pub struct StaticDirectory {
    operators: HashMap<OperatorId, Operator>,
}

impl StaticDirectory {
    pub fn new(operators: impl IntoIterator<Item = Operator>) -> Self {
        Self {
            operators: operators.into_iter().map(|o| (o.id.clone(), o)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl IdentityProvider for StaticDirectory {
    fn operator(&self, id: &str) -> Option<Operator> {
        self.operators.get(id).cloned()
    }
}
