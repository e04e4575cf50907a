//! Team: a competitor entered in one event.

use crate::models::event::EventId;
use serde::{Deserialize, Serialize};

/// Team identifier. May be a literal bracket-slot code until resolved.
pub type TeamId = String;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub event_id: EventId,
    #[serde(default)]
    pub roster: Vec<String>,
}

impl Team {
    pub fn new(id: impl Into<TeamId>, name: impl Into<String>, event_id: impl Into<EventId>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            event_id: event_id.into(),
            roster: Vec::new(),
        }
    }

    pub fn with_roster<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roster = members.into_iter().map(Into::into).collect();
        self
    }
}
