//! Event: one sport / competition category.

use crate::models::team::Team;
use serde::{Deserialize, Serialize};

/// Unique identifier for an event (e.g. `volleyball`).
pub type EventId = String;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Upcoming,
    InProgress,
    Completed,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    /// Smallest roster a team may field.
    pub roster_min: u32,
    /// Largest roster a team may field.
    pub roster_max: u32,
    #[serde(default)]
    pub status: EventStatus,
}

impl Event {
    pub fn new(id: impl Into<EventId>, name: impl Into<String>, roster_min: u32, roster_max: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            roster_min,
            roster_max,
            status: EventStatus::Upcoming,
        }
    }

    /// Whether the team's roster size falls within this event's bounds.
    pub fn accepts_roster(&self, team: &Team) -> bool {
        let size = team.roster.len() as u32;
        size >= self.roster_min && size <= self.roster_max
    }
}
