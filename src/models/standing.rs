//! Derived standings row (not persisted).

use crate::models::team::TeamId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub competitor: TeamId,
    /// Resolved display name; empty until names are attached.
    #[serde(default)]
    pub name: String,
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub points_for: u64,
    pub points_against: u64,
    pub differential: i64,
    /// 1-based, unique within one table.
    pub rank: u32,
}

impl Standing {
    pub fn new(competitor: impl Into<TeamId>) -> Self {
        Self {
            competitor: competitor.into(),
            ..Self::default()
        }
    }

    /// Fold one finished match into the record.
    pub fn record(&mut self, scored: u32, conceded: u32) {
        self.played += 1;
        self.points_for += u64::from(scored);
        self.points_against += u64::from(conceded);
        self.differential = self.points_for as i64 - self.points_against as i64;
        if scored > conceded {
            self.wins += 1;
        } else if scored < conceded {
            self.losses += 1;
        }
    }
}
