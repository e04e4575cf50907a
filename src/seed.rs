//! Seed snapshot: the boundary with the external bulk-seeding tooling.
//!
//! A seed file carries events, teams, matches (with placeholders), the slot classification
//! table and the operator directory. Loading it is the only way records enter the store.

use crate::config::ConfigError;
use crate::models::{
    Event, GameMatch, Operator, SlotEntry, StaticDirectory, Team, TournamentResult,
};
use crate::store::{MemoryStore, ScheduleStore, WriteBatch};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Seed {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub matches: Vec<GameMatch>,
    #[serde(default)]
    pub slots: Vec<SlotEntry>,
    #[serde(default)]
    pub operators: Vec<Operator>,
}

impl Seed {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load everything into `store`. Matches go in as one batch, so a bad record leaves the
    /// store without any of them. Returns the operator directory.
    pub fn apply(self, store: &MemoryStore) -> TournamentResult<StaticDirectory> {
        let events: HashMap<_, _> = self.events.iter().map(|e| (e.id.clone(), e.clone())).collect();
        for event in self.events {
            store.put_event(event)?;
        }
        let team_count = self.teams.len();
        for team in self.teams {
            match events.get(&team.event_id) {
                Some(event) if !event.accepts_roster(&team) => warn!(
                    "Team {} has {} player(s), outside {}..={} for {}",
                    team.id,
                    team.roster.len(),
                    event.roster_min,
                    event.roster_max,
                    event.id
                ),
                None => warn!("Team {} references unknown event {}", team.id, team.event_id),
                _ => {}
            }
            store.put_team(team)?;
        }
        store.put_slots(self.slots)?;
        let match_count = self.matches.len();
        let batch = self
            .matches
            .into_iter()
            .fold(WriteBatch::new(), |batch, m| batch.insert(m));
        store.commit(batch)?;
        info!(
            "Seeded {} event(s), {} team(s), {} match(es), {} operator(s)",
            events.len(),
            team_count,
            match_count,
            self.operators.len()
        );
        Ok(StaticDirectory::new(self.operators))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IdentityProvider, MatchType};

    const SEED: &str = r#"{
        "events": [{ "id": "vb", "name": "Volleyball", "roster_min": 2, "roster_max": 4 }],
        "teams": [
            { "id": "red", "name": "Red", "event_id": "vb", "roster": ["a", "b"] },
            { "id": "blue", "name": "Blue", "event_id": "vb", "roster": ["c"] }
        ],
        "matches": [
            { "id": "Q1", "event_id": "vb", "match_type": "qualifier", "competitor_a": "red",
              "competitor_b": "blue", "scheduled_at": "2026-06-01T09:00:00Z", "venue": "court-1",
              "pool": "1" },
            { "id": "SF1", "event_id": "vb", "match_type": "semifinal", "competitor_a": "A1",
              "competitor_b": "B1", "scheduled_at": "2026-06-01T12:00:00Z", "venue": "court-1" }
        ],
        "slots": [
            { "event_id": "vb", "stage": "semifinal", "code": "A1", "kind": "placeholder" }
        ],
        "operators": [{ "id": "ref-1", "name": "Ref", "role": "operator",
                        "venues": [{ "event_id": "vb", "venue": "court-1" }] }]
    }"#;

    #[test]
    fn seed_populates_store_and_directory() {
        let seed: Seed = serde_json::from_str(SEED).unwrap();
        let store = MemoryStore::new();
        let directory = seed.apply(&store).unwrap();

        assert_eq!(directory.len(), 1);
        assert!(directory.operator("ref-1").is_some());
        assert_eq!(store.matches_for_event("vb").unwrap().len(), 2);
        assert_eq!(store.teams_for_event("vb").unwrap().len(), 2);
        let slots = store.slot_table("vb").unwrap();
        assert!(slots.is_placeholder("vb", MatchType::Semifinal, "A1"));
        assert!(!slots.is_placeholder("vb", MatchType::Qualifier, "A1"));
    }

    #[test]
    fn duplicate_match_ids_seed_nothing() {
        let mut seed: Seed = serde_json::from_str(SEED).unwrap();
        let dup = seed.matches[0].clone();
        seed.matches.push(dup);
        let store = MemoryStore::new();
        assert!(seed.apply(&store).is_err());
        assert!(store.matches_for_event("vb").unwrap().is_empty());
    }
}
