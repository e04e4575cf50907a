//! Competitor-slot classification, written at seeding time.
//!
//! The same literal code can name a real team in one stage and a bracket position in another
//! (pool seed `A1` is a team during qualifiers but "winner of pool A" in the semifinals), so
//! entries are keyed by event, stage and code.

use crate::models::event::EventId;
use crate::models::game::{GameMatch, MatchType, Side};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Placeholder,
    RealTeam,
}

/// One seeded classification row.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub event_id: EventId,
    pub stage: MatchType,
    pub code: String,
    pub kind: SlotKind,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct SlotKey {
    event_id: EventId,
    stage: MatchType,
    code: String,
}

#[derive(Clone, Debug, Default)]
pub struct SlotTable {
    entries: HashMap<SlotKey, SlotKind>,
}

const ELIMINATION_STAGES: [MatchType; 5] = [
    MatchType::Redemption,
    MatchType::Quarterfinal,
    MatchType::Semifinal,
    MatchType::Bronze,
    MatchType::Final,
];

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = SlotEntry>) -> Self {
        let mut table = Self::new();
        table.extend(entries);
        table
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = SlotEntry>) {
        for e in entries {
            self.insert(&e.event_id, e.stage, &e.code, e.kind);
        }
    }

    pub fn insert(&mut self, event_id: &str, stage: MatchType, code: &str, kind: SlotKind) {
        self.entries.insert(
            SlotKey {
                event_id: event_id.to_string(),
                stage,
                code: code.to_string(),
            },
            kind,
        );
    }

    /// Mark `code` as an unresolved bracket position in every post-qualifier stage.
    pub fn placeholder_in_elimination(&mut self, event_id: &str, code: &str) {
        for stage in ELIMINATION_STAGES {
            self.insert(event_id, stage, code, SlotKind::Placeholder);
        }
    }

    /// Classify a code. Empty codes are unassigned slots; codes never seeded are ids written by
    /// the external resolution step and therefore real.
    pub fn classify(&self, event_id: &str, stage: MatchType, code: &str) -> SlotKind {
        if code.trim().is_empty() {
            return SlotKind::Placeholder;
        }
        let key = SlotKey {
            event_id: event_id.to_string(),
            stage,
            code: code.to_string(),
        };
        self.entries.get(&key).copied().unwrap_or(SlotKind::RealTeam)
    }

    pub fn is_placeholder(&self, event_id: &str, stage: MatchType, code: &str) -> bool {
        self.classify(event_id, stage, code) == SlotKind::Placeholder
    }

    /// Whether the given side of the match names a real team in the match's own context.
    pub fn side_resolved(&self, game: &GameMatch, side: Side) -> bool {
        !self.is_placeholder(&game.event_id, game.match_type, game.competitor(side))
    }

    /// Both competitor slots resolved to real teams.
    pub fn fully_resolved(&self, game: &GameMatch) -> bool {
        self.side_resolved(game, Side::A) && self.side_resolved(game, Side::B)
    }

    /// Rows belonging to one event (for snapshots handed to consumers).
    pub fn for_event(&self, event_id: &str) -> SlotTable {
        SlotTable {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| k.event_id == event_id)
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }

    pub fn remove_event(&mut self, event_id: &str) {
        self.entries.retain(|k, _| k.event_id != event_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_code_differs_by_stage() {
        let mut t = SlotTable::new();
        t.insert("vb", MatchType::Qualifier, "A1", SlotKind::RealTeam);
        t.placeholder_in_elimination("vb", "A1");
        assert_eq!(t.classify("vb", MatchType::Qualifier, "A1"), SlotKind::RealTeam);
        assert_eq!(t.classify("vb", MatchType::Semifinal, "A1"), SlotKind::Placeholder);
        assert_eq!(t.classify("bb", MatchType::Semifinal, "A1"), SlotKind::RealTeam);
    }

    #[test]
    fn blank_code_is_placeholder() {
        let t = SlotTable::new();
        assert!(t.is_placeholder("vb", MatchType::Final, "  "));
        assert!(!t.is_placeholder("vb", MatchType::Final, "team-ravens"));
    }
}
