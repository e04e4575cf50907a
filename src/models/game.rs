//! Match (game), its stage, status, and the two competitor sides.

use crate::models::event::EventId;
use crate::models::team::TeamId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a match; encodes stage and sequence (e.g. `Q12`, `SF-2`).
pub type MatchId = String;

/// One of the two competitor slots of a match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    A,
    B,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Stage of the tournament this match belongs to.
///
/// Variant order is the display priority: qualifiers first, bonus matches last.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Qualifier,
    Redemption,
    Quarterfinal,
    Semifinal,
    Bronze,
    Final,
    Bonus,
}

impl MatchType {
    /// Stages that open once the qualifying round is complete.
    pub fn is_semifinal_tier(self) -> bool {
        matches!(
            self,
            MatchType::Redemption | MatchType::Quarterfinal | MatchType::Semifinal
        )
    }

    /// Late single-elimination stages gated on named predecessors.
    pub fn is_late_elimination(self) -> bool {
        matches!(self, MatchType::Bronze | MatchType::Final)
    }

    /// Qualifying-round stages (pool play and its side rounds).
    pub fn is_pool_tier(self) -> bool {
        matches!(
            self,
            MatchType::Qualifier | MatchType::Redemption | MatchType::Bonus
        )
    }
}

/// Lifecycle of a match. `Final` and `Void` are terminal.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Live,
    Final,
    Void,
}

impl MatchStatus {
    /// Scores may only be present in these states.
    pub fn carries_score(self) -> bool {
        matches!(self, MatchStatus::Live | MatchStatus::Final)
    }

    pub fn has_started(self) -> bool {
        matches!(self, MatchStatus::Live | MatchStatus::Final)
    }
}

/// Position of a match inside a best-of-three series.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct SeriesLeg {
    pub series_id: String,
    /// 1, 2 or 3.
    pub leg: u8,
}

/// A single scheduled contest between two competitor slots.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub event_id: EventId,
    pub match_type: MatchType,
    #[serde(default)]
    pub pool: Option<String>,
    /// Team id or bracket-slot placeholder.
    pub competitor_a: TeamId,
    pub competitor_b: TeamId,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default)]
    pub score_a: Option<u32>,
    #[serde(default)]
    pub score_b: Option<u32>,
    pub scheduled_at: DateTime<Utc>,
    /// Set only on the scheduled -> live transition.
    #[serde(default)]
    pub actual_start: Option<DateTime<Utc>>,
    pub venue: String,
    #[serde(default)]
    pub series: Option<SeriesLeg>,
    /// Named predecessor matches (bracket graph edges into this match).
    #[serde(default)]
    pub prerequisites: Vec<MatchId>,
    /// Bumped by the store on every committed update.
    #[serde(default)]
    pub revision: u64,
}

impl GameMatch {
    pub fn new(
        id: impl Into<MatchId>,
        event_id: impl Into<EventId>,
        match_type: MatchType,
        competitor_a: impl Into<TeamId>,
        competitor_b: impl Into<TeamId>,
        scheduled_at: DateTime<Utc>,
        venue: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            event_id: event_id.into(),
            match_type,
            pool: None,
            competitor_a: competitor_a.into(),
            competitor_b: competitor_b.into(),
            status: MatchStatus::Scheduled,
            score_a: None,
            score_b: None,
            scheduled_at,
            actual_start: None,
            venue: venue.into(),
            series: None,
            prerequisites: Vec::new(),
            revision: 0,
        }
    }

    pub fn with_pool(mut self, pool: impl Into<String>) -> Self {
        self.pool = Some(pool.into());
        self
    }

    pub fn with_series(mut self, series_id: impl Into<String>, leg: u8) -> Self {
        self.series = Some(SeriesLeg {
            series_id: series_id.into(),
            leg,
        });
        self
    }

    pub fn with_prerequisites<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<MatchId>,
    {
        self.prerequisites = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn competitor(&self, side: Side) -> &TeamId {
        match side {
            Side::A => &self.competitor_a,
            Side::B => &self.competitor_b,
        }
    }

    pub fn score(&self, side: Side) -> Option<u32> {
        match side {
            Side::A => self.score_a,
            Side::B => self.score_b,
        }
    }

    pub fn involves(&self, team: &str) -> bool {
        self.competitor_a == team || self.competitor_b == team
    }

    pub fn is_final(&self) -> bool {
        self.status == MatchStatus::Final
    }

    /// Winning competitor of a finalized match; `None` on a tie or missing score.
    pub fn winner(&self) -> Option<&TeamId> {
        if !self.is_final() {
            return None;
        }
        let (a, b) = (self.score_a?, self.score_b?);
        match a.cmp(&b) {
            std::cmp::Ordering::Greater => Some(&self.competitor_a),
            std::cmp::Ordering::Less => Some(&self.competitor_b),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Trailing digits of the identifier (`SF-2` -> 2). Used for display ordering.
    pub fn sequence(&self) -> Option<u32> {
        let digits: String = self
            .id
            .chars()
            .rev()
            .take_while(|c| c.is_ascii_digit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(id: &str) -> GameMatch {
        let at = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
        GameMatch::new(id, "vb", MatchType::Qualifier, "A1", "A2", at, "court-1")
    }

    #[test]
    fn sequence_reads_trailing_digits() {
        assert_eq!(sample("SF-2").sequence(), Some(2));
        assert_eq!(sample("Q12").sequence(), Some(12));
        assert_eq!(sample("FINAL").sequence(), None);
    }

    #[test]
    fn winner_requires_final_and_distinct_scores() {
        let mut m = sample("Q1");
        m.status = MatchStatus::Live;
        m.score_a = Some(21);
        m.score_b = Some(15);
        assert_eq!(m.winner(), None);
        m.status = MatchStatus::Final;
        assert_eq!(m.winner().map(String::as_str), Some("A1"));
        m.score_b = Some(21);
        assert_eq!(m.winner(), None);
    }
}
