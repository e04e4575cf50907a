//! Dependency gate: which matches are shown / playable as the bracket unfolds.
//!
//! Everything here is a pure function of one event's match set and its slot table; callers
//! recompute on every update.

use crate::models::{GameMatch, MatchStatus, MatchType, SlotTable};
use std::cmp::Ordering;

/// Decide whether `game` should be shown, given every match of its event.
///
/// 1. Void matches are never shown.
/// 2. Qualifiers are shown until finalized.
/// 3. Any other finalized match is consumed and hidden.
/// 4. Stage prerequisites: series legs wait on the previous leg, semifinal-tier matches on the
///    whole qualifying round, finals and bronze matches on their named predecessors. A later
///    leg must satisfy both its leg check and its stage check.
/// 5. Otherwise shown once both slots are real teams or play has begun.
pub fn should_display(game: &GameMatch, all: &[GameMatch], slots: &SlotTable) -> bool {
    if game.status == MatchStatus::Void {
        return false;
    }
    if game.match_type == MatchType::Qualifier {
        return game.status != MatchStatus::Final;
    }
    if game.status == MatchStatus::Final {
        return false;
    }

    // Later legs also pass every stage check below.
    let later_leg = game.series.as_ref().map(|s| s.leg).filter(|leg| *leg >= 2);
    if let Some(leg) = later_leg {
        if !previous_leg_underway(game, all) || (leg >= 3 && !decider_needed(game, all)) {
            return false;
        }
    }

    if game.match_type.is_semifinal_tier() {
        return qualifiers_complete(game, all) && named_prerequisites_final(game, all);
    }

    if game.match_type.is_late_elimination() {
        return if game.prerequisites.is_empty() {
            stage_complete(game, all, MatchType::Semifinal)
        } else {
            named_prerequisites_final(game, all)
        };
    }

    later_leg.is_some() || game.status.has_started() || slots.fully_resolved(game)
}

/// Best-of-three decider: leg 3 is needed only when legs 1 and 2 are both final and each
/// competitor took one of them. A sweep, or a tied leg, leaves it hidden.
pub fn decider_needed(game: &GameMatch, all: &[GameMatch]) -> bool {
    let Some(series) = &game.series else {
        return false;
    };
    if series.leg != 3 {
        return false;
    }
    let (Some(first), Some(second)) = (leg(all, &series.series_id, 1), leg(all, &series.series_id, 2))
    else {
        return false;
    };
    match (first.winner(), second.winner()) {
        (Some(w1), Some(w2)) => w1 != w2,
        _ => false,
    }
}

fn leg<'a>(all: &'a [GameMatch], series_id: &str, leg: u8) -> Option<&'a GameMatch> {
    all.iter().find(|m| {
        m.series
            .as_ref()
            .is_some_and(|s| s.series_id == series_id && s.leg == leg)
    })
}

fn previous_leg_underway(game: &GameMatch, all: &[GameMatch]) -> bool {
    let Some(series) = &game.series else {
        return true;
    };
    leg(all, &series.series_id, series.leg - 1).is_some_and(|prev| prev.status.has_started())
}

fn qualifiers_complete(game: &GameMatch, all: &[GameMatch]) -> bool {
    stage_complete(game, all, MatchType::Qualifier)
}

/// Every non-void match of `stage` in the event is final.
fn stage_complete(game: &GameMatch, all: &[GameMatch], stage: MatchType) -> bool {
    all.iter()
        .filter(|m| m.event_id == game.event_id && m.match_type == stage)
        .filter(|m| m.status != MatchStatus::Void)
        .all(GameMatch::is_final)
}

/// Named predecessors are all final. A name missing from the event counts as unmet.
fn named_prerequisites_final(game: &GameMatch, all: &[GameMatch]) -> bool {
    game.prerequisites.iter().all(|id| {
        all.iter()
            .find(|m| m.id == *id)
            .is_some_and(GameMatch::is_final)
    })
}

/// Display order: live first, then stage priority, then scheduled time, then identifier
/// sequence number.
pub fn display_order(a: &GameMatch, b: &GameMatch) -> Ordering {
    let live = |m: &GameMatch| m.status != MatchStatus::Live;
    live(a)
        .cmp(&live(b))
        .then_with(|| a.match_type.cmp(&b.match_type))
        .then_with(|| a.scheduled_at.cmp(&b.scheduled_at))
        .then_with(|| {
            a.sequence()
                .unwrap_or(u32::MAX)
                .cmp(&b.sequence().unwrap_or(u32::MAX))
        })
        .then_with(|| a.id.cmp(&b.id))
}

/// One row of the visibility board.
#[derive(Clone, Debug, serde::Serialize)]
pub struct BoardEntry {
    #[serde(flatten)]
    pub game: GameMatch,
    pub visible: bool,
}

/// Every match of the event in display order, each tagged with its gate decision.
pub fn board(all: &[GameMatch], slots: &SlotTable) -> Vec<BoardEntry> {
    let mut rows: Vec<BoardEntry> = all
        .iter()
        .map(|m| BoardEntry {
            visible: should_display(m, all, slots),
            game: m.clone(),
        })
        .collect();
    rows.sort_by(|a, b| display_order(&a.game, &b.game));
    rows
}

/// Just the visible matches, in display order.
pub fn visible_matches(all: &[GameMatch], slots: &SlotTable) -> Vec<GameMatch> {
    board(all, slots)
        .into_iter()
        .filter(|row| row.visible)
        .map(|row| row.game)
        .collect()
}
