//! Standings: win/loss/differential tables, overall and per pool.

use crate::models::{GameMatch, MatchStatus, Side, SlotTable, Standing, TeamId};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Matches that count toward standings: final, scored, and between two real teams.
fn counted<'a>(
    matches: &'a [GameMatch],
    slots: &'a SlotTable,
) -> impl Iterator<Item = &'a GameMatch> + 'a {
    matches.iter().filter(move |m| {
        m.status == MatchStatus::Final
            && m.score_a.is_some()
            && m.score_b.is_some()
            && slots.fully_resolved(m)
    })
}

/// Ranking order: wins, differential, played (all descending), then competitor id ascending.
pub fn ranking_order(a: &Standing, b: &Standing) -> Ordering {
    b.wins
        .cmp(&a.wins)
        .then_with(|| b.differential.cmp(&a.differential))
        .then_with(|| b.played.cmp(&a.played))
        .then_with(|| a.competitor.cmp(&b.competitor))
}

fn tabulate<'a>(games: impl Iterator<Item = &'a GameMatch>) -> Vec<Standing> {
    let mut table: HashMap<TeamId, Standing> = HashMap::new();
    for m in games {
        let (Some(a), Some(b)) = (m.score(Side::A), m.score(Side::B)) else {
            continue;
        };
        table
            .entry(m.competitor_a.clone())
            .or_insert_with(|| Standing::new(m.competitor_a.clone()))
            .record(a, b);
        table
            .entry(m.competitor_b.clone())
            .or_insert_with(|| Standing::new(m.competitor_b.clone()))
            .record(b, a);
    }
    let mut rows: Vec<Standing> = table.into_values().collect();
    rows.sort_by(ranking_order);
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i as u32 + 1;
    }
    rows
}

/// Overall standings for one event's matches. Ranks are 1..N with no shared ranks.
pub fn compute_standings(matches: &[GameMatch], slots: &SlotTable) -> Vec<Standing> {
    tabulate(counted(matches, slots))
}

/// Canonical letter code for a pool label.
///
/// `"A"`, `"pool a"`, `"1"`, `"Pool 1"` and sport-prefixed codes such as `"VB1"` all map to
/// `"A"`. Labels that fit none of these shapes are kept (uppercased, separators removed).
pub fn normalize_pool(label: &str) -> Option<String> {
    let mut cleaned: String = label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_uppercase();
    if let Some(rest) = cleaned.strip_prefix("POOL") {
        if !rest.is_empty() {
            cleaned = rest.to_string();
        }
    }
    if cleaned.is_empty() {
        return None;
    }

    let digits_at = cleaned
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(cleaned.len());
    let (prefix, digits) = cleaned.split_at(digits_at);
    let numeric = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
    if numeric && prefix.chars().all(|c| c.is_ascii_alphabetic()) {
        if let Ok(n @ 1..=26) = digits.parse::<u8>() {
            return Some(char::from(b'A' + n - 1).to_string());
        }
    }
    Some(cleaned)
}

/// Rank of `competitor` within its pool, or `None` when it has no finalized pool match.
///
/// The pool is taken from the competitor's counted matches; the table is built from every
/// counted match carrying the same normalized label.
pub fn pool_rank(matches: &[GameMatch], slots: &SlotTable, competitor: &str) -> Option<u32> {
    let pool = counted(matches, slots)
        .filter(|m| m.involves(competitor))
        .find_map(|m| m.pool.as_deref().and_then(normalize_pool))?;
    pool_standings(matches, slots, &pool)
        .into_iter()
        .find(|s| s.competitor == competitor)
        .map(|s| s.rank)
}

/// Full table for one pool (label is normalized before matching).
pub fn pool_standings(matches: &[GameMatch], slots: &SlotTable, pool: &str) -> Vec<Standing> {
    let Some(pool) = normalize_pool(pool) else {
        return Vec::new();
    };
    tabulate(counted(matches, slots).filter(|m| {
        m.pool
            .as_deref()
            .and_then(normalize_pool)
            .is_some_and(|p| p == pool)
    }))
}

/// Fill in display names; unknown ids keep the id as their name.
pub fn attach_names(rows: &mut [Standing], names: &HashMap<TeamId, String>) {
    for row in rows {
        row.name = names
            .get(&row.competitor)
            .cloned()
            .unwrap_or_else(|| row.competitor.clone());
    }
}

/// Standings as CSV, one row per competitor in rank order.
pub fn standings_csv(rows: &[Standing]) -> Result<String, csv::Error> {
    let mut w = csv::Writer::from_writer(Vec::new());
    w.write_record([
        "rank", "competitor", "name", "played", "wins", "losses", "points_for",
        "points_against", "differential",
    ])?;
    for s in rows {
        w.write_record([
            s.rank.to_string(),
            s.competitor.clone(),
            s.name.clone(),
            s.played.to_string(),
            s.wins.to_string(),
            s.losses.to_string(),
            s.points_for.to_string(),
            s.points_against.to_string(),
            s.differential.to_string(),
        ])?;
    }
    let bytes = w.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::normalize_pool;

    #[test]
    fn pool_labels_canonicalize_to_letters() {
        assert_eq!(normalize_pool("A").as_deref(), Some("A"));
        assert_eq!(normalize_pool("pool a").as_deref(), Some("A"));
        assert_eq!(normalize_pool("1").as_deref(), Some("A"));
        assert_eq!(normalize_pool("Pool 2").as_deref(), Some("B"));
        assert_eq!(normalize_pool("VB3").as_deref(), Some("C"));
        assert_eq!(normalize_pool("bb-4").as_deref(), Some("D"));
        assert_eq!(normalize_pool("  "), None);
    }

    #[test]
    fn odd_labels_are_kept() {
        assert_eq!(normalize_pool("gold").as_deref(), Some("GOLD"));
        assert_eq!(normalize_pool("A2B").as_deref(), Some("A2B"));
        assert_eq!(normalize_pool("99").as_deref(), Some("99"));
    }
}
