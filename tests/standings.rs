//! Integration tests for standings and pool ranks.

use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use tournament_progression::logic::{attach_names, pool_standings, standings_csv};
use tournament_progression::{
    compute_standings, pool_rank, GameMatch, MatchStatus, MatchType, SlotTable, Standing,
};

fn result(id: &str, a: &str, b: &str, score_a: u32, score_b: u32) -> GameMatch {
    let at = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
    let mut m = GameMatch::new(id, "vb", MatchType::Qualifier, a, b, at, "court-1");
    m.status = MatchStatus::Final;
    m.score_a = Some(score_a);
    m.score_b = Some(score_b);
    m
}

fn in_pool(m: GameMatch, pool: &str) -> GameMatch {
    m.with_pool(pool)
}

fn row<'a>(rows: &'a [Standing], id: &str) -> &'a Standing {
    rows.iter().find(|s| s.competitor == id).unwrap()
}

fn order(rows: &[Standing]) -> Vec<&str> {
    rows.iter().map(|s| s.competitor.as_str()).collect()
}

/// Round robin where t1 beats everyone, t2 beats t3 and t4, t3 beats t4.
fn round_robin() -> Vec<GameMatch> {
    vec![
        result("Q1", "t1", "t2", 21, 18),
        result("Q2", "t1", "t3", 21, 10),
        result("Q3", "t1", "t4", 21, 5),
        result("Q4", "t2", "t3", 21, 19),
        result("Q5", "t2", "t4", 21, 11),
        result("Q6", "t3", "t4", 21, 20),
    ]
}

#[test]
fn round_robin_ranks_by_wins() {
    let rows = compute_standings(&round_robin(), &SlotTable::new());
    assert_eq!(order(&rows), ["t1", "t2", "t3", "t4"]);
    let wins: Vec<u32> = rows.iter().map(|s| s.wins).collect();
    assert_eq!(wins, [3, 2, 1, 0]);
    let ranks: Vec<u32> = rows.iter().map(|s| s.rank).collect();
    assert_eq!(ranks, [1, 2, 3, 4]);

    let t1 = row(&rows, "t1");
    assert_eq!(t1.played, 3);
    assert_eq!(t1.losses, 0);
    assert_eq!(t1.points_for, 63);
    assert_eq!(t1.points_against, 33);
    assert_eq!(t1.differential, 30);
}

#[test]
fn equal_wins_break_on_differential_then_id() {
    let rows = compute_standings(
        &[
            result("Q1", "t1", "t2", 21, 19),
            result("Q2", "t3", "t4", 21, 10),
            result("Q3", "zz", "aa", 15, 15),
        ],
        &SlotTable::new(),
    );
    // t3 (+11) ahead of t1 (+2); aa and zz fully tied fall back to id.
    assert_eq!(order(&rows), ["t3", "t1", "aa", "zz", "t2", "t4"]);
    let ranks: Vec<u32> = rows.iter().map(|s| s.rank).collect();
    assert_eq!(ranks, [1, 2, 3, 4, 5, 6]);
}

#[test]
fn tie_counts_as_played_without_win_or_loss() {
    let rows = compute_standings(&[result("Q1", "t1", "t2", 20, 20)], &SlotTable::new());
    for id in ["t1", "t2"] {
        let s = row(&rows, id);
        assert_eq!((s.played, s.wins, s.losses), (1, 0, 0));
        assert_eq!(s.differential, 0);
        assert_eq!(s.points_for, 20);
    }
}

#[test]
fn only_final_scored_real_matches_count() {
    let mut slots = SlotTable::new();
    slots.insert("vb", MatchType::Qualifier, "W-Q9", tournament_progression::SlotKind::Placeholder);

    let mut live = result("Q2", "t1", "t3", 10, 4);
    live.status = MatchStatus::Live;
    let mut unscored = result("Q3", "t1", "t4", 0, 0);
    unscored.score_b = None;
    let matches = vec![
        result("Q1", "t1", "t2", 21, 15),
        live,
        unscored,
        result("Q4", "W-Q9", "t2", 21, 0),
    ];
    let rows = compute_standings(&matches, &slots);
    assert_eq!(order(&rows), ["t1", "t2"]);
    assert_eq!(row(&rows, "t1").played, 1);
    assert_eq!(row(&rows, "t2").played, 1);
}

#[test]
fn no_counted_matches_gives_empty_table() {
    let mut m = result("Q1", "t1", "t2", 0, 0);
    m.status = MatchStatus::Scheduled;
    m.score_a = None;
    m.score_b = None;
    assert!(compute_standings(&[m], &SlotTable::new()).is_empty());
}

fn pools() -> Vec<GameMatch> {
    vec![
        // Pool A, written three different ways.
        in_pool(result("Q1", "a1", "a2", 21, 10), "A"),
        in_pool(result("Q2", "a2", "a3", 21, 15), "Pool 1"),
        in_pool(result("Q3", "a1", "a3", 21, 19), "vb1"),
        // Pool B.
        in_pool(result("Q4", "b1", "b2", 10, 21), "B"),
    ]
}

#[test]
fn pool_rank_groups_equivalent_labels() {
    let matches = pools();
    let slots = SlotTable::new();
    assert_eq!(pool_rank(&matches, &slots, "a1"), Some(1));
    assert_eq!(pool_rank(&matches, &slots, "a2"), Some(2));
    assert_eq!(pool_rank(&matches, &slots, "a3"), Some(3));
    assert_eq!(pool_rank(&matches, &slots, "b2"), Some(1));
    assert_eq!(pool_rank(&matches, &slots, "b1"), Some(2));

    let table = pool_standings(&matches, &slots, "pool a");
    assert_eq!(order(&table), ["a1", "a2", "a3"]);
}

#[test]
fn pool_rank_absent_without_finalized_pool_match() {
    let mut matches = pools();
    let mut pending = in_pool(result("Q5", "c1", "c2", 0, 0), "C");
    pending.status = MatchStatus::Scheduled;
    pending.score_a = None;
    pending.score_b = None;
    matches.push(pending);
    let slots = SlotTable::new();
    assert_eq!(pool_rank(&matches, &slots, "c1"), None);
    assert_eq!(pool_rank(&matches, &slots, "nobody"), None);
}

#[test]
fn csv_export_lists_rows_in_rank_order() {
    let mut rows = compute_standings(&round_robin(), &SlotTable::new());
    let names: HashMap<String, String> = [("t1", "Spikers"), ("t2", "Diggers")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    attach_names(&mut rows, &names);
    assert_eq!(row(&rows, "t1").name, "Spikers");
    assert_eq!(row(&rows, "t3").name, "t3");

    let csv = standings_csv(&rows).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "rank,competitor,name,played,wins,losses,points_for,points_against,differential"
    );
    assert_eq!(lines[1], "1,t1,Spikers,3,3,0,63,33,30");
    assert_eq!(lines.len(), 5);
}
