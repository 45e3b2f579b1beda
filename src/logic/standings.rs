//! Group standings: tables from finished group matches, tie-breaks, qualifiers.
//!
//! Ranking per group:
//! 1. points (3 win / 1 draw / 0 loss);
//! 2. teams level on points are ranked by a table of the matches among just those teams
//!    (points, then goal difference) - for two teams that is their head-to-head;
//! 3. then overall goal difference, goals for, wins, away wins;
//! 4. finally team id, so no two teams ever compare equal.

use crate::models::{
    GameMatch, Group, GroupStandings, QualifiedTeam, StageKind, StandingRow, TeamId,
};
use crate::store::{stage_of_kind, Store};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// A finished group match with both teams and scores known.
#[derive(Clone, Copy, Debug)]
struct Played<'a> {
    home: &'a str,
    away: &'a str,
    home_score: u32,
    away_score: u32,
}

/// Points and goal difference in the matches among a tied cluster.
#[derive(Clone, Copy, Debug, Default)]
struct MiniRow {
    points: u32,
    goal_difference: i64,
}

fn mini_table<'a>(cluster: &HashSet<&'a str>, played: &[Played<'a>]) -> HashMap<&'a str, MiniRow> {
    let mut table: HashMap<&str, MiniRow> = cluster.iter().map(|t| (*t, MiniRow::default())).collect();
    for p in played {
        if !cluster.contains(p.home) || !cluster.contains(p.away) {
            continue;
        }
        let diff = i64::from(p.home_score) - i64::from(p.away_score);
        let (home_pts, away_pts) = match p.home_score.cmp(&p.away_score) {
            Ordering::Greater => (3, 0),
            Ordering::Less => (0, 3),
            Ordering::Equal => (1, 1),
        };
        if let Some(row) = table.get_mut(p.home) {
            row.points += home_pts;
            row.goal_difference += diff;
        }
        if let Some(row) = table.get_mut(p.away) {
            row.points += away_pts;
            row.goal_difference -= diff;
        }
    }
    table
}

/// Overall-stat cascade used after points and mini-table are level.
fn compare_overall(a: &StandingRow, b: &StandingRow) -> Ordering {
    b.goal_difference()
        .cmp(&a.goal_difference())
        .then(b.goals_for.cmp(&a.goals_for))
        .then(b.wins.cmp(&a.wins))
        .then(b.away_wins.cmp(&a.away_wins))
        .then_with(|| a.team_id.cmp(&b.team_id))
}

/// Order a cluster of teams that are level on points.
fn resolve_cluster(cluster: &mut [StandingRow], played: &[Played<'_>]) {
    if cluster.len() < 2 {
        return;
    }
    let ids: HashSet<&str> = cluster.iter().map(|r| r.team_id.as_str()).collect();
    let mini = mini_table(&ids, played);
    let key = |r: &StandingRow| mini.get(r.team_id.as_str()).copied().unwrap_or_default();
    let mut ranked = cluster.to_vec();
    ranked.sort_by(|a, b| {
        let (ma, mb) = (key(a), key(b));
        mb.points
            .cmp(&ma.points)
            .then(mb.goal_difference.cmp(&ma.goal_difference))
            .then_with(|| compare_overall(a, b))
    });
    cluster.clone_from_slice(&ranked);
}

/// Rank the members of one group from its matches. Unfinished or incomplete matches are
/// ignored; with nothing played the order falls back to team id.
pub fn rank_group(team_ids: &[TeamId], matches: &[GameMatch]) -> Vec<StandingRow> {
    let mut rows: Vec<StandingRow> = Vec::with_capacity(team_ids.len());
    let mut position: HashMap<&str, usize> = HashMap::new();
    for id in team_ids {
        if !position.contains_key(id.as_str()) {
            position.insert(id.as_str(), rows.len());
            rows.push(StandingRow::new(id.clone()));
        }
    }

    let mut played = Vec::new();
    for m in matches {
        let Some((home, away, home_score, away_score)) = m.result() else {
            continue;
        };
        let (Some(&h), Some(&a)) = (position.get(home.as_str()), position.get(away.as_str())) else {
            log::warn!("Ignoring match {} between non-members {} and {}", m.id, home, away);
            continue;
        };
        rows[h].record(home_score, away_score, false);
        rows[a].record(away_score, home_score, true);
        played.push(Played {
            home,
            away,
            home_score,
            away_score,
        });
    }

    rows.sort_by(|a, b| b.points.cmp(&a.points));

    let mut start = 0;
    while start < rows.len() {
        let points = rows[start].points;
        let end = rows[start..]
            .iter()
            .position(|r| r.points != points)
            .map_or(rows.len(), |offset| start + offset);
        resolve_cluster(&mut rows[start..end], &played);
        start = end;
    }
    rows
}

fn standings_for(group: &Group, stage_matches: &[GameMatch]) -> GroupStandings {
    let matches: Vec<GameMatch> = stage_matches
        .iter()
        .filter(|m| m.group_id.as_deref() == Some(group.id.as_str()))
        .cloned()
        .collect();
    GroupStandings {
        group_id: group.id.clone(),
        group_name: group.name.clone(),
        rows: rank_group(&group.team_ids, &matches),
    }
}

/// Ranked tables of every group in the tournament's group stage, groups ordered by name.
/// Empty if there is no group stage.
pub fn group_standings<S: Store>(store: &S, tournament_id: &str) -> Vec<GroupStandings> {
    let Some(stage) = stage_of_kind(store, tournament_id, StageKind::Group) else {
        return Vec::new();
    };
    let stage_matches = store.matches_in_stage(&stage.id);
    store
        .groups(tournament_id)
        .iter()
        .map(|g| standings_for(g, &stage_matches))
        .collect()
}

/// Places 1 and 2 of every group, in group order.
pub fn qualified_teams<S: Store>(store: &S, tournament_id: &str) -> Vec<QualifiedTeam> {
    let qualified: Vec<QualifiedTeam> = group_standings(store, tournament_id)
        .into_iter()
        .flat_map(|table| {
            let group = table.group_id;
            table
                .rows
                .into_iter()
                .take(2)
                .zip(1u8..)
                .map(move |(row, place)| QualifiedTeam {
                    team_id: row.team_id,
                    group: group.clone(),
                    place,
                })
        })
        .collect();
    log::debug!("{} team(s) qualified in tournament {}", qualified.len(), tournament_id);
    qualified
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchStatus, TeamSlot};
    use chrono::NaiveDate;

    fn played(home: &str, away: &str, hs: u32, aws: u32) -> GameMatch {
        let date = NaiveDate::from_ymd_opt(2026, 1, 17)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        let mut m = GameMatch::new("S", 1, 1, date, TeamSlot::team(home), TeamSlot::team(away));
        m.status = MatchStatus::Finished;
        m.home_score = Some(hs);
        m.away_score = Some(aws);
        m
    }

    fn ids(rows: &[StandingRow]) -> Vec<&str> {
        rows.iter().map(|r| r.team_id.as_str()).collect()
    }

    fn teams(names: &[&str]) -> Vec<TeamId> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn nothing_played_orders_by_team_id() {
        let rows = rank_group(&teams(&["C", "A", "B"]), &[]);
        assert_eq!(ids(&rows), ["A", "B", "C"]);
        assert!(rows.iter().all(|r| r.points == 0 && r.played == 0));
    }

    #[test]
    fn three_way_tie_uses_mini_table() {
        let matches = [
            played("A", "B", 0, 1),
            played("B", "C", 0, 2),
            played("C", "A", 0, 3),
        ];
        let rows = rank_group(&teams(&["A", "B", "C"]), &matches);
        // All on 3 points. Mini goal difference A +2, B -1, C -1; C has scored more than B.
        assert_eq!(ids(&rows), ["A", "C", "B"]);

        let matches = [
            played("A", "B", 1, 0),
            played("B", "C", 5, 0),
            played("C", "A", 1, 0),
        ];
        let rows = rank_group(&teams(&["A", "B", "C"]), &matches);
        assert_eq!(ids(&rows), ["B", "A", "C"]);
    }

    #[test]
    fn two_team_tie_uses_direct_meeting() {
        // A and B on 3 points; B has the better goal difference but lost to A.
        let matches = [played("A", "B", 1, 0), played("B", "C", 5, 0)];
        let rows = rank_group(&teams(&["A", "B", "C", "D"]), &matches);
        // C and D on 0 points never met: overall goal difference puts D ahead.
        assert_eq!(ids(&rows), ["A", "B", "D", "C"]);
        assert!(rows[1].goal_difference() > rows[0].goal_difference());
    }

    #[test]
    fn away_wins_break_otherwise_equal_rows() {
        // Two separate pairs of teams; P and Q never meet.
        let matches = [played("P", "X", 1, 0), played("Y", "Q", 0, 1)];
        let rows = rank_group(&teams(&["P", "Q", "X", "Y"]), &matches);
        assert_eq!(ids(&rows)[..2], ["Q", "P"]);
        assert_eq!(rows[0].away_wins, 1);
    }

    #[test]
    fn ignores_unfinished_and_foreign_matches() {
        let mut live = played("A", "B", 0, 3);
        live.status = MatchStatus::Live;
        let foreign = played("A", "Z", 0, 3);
        let rows = rank_group(&teams(&["B", "A"]), &[live, foreign]);
        assert_eq!(ids(&rows), ["A", "B"]);
        assert!(rows.iter().all(|r| r.played == 0));
    }

    #[test]
    fn ranking_is_deterministic() {
        let matches = [
            played("A", "B", 2, 2),
            played("C", "D", 1, 1),
            played("A", "C", 0, 0),
            played("B", "D", 3, 3),
        ];
        let first = rank_group(&teams(&["D", "C", "B", "A"]), &matches);
        let second = rank_group(&teams(&["A", "B", "C", "D"]), &matches);
        assert_eq!(first, second);
    }
}
