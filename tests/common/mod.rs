//! Shared fixtures: an in-memory tournament with a group stage.

#![allow(dead_code)]

use chrono::NaiveDate;
use tournament_engine::{
    update_match, GameMatch, Group, MatchStatus, MatchUpdate, MemoryStore, Score, Stage,
    StageKind, Store, Tournament,
};

pub const TOURNAMENT: &str = "T1";
pub const GROUP_STAGE: &str = "GS";

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
}

/// Teams of group `name` are `{name}1`..`{name}{size}`.
pub fn teams(name: &str, size: usize) -> Vec<String> {
    (1..=size).map(|i| format!("{name}{i}")).collect()
}

/// Tournament `T1` with a group stage and one group per `(name, size)`.
pub fn tournament(groups: &[(&str, usize)]) -> MemoryStore {
    let mut store = MemoryStore::new();
    store.add_tournament(Tournament::new(TOURNAMENT, "Spring Cup"));
    store
        .insert_stage(Stage::new(GROUP_STAGE, TOURNAMENT, StageKind::Group, "Group stage", 1))
        .unwrap();
    for (name, size) in groups {
        store.add_group(Group::new(*name, TOURNAMENT, *name, teams(name, *size)));
    }
    store
}

pub fn finish(store: &mut MemoryStore, m: &GameMatch, home: u32, away: u32) -> GameMatch {
    update_match(
        store,
        m.id,
        MatchUpdate {
            status: Some(MatchStatus::Finished),
            score: Some(Score {
                home: Some(home),
                away: Some(away),
            }),
            ..Default::default()
        },
    )
    .unwrap()
}

/// Finish every group fixture; the team with the lower id wins 2-0.
pub fn play_group_stage(store: &mut MemoryStore) {
    for m in store.matches_in_stage(GROUP_STAGE) {
        let home_wins = m.home_team() < m.away_team();
        let (h, a) = if home_wins { (2, 0) } else { (0, 2) };
        finish(store, &m, h, a);
    }
}

pub fn at(matches: &[GameMatch], round: u32, index: u32) -> GameMatch {
    matches
        .iter()
        .find(|m| m.round == Some(round) && m.index == Some(index))
        .cloned()
        .unwrap_or_else(|| panic!("no match at round {round} index {index}"))
}
