//! Integration tests for bracket generation and outcome propagation.

mod common;

use common::{at, finish, play_group_stage, start_date, tournament, TOURNAMENT};
use std::collections::HashSet;
use tournament_engine::{
    cascade_outcome, generate_bracket, generate_round_robin, propagate_outcome, update_match,
    GameMatch, MatchStatus, MatchUpdate, MemoryStore, PlayoffOptions, RoundRobinOptions,
    SchedulingOptions, SourceKind, StageKind, Store, TeamSlot, TournamentError,
};
use uuid::Uuid;

fn schedule() -> SchedulingOptions {
    SchedulingOptions::starting(start_date())
}

/// Tournament with `groups` groups of four, group stage generated and fully played.
fn played_tournament(groups: &[&str]) -> MemoryStore {
    let sizes: Vec<(&str, usize)> = groups.iter().map(|g| (*g, 4)).collect();
    let mut store = tournament(&sizes);
    generate_round_robin(&mut store, TOURNAMENT, &RoundRobinOptions::new(schedule())).unwrap();
    play_group_stage(&mut store);
    store
}

fn bracket(store: &mut MemoryStore, with_third_place: bool) -> Vec<GameMatch> {
    let mut opts = schedule();
    opts.with_third_place = with_third_place;
    generate_bracket(store, TOURNAMENT, &PlayoffOptions::new(opts)).unwrap()
}

fn reload(store: &MemoryStore, m: &GameMatch) -> GameMatch {
    store.get_match(m.id).unwrap()
}

#[test]
fn two_groups_make_semis_final_and_third_place() {
    let mut store = played_tournament(&["A", "B"]);
    let matches = bracket(&mut store, true);
    assert_eq!(matches.len(), 4);

    let (semi1, semi2) = (at(&matches, 2, 1), at(&matches, 2, 2));
    assert_eq!(semi1.home, TeamSlot::team("A1"));
    assert_eq!(semi1.away, TeamSlot::team("B2"));
    assert_eq!(semi2.home, TeamSlot::team("B1"));
    assert_eq!(semi2.away, TeamSlot::team("A2"));

    let final_match = at(&matches, 1, 1);
    let third_place = at(&matches, 1, 2);
    assert_eq!(final_match.home, TeamSlot::sourced(SourceKind::Winner, semi1.id));
    assert_eq!(final_match.away, TeamSlot::sourced(SourceKind::Winner, semi2.id));
    assert_eq!(third_place.home, TeamSlot::sourced(SourceKind::Loser, semi1.id));
    assert_eq!(third_place.away, TeamSlot::sourced(SourceKind::Loser, semi2.id));
    assert!(third_place.date < final_match.date);

    let finals: Vec<_> = matches
        .iter()
        .filter(|m| m.round == Some(1) && m.index == Some(1))
        .collect();
    assert_eq!(finals.len(), 1);
}

#[test]
fn match_counts_follow_bracket_size() {
    for (groups, third) in [(&["A", "B"][..], false), (&["A", "B", "C", "D"][..], true)] {
        let mut store = played_tournament(groups);
        let k = groups.len() * 2;
        let matches = bracket(&mut store, third);
        let expected = if third { k } else { k - 1 };
        assert_eq!(matches.len(), expected, "{} groups", groups.len());

        let kickoffs: HashSet<_> = matches.iter().map(|m| m.date).collect();
        assert_eq!(kickoffs.len(), matches.len());
        assert!(matches.iter().all(|m| m.group_id.is_none()));
    }
}

#[test]
fn later_rounds_move_by_day_interval() {
    let mut store = played_tournament(&["A", "B", "C", "D"]);
    let mut opts = schedule();
    opts.round_in_single_day = false;
    opts.day_interval = Some(2);
    let matches = generate_bracket(&mut store, TOURNAMENT, &PlayoffOptions::new(opts)).unwrap();

    assert_eq!(matches[0].round, Some(3));
    assert_eq!(matches[0].date.date(), start_date());
    let final_day = at(&matches, 1, 1).date.date();
    assert_eq!((final_day - start_date()).num_days(), 4);
}

#[test]
fn playoff_stage_is_created_after_group_stage() {
    let mut store = played_tournament(&["A", "B"]);
    let mut opts = PlayoffOptions::new(schedule());
    opts.stage_name = Some("Knockout".into());
    generate_bracket(&mut store, TOURNAMENT, &opts).unwrap();

    let stages = store.stages(TOURNAMENT);
    assert_eq!(stages.len(), 2);
    assert_eq!(stages[1].kind, StageKind::Playoff);
    assert_eq!(stages[1].name, "Knockout");
    assert_eq!(stages[1].order, 2);
}

#[test]
fn regenerating_requires_clear_existing() {
    let mut store = played_tournament(&["A", "B"]);
    bracket(&mut store, true);
    let err = generate_bracket(&mut store, TOURNAMENT, &PlayoffOptions::new(schedule()));
    assert!(matches!(err, Err(TournamentError::DuplicateRoundIndex { .. })));

    let mut opts = schedule();
    opts.clear_existing = true;
    let matches = generate_bracket(&mut store, TOURNAMENT, &PlayoffOptions::new(opts)).unwrap();
    assert_eq!(matches.len(), 4);
    assert_eq!(store.stages(TOURNAMENT).len(), 2);
}

#[test]
fn bracket_preconditions() {
    let mut store = tournament(&[]);
    assert_eq!(
        generate_bracket(&mut store, TOURNAMENT, &PlayoffOptions::new(schedule())),
        Err(TournamentError::NoGroups)
    );

    let mut store = tournament(&[("A", 4), ("B", 4)]);
    generate_round_robin(&mut store, TOURNAMENT, &RoundRobinOptions::new(schedule())).unwrap();
    assert_eq!(
        generate_bracket(&mut store, TOURNAMENT, &PlayoffOptions::new(schedule())),
        Err(TournamentError::UnfinishedGroupMatches { remaining: 12 })
    );

    let mut store = played_tournament(&["A", "B", "C"]);
    assert_eq!(
        generate_bracket(&mut store, TOURNAMENT, &PlayoffOptions::new(schedule())),
        Err(TournamentError::OddGroupCount { groups: 3 })
    );
    assert_eq!(store.stages(TOURNAMENT).len(), 1);

    let mut store = tournament(&[("A", 1)]);
    assert_eq!(
        generate_bracket(&mut store, TOURNAMENT, &PlayoffOptions::new(schedule())),
        Err(TournamentError::NotEnoughQualified { found: 1 })
    );
}

#[test]
fn winner_and_loser_flow_forward_and_back() {
    let mut store = played_tournament(&["A", "B"]);
    let matches = bracket(&mut store, true);
    let (semi1, final_match, third_place) =
        (at(&matches, 2, 1), at(&matches, 1, 1), at(&matches, 1, 2));

    finish(&mut store, &semi1, 3, 1);
    assert_eq!(reload(&store, &final_match).home_team().map(String::as_str), Some("A1"));
    assert_eq!(reload(&store, &third_place).home_team().map(String::as_str), Some("B2"));
    assert_eq!(reload(&store, &final_match).away_team(), None);

    // Correcting the score flips the sides.
    finish(&mut store, &semi1, 0, 2);
    assert_eq!(reload(&store, &final_match).home_team().map(String::as_str), Some("B2"));
    assert_eq!(reload(&store, &third_place).home_team().map(String::as_str), Some("A1"));

    // Reopening clears them.
    let reopened = MatchUpdate {
        status: Some(MatchStatus::Live),
        ..Default::default()
    };
    update_match(&mut store, semi1.id, reopened).unwrap();
    assert_eq!(reload(&store, &final_match).home_team(), None);
    assert_eq!(reload(&store, &third_place).home_team(), None);
}

#[test]
fn draw_leaves_dependents_unresolved() {
    let mut store = played_tournament(&["A", "B"]);
    let matches = bracket(&mut store, true);
    let (semi1, final_match) = (at(&matches, 2, 1), at(&matches, 1, 1));

    finish(&mut store, &semi1, 1, 0);
    finish(&mut store, &semi1, 1, 1);
    assert_eq!(reload(&store, &final_match).home_team(), None);
    assert_eq!(reload(&store, &at(&matches, 1, 2)).home_team(), None);
}

#[test]
fn propagation_is_idempotent_and_ignores_unknown_matches() {
    let mut store = played_tournament(&["A", "B"]);
    let matches = bracket(&mut store, true);
    let (semi2, final_match) = (at(&matches, 2, 2), at(&matches, 1, 1));

    finish(&mut store, &semi2, 2, 0);
    let before = reload(&store, &final_match);
    propagate_outcome(&mut store, semi2.id).unwrap();
    propagate_outcome(&mut store, semi2.id).unwrap();
    assert_eq!(reload(&store, &final_match), before);
    assert_eq!(before.away_team().map(String::as_str), Some("B1"));

    propagate_outcome(&mut store, Uuid::new_v4()).unwrap();
}

#[test]
fn cascade_clears_several_rounds() {
    let mut store = played_tournament(&["A", "B", "C", "D"]);
    let matches = bracket(&mut store, true);
    let (qf1, qf2) = (at(&matches, 3, 1), at(&matches, 3, 2));
    let (semi1, final_match, third_place) =
        (at(&matches, 2, 1), at(&matches, 1, 1), at(&matches, 1, 2));

    finish(&mut store, &qf1, 1, 0);
    finish(&mut store, &qf2, 1, 0);
    let semi1 = reload(&store, &semi1);
    assert!(semi1.home_team().is_some() && semi1.away_team().is_some());
    finish(&mut store, &semi1, 2, 1);
    assert!(reload(&store, &final_match).home_team().is_some());

    // Reopen the quarter-final without propagating, then cascade from it.
    let mut reopened = reload(&store, &qf1);
    reopened.status = MatchStatus::Scheduled;
    store.update_match(reopened).unwrap();
    let touched = cascade_outcome(&mut store, qf1.id).unwrap();

    assert_eq!(touched[0], semi1.id);
    assert!(touched.contains(&final_match.id));
    assert!(touched.contains(&third_place.id));
    assert_eq!(reload(&store, &semi1).home_team(), None);
    assert_eq!(reload(&store, &final_match).home_team(), None);
    assert_eq!(reload(&store, &third_place).home_team(), None);
}

#[test]
fn updating_unknown_match_is_not_found() {
    let mut store = MemoryStore::new();
    let id = Uuid::new_v4();
    assert_eq!(
        update_match(&mut store, id, MatchUpdate::default()),
        Err(TournamentError::MatchNotFound(id))
    );
}
