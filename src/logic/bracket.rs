//! Playoffs: single-elimination bracket seeded from the group standings.
//!
//! Rounds count down: the first playoff round is `ceil(log2(teams))`, the final is round 1.
//! Every match after the first round takes its teams by reference, as the winners (or, for
//! the third-place match, the losers) of two earlier matches.

use crate::logic::round_robin::{Pairing, RoundIndexCounter};
use crate::logic::slots::{SlotAllocator, PLAYOFF_DEFAULTS};
use crate::logic::standings::qualified_teams;
use crate::models::{
    GameMatch, GroupId, MatchId, MatchStatus, PlayoffOptions, QualifiedTeam, SchedulingOptions,
    SourceKind, Stage, StageKind, TeamSlot, TournamentError,
};
use crate::store::{stage_of_kind, Store};
use uuid::Uuid;

const DEFAULT_STAGE_NAME: &str = "Playoffs";

/// Number of rounds a bracket of `teams` needs (`ceil(log2(teams))`).
pub fn rounds_needed(teams: usize) -> u32 {
    teams.next_power_of_two().trailing_zeros()
}

fn find(qualified: &[QualifiedTeam], group: &str, place: u8) -> Option<String> {
    qualified
        .iter()
        .find(|q| q.group == group && q.place == place)
        .map(|q| q.team_id.clone())
}

/// First round pairs from the qualifiers.
///
/// One group: its winner plays the runner-up. Otherwise groups are taken in adjacent pairs
/// `(g1, g2)`: winner of g1 meets runner-up of g2 in the left half, winner of g2 meets
/// runner-up of g1 in the right half. Needs an even number of groups.
pub fn first_round_pairs(
    groups: &[GroupId],
    qualified: &[QualifiedTeam],
) -> Result<Vec<Pairing>, TournamentError> {
    match groups {
        [] => Ok(Vec::new()),
        [only] => Ok(find(qualified, only, 1)
            .zip(find(qualified, only, 2))
            .map(|(home, away)| Pairing { home, away })
            .into_iter()
            .collect()),
        _ if groups.len() % 2 != 0 => Err(TournamentError::OddGroupCount {
            groups: groups.len(),
        }),
        _ => {
            let mut left = Vec::new();
            let mut right = Vec::new();
            for pair in groups.chunks_exact(2) {
                let (g1, g2) = (&pair[0], &pair[1]);
                if let (Some(home), Some(away)) = (find(qualified, g1, 1), find(qualified, g2, 2)) {
                    left.push(Pairing { home, away });
                }
                if let (Some(home), Some(away)) = (find(qualified, g2, 1), find(qualified, g1, 2)) {
                    right.push(Pairing { home, away });
                }
            }
            left.append(&mut right);
            Ok(left)
        }
    }
}

/// The tournament's playoff stage, created after the last existing stage if missing.
fn ensure_playoff_stage<S: Store>(
    store: &mut S,
    tournament_id: &str,
    name: &str,
) -> Result<Stage, TournamentError> {
    if let Some(existing) = stage_of_kind(store, tournament_id, StageKind::Playoff) {
        return Ok(existing);
    }
    let order = store
        .stages(tournament_id)
        .iter()
        .map(|s| s.order)
        .max()
        .unwrap_or(0)
        + 1;
    log::info!("Creating playoff stage {:?} (order {})", name, order);
    store.insert_stage(Stage::new(
        Uuid::new_v4().to_string(),
        tournament_id,
        StageKind::Playoff,
        name,
        order,
    ))
}

fn count_unfinished_group_matches<S: Store>(store: &S, tournament_id: &str) -> usize {
    store
        .stages(tournament_id)
        .iter()
        .flat_map(|s| store.matches_in_stage(&s.id))
        .filter(|m| m.group_id.is_some() && m.status != MatchStatus::Finished)
        .count()
}

/// Persist the whole tree: first round with concrete teams, later rounds by reference.
fn build_tree<S: Store>(
    store: &mut S,
    stage_id: &str,
    pairs: &[Pairing],
    schedule: &SchedulingOptions,
    allocator: &mut SlotAllocator,
) -> Result<(), TournamentError> {
    let first_round = rounds_needed(pairs.len() * 2);
    let mut indices = RoundIndexCounter::default();
    let mut round_day = schedule.start_date;
    allocator.start_of_round(round_day);

    let mut previous: Vec<MatchId> = Vec::with_capacity(pairs.len());
    for p in pairs {
        let slot = allocator.allocate()?;
        let m = GameMatch::new(
            stage_id,
            first_round,
            indices.next(first_round),
            slot.starts_at(),
            TeamSlot::team(p.home.clone()),
            TeamSlot::team(p.away.clone()),
        );
        log::debug!("Round {}: {} vs {} at {}", first_round, p.home, p.away, slot);
        previous.push(store.insert_match(m)?.id);
    }

    for round in (1..first_round).rev() {
        if !schedule.round_in_single_day {
            round_day = allocator.next_round_day(round_day)?;
            allocator.start_of_round(round_day);
        }

        let semi_finals = match previous.as_slice() {
            &[left, right] if round == 1 && schedule.with_third_place => Some((left, right)),
            _ => None,
        };
        if let Some((left, right)) = semi_finals {
            let (a, b) = (allocator.allocate()?, allocator.allocate()?);
            let (early, late) = if a <= b { (a, b) } else { (b, a) };
            let final_match = GameMatch::new(
                stage_id,
                1,
                1,
                late.starts_at(),
                TeamSlot::sourced(SourceKind::Winner, left),
                TeamSlot::sourced(SourceKind::Winner, right),
            );
            let third_place = GameMatch::new(
                stage_id,
                1,
                2,
                early.starts_at(),
                TeamSlot::sourced(SourceKind::Loser, left),
                TeamSlot::sourced(SourceKind::Loser, right),
            );
            log::debug!("Final at {}, third place at {}", late, early);
            let final_id = store.insert_match(final_match)?.id;
            store.insert_match(third_place)?;
            previous = vec![final_id];
            continue;
        }

        let mut next = Vec::with_capacity(previous.len().div_ceil(2));
        for feeders in previous.chunks(2) {
            let slot = allocator.allocate()?;
            let away = match feeders.get(1) {
                Some(&id) => TeamSlot::sourced(SourceKind::Winner, id),
                None => TeamSlot::Empty,
            };
            let m = GameMatch::new(
                stage_id,
                round,
                indices.next(round),
                slot.starts_at(),
                TeamSlot::sourced(SourceKind::Winner, feeders[0]),
                away,
            );
            log::debug!("Round {} match {:?} at {}", round, m.index, slot);
            next.push(store.insert_match(m)?.id);
        }
        previous = next;
    }
    Ok(())
}

/// Generate the playoff bracket of a tournament from its final group standings.
///
/// Returns every match of the playoff stage, round descending then index ascending.
/// Runs as one transaction: on error nothing is persisted.
pub fn generate_bracket<S: Store>(
    store: &mut S,
    tournament_id: &str,
    options: &PlayoffOptions,
) -> Result<Vec<GameMatch>, TournamentError> {
    if store.tournament(tournament_id).is_none() {
        return Err(TournamentError::TournamentNotFound(tournament_id.to_string()));
    }
    let groups: Vec<GroupId> = store.groups(tournament_id).into_iter().map(|g| g.id).collect();
    if groups.is_empty() {
        return Err(TournamentError::NoGroups);
    }
    let remaining = count_unfinished_group_matches(store, tournament_id);
    if remaining > 0 {
        return Err(TournamentError::UnfinishedGroupMatches { remaining });
    }
    let qualified = qualified_teams(store, tournament_id);
    if qualified.len() < 2 {
        return Err(TournamentError::NotEnoughQualified {
            found: qualified.len(),
        });
    }
    let pairs = first_round_pairs(&groups, &qualified)?;
    if pairs.is_empty() {
        return Err(TournamentError::EmptyFirstRound);
    }

    let schedule = &options.schedule;
    let mut allocator = SlotAllocator::new(schedule, &PLAYOFF_DEFAULTS)?;
    let stage_name = options.stage_name.as_deref().unwrap_or(DEFAULT_STAGE_NAME);

    let bracket = store.transaction(|tx| {
        let stage = ensure_playoff_stage(tx, tournament_id, stage_name)?;
        if schedule.clear_existing {
            let stale: Vec<MatchId> = tx.matches_in_stage(&stage.id).iter().map(|m| m.id).collect();
            let removed = tx.delete_matches(&stale);
            log::info!("Cleared {} existing playoff match(es)", removed);
        }
        build_tree(tx, &stage.id, &pairs, schedule, &mut allocator)?;
        let mut matches = tx.matches_in_stage(&stage.id);
        matches.sort_by(|a, b| b.round.cmp(&a.round).then(a.index.cmp(&b.index)));
        Ok(matches)
    })?;

    log::info!(
        "Generated playoff bracket for tournament {}: {} team(s), {} match(es)",
        tournament_id,
        pairs.len() * 2,
        bracket.len()
    );
    Ok(bracket)
}
