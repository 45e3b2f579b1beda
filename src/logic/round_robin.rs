//! Group stage: round-robin fixture generation (circle / Berger method).

use crate::logic::slots::{SlotAllocator, ROUND_ROBIN_DEFAULTS};
use crate::models::{
    GameMatch, Group, MatchId, RoundRobinOptions, StageKind, TeamId, TeamSlot, TournamentError,
};
use crate::store::{stage_of_kind, Store};
use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::HashMap;

/// One fixture of a round, before it gets a time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pairing {
    pub home: TeamId,
    pub away: TeamId,
}

/// Result of `generate_round_robin`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct RoundRobinSummary {
    pub created: usize,
}

/// Hands out the next free index per round number, so `(stage, round, index)` stays unique.
#[derive(Clone, Debug, Default)]
pub(crate) struct RoundIndexCounter {
    last: HashMap<u32, u32>,
}

impl RoundIndexCounter {
    /// Continue after the highest index each round already has among `existing`.
    pub(crate) fn seeded(existing: &[GameMatch]) -> Self {
        let mut last: HashMap<u32, u32> = HashMap::new();
        for m in existing {
            if let (Some(round), Some(index)) = (m.round, m.index) {
                let top = last.entry(round).or_insert(0);
                *top = (*top).max(index);
            }
        }
        Self { last }
    }

    pub(crate) fn next(&mut self, round: u32) -> u32 {
        let last = self.last.entry(round).or_insert(0);
        *last += 1;
        *last
    }
}

/// Pairing rounds for one group.
///
/// One team stays fixed while the others rotate around it for `n - 1` rounds; with an odd
/// number of teams a bye is added and its pairings are left out. Venues alternate by round.
/// `double_round` appends a second leg with home and away swapped.
pub fn berger_rounds(teams: &[TeamId], double_round: bool) -> Vec<Vec<Pairing>> {
    let mut table: Vec<Option<&TeamId>> = teams.iter().map(Some).collect();
    if table.len() % 2 == 1 {
        table.push(None);
    }
    let n = table.len();
    if n < 2 {
        return Vec::new();
    }

    let mut rounds = Vec::with_capacity(n - 1);
    for r in 0..n - 1 {
        let home_first = r % 2 == 0;
        let round: Vec<Pairing> = (0..n / 2)
            .filter_map(|i| {
                let (a, b) = (table[i]?, table[n - 1 - i]?);
                let (home, away) = if home_first { (a, b) } else { (b, a) };
                Some(Pairing {
                    home: home.clone(),
                    away: away.clone(),
                })
            })
            .collect();
        rounds.push(round);
        table[1..].rotate_right(1);
    }

    if double_round {
        let second_leg: Vec<Vec<Pairing>> = rounds
            .iter()
            .map(|round| {
                round
                    .iter()
                    .map(|p| Pairing {
                        home: p.away.clone(),
                        away: p.home.clone(),
                    })
                    .collect()
            })
            .collect();
        rounds.extend(second_leg);
    }
    rounds
}

/// Fail if a team appears in two of the given groups.
fn check_single_membership(groups: &[Group]) -> Result<(), TournamentError> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for g in groups {
        for team in &g.team_ids {
            match seen.get(team.as_str()) {
                Some(&first) if first != g.id => {
                    return Err(TournamentError::TeamInTwoGroups {
                        team: team.clone(),
                        first: first.to_string(),
                        second: g.id.clone(),
                    });
                }
                _ => {
                    seen.insert(team, &g.id);
                }
            }
        }
    }
    Ok(())
}

/// Generate the group stage fixtures of a tournament.
///
/// Round `r` of every selected group is scheduled before round `r + 1` of any group, so round
/// numbers mean the same matchday across groups. Runs as one transaction: on error nothing
/// (not even the optional clean-up) is persisted.
pub fn generate_round_robin<S: Store>(
    store: &mut S,
    tournament_id: &str,
    options: &RoundRobinOptions,
) -> Result<RoundRobinSummary, TournamentError> {
    if store.tournament(tournament_id).is_none() {
        return Err(TournamentError::TournamentNotFound(tournament_id.to_string()));
    }
    let stage = stage_of_kind(store, tournament_id, StageKind::Group)
        .ok_or(TournamentError::StageNotFound)?;

    let filter = options.group_filter();
    let groups: Vec<Group> = store
        .groups(tournament_id)
        .into_iter()
        .filter(|g| filter.map_or(true, |ids| ids.contains(&g.id)))
        .collect();
    if groups.is_empty() {
        log::info!("No groups to schedule in tournament {}", tournament_id);
        return Ok(RoundRobinSummary { created: 0 });
    }
    check_single_membership(&groups)?;
    if groups.iter().all(|g| g.team_ids.is_empty()) {
        return Err(TournamentError::NoTeamsAssigned);
    }

    let schedule = &options.schedule;
    let mut allocator = SlotAllocator::new(schedule, &ROUND_ROBIN_DEFAULTS)?;

    let mut rng = rand::thread_rng();
    let rounds_by_group: Vec<(&Group, Vec<Vec<Pairing>>)> = groups
        .iter()
        .map(|g| {
            let mut teams = g.team_ids.clone();
            if options.shuffle_teams {
                teams.shuffle(&mut rng);
            }
            (g, berger_rounds(&teams, options.double_round))
        })
        .collect();
    let max_rounds = rounds_by_group
        .iter()
        .map(|(_, rounds)| rounds.len())
        .max()
        .unwrap_or(0);

    let created = store.transaction(|tx| {
        if schedule.clear_existing {
            let stale: Vec<MatchId> = tx
                .matches_in_stage(&stage.id)
                .into_iter()
                .filter(|m| match filter {
                    Some(ids) => m.group_id.as_ref().is_some_and(|g| ids.contains(g)),
                    None => true,
                })
                .map(|m| m.id)
                .collect();
            let removed = tx.delete_matches(&stale);
            log::info!("Cleared {} existing group fixture(s)", removed);
        }

        let mut indices = RoundIndexCounter::seeded(&tx.matches_in_stage(&stage.id));
        let mut round_day = schedule.start_date;
        let mut created: usize = 0;
        for r in 0..max_rounds {
            let round_no = r as u32 + 1;
            allocator.start_of_round(round_day);
            for (group, rounds) in &rounds_by_group {
                for pairing in rounds.get(r).into_iter().flatten() {
                    let slot = allocator.allocate()?;
                    let fixture = GameMatch::new(
                        stage.id.clone(),
                        round_no,
                        indices.next(round_no),
                        slot.starts_at(),
                        TeamSlot::team(pairing.home.clone()),
                        TeamSlot::team(pairing.away.clone()),
                    )
                    .in_group(group.id.clone());
                    log::debug!(
                        "Round {} ({}): {} vs {} at {}",
                        round_no,
                        group.name,
                        pairing.home,
                        pairing.away,
                        slot
                    );
                    tx.insert_match(fixture)?;
                    created += 1;
                }
            }
            round_day = allocator.next_round_day(round_day)?;
        }
        Ok(created)
    })?;

    log::info!(
        "Generated {} group fixture(s) over {} round(s) for tournament {}",
        created,
        max_rounds,
        tournament_id
    );
    Ok(RoundRobinSummary { created })
}
