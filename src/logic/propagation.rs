//! Outcome propagation: thread winners and losers into the bracket matches that wait on them.
//!
//! A match whose outcome is known fills every slot that takes its winner or loser. A match
//! without a known outcome (not finished, draw, missing score) clears those slots instead, so
//! reopening or correcting a result un-resolves the later rounds. Re-running on the same state
//! changes nothing.

use crate::models::{GameMatch, MatchId, MatchUpdate, Side, SourceKind, TournamentError};
use crate::store::Store;
use std::collections::{HashSet, VecDeque};

/// Every way one match can feed another.
const FEEDS: [(SourceKind, Side); 4] = [
    (SourceKind::Winner, Side::Home),
    (SourceKind::Winner, Side::Away),
    (SourceKind::Loser, Side::Home),
    (SourceKind::Loser, Side::Away),
];

/// Fill or clear the slots fed by `source`. Returns the matches that changed.
fn apply_outcome<S: Store>(store: &mut S, source: &GameMatch) -> Vec<MatchId> {
    let outcome = source.outcome();
    let mut changed = Vec::new();
    for (kind, side) in FEEDS {
        let team = outcome.as_ref().map(|o| o.team_for(kind));
        changed.extend(store.assign_sourced_team(source.id, kind, side, team));
    }
    match &outcome {
        Some(o) => log::debug!(
            "Match {}: winner {}, loser {}; {} dependent match(es) updated",
            source.id,
            o.winner,
            o.loser,
            changed.len()
        ),
        None => log::debug!(
            "Match {} has no outcome; {} dependent match(es) cleared",
            source.id,
            changed.len()
        ),
    }
    changed
}

/// Propagate the current result of `match_id` one hop forward. A missing match is a no-op.
pub fn propagate_outcome<S: Store>(store: &mut S, match_id: MatchId) -> Result<(), TournamentError> {
    let Some(source) = store.get_match(match_id) else {
        log::debug!("Match {} not found, nothing to propagate", match_id);
        return Ok(());
    };
    store.transaction(|tx| {
        apply_outcome(tx, &source);
        Ok(())
    })
}

/// Propagate `match_id` and keep going through every match whose teams changed as a result,
/// breadth-first. Returns the changed matches in the order they were reached.
pub fn cascade_outcome<S: Store>(
    store: &mut S,
    match_id: MatchId,
) -> Result<Vec<MatchId>, TournamentError> {
    store.transaction(|tx| {
        let mut queue = VecDeque::from([match_id]);
        let mut visited = HashSet::new();
        let mut touched = Vec::new();
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            let Some(m) = tx.get_match(id) else {
                continue;
            };
            for changed in apply_outcome(tx, &m) {
                if !touched.contains(&changed) {
                    touched.push(changed);
                }
                queue.push_back(changed);
            }
        }
        Ok(touched)
    })
}

/// Apply an edit to a match and propagate its outcome, in one transaction.
pub fn update_match<S: Store>(
    store: &mut S,
    match_id: MatchId,
    update: MatchUpdate,
) -> Result<GameMatch, TournamentError> {
    store.transaction(|tx| {
        let mut m = tx
            .get_match(match_id)
            .ok_or(TournamentError::MatchNotFound(match_id))?;
        update.apply_to(&mut m);
        tx.update_match(m.clone())?;
        apply_outcome(tx, &m);
        Ok(m)
    })
}
