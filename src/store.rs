//! Persistence seam: what the engine reads and writes, plus an in-memory store.
//!
//! The engine only talks to [`Store`]. Every generation or propagation runs inside
//! [`Store::transaction`], so a failure halfway leaves no partial writes behind.

use crate::models::{
    GameMatch, Group, MatchId, Side, SourceKind, Stage, StageKind, TeamId, Tournament,
    TournamentError,
};
use std::collections::HashMap;

/// Read/write access to tournaments, groups, stages and matches.
pub trait Store {
    fn tournament(&self, id: &str) -> Option<Tournament>;

    /// Groups of a tournament, ordered by name.
    fn groups(&self, tournament_id: &str) -> Vec<Group>;

    /// Stages of a tournament, ordered by `order`.
    fn stages(&self, tournament_id: &str) -> Vec<Stage>;

    fn insert_stage(&mut self, stage: Stage) -> Result<Stage, TournamentError>;

    fn get_match(&self, id: MatchId) -> Option<GameMatch>;

    /// Matches of a stage in insertion order.
    fn matches_in_stage(&self, stage_id: &str) -> Vec<GameMatch>;

    /// Insert a match. Fails with `DuplicateRoundIndex` if `(stage, round, index)` is taken.
    fn insert_match(&mut self, m: GameMatch) -> Result<GameMatch, TournamentError>;

    /// Replace a stored match (matched by id).
    fn update_match(&mut self, m: GameMatch) -> Result<(), TournamentError>;

    /// Delete matches (and with them their events). Returns how many existed.
    fn delete_matches(&mut self, ids: &[MatchId]) -> usize;

    /// For every match whose `side` slot takes `kind` of `source`, set that slot's team.
    /// Returns the ids of matches that actually changed.
    fn assign_sourced_team(
        &mut self,
        source: MatchId,
        kind: SourceKind,
        side: Side,
        team: Option<&TeamId>,
    ) -> Vec<MatchId>;

    /// Run `f` all-or-nothing: if it fails, every write it made is undone.
    fn transaction<T, F>(&mut self, f: F) -> Result<T, TournamentError>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T, TournamentError>;
}

/// The canonical stage of `kind` (lowest `order`), if any.
pub fn stage_of_kind<S: Store>(store: &S, tournament_id: &str, kind: StageKind) -> Option<Stage> {
    store
        .stages(tournament_id)
        .into_iter()
        .find(|s| s.kind == kind)
}

/// In-memory [`Store`]. Transactions snapshot the whole store and restore it on error.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tournaments: HashMap<String, Tournament>,
    groups: Vec<Group>,
    stages: Vec<Stage>,
    matches: Vec<GameMatch>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tournament(&mut self, tournament: Tournament) {
        self.tournaments.insert(tournament.id.clone(), tournament);
    }

    /// Add a group, replacing one with the same id in the same tournament.
    pub fn add_group(&mut self, group: Group) {
        self.groups
            .retain(|g| g.tournament_id != group.tournament_id || g.id != group.id);
        self.groups.push(group);
    }

    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Delete a single match. `MatchNotFound` if it doesn't exist.
    pub fn delete_match(&mut self, id: MatchId) -> Result<(), TournamentError> {
        if self.delete_matches(&[id]) == 0 {
            return Err(TournamentError::MatchNotFound(id));
        }
        Ok(())
    }

    fn slot_taken(&self, m: &GameMatch) -> bool {
        let (Some(round), Some(index)) = (m.round, m.index) else {
            return false;
        };
        self.matches.iter().any(|o| {
            o.id != m.id && o.stage_id == m.stage_id && o.round == Some(round) && o.index == Some(index)
        })
    }

    fn duplicate(m: &GameMatch) -> TournamentError {
        TournamentError::DuplicateRoundIndex {
            stage: m.stage_id.clone(),
            round: m.round.unwrap_or_default(),
            index: m.index.unwrap_or_default(),
        }
    }
}

impl Store for MemoryStore {
    fn tournament(&self, id: &str) -> Option<Tournament> {
        self.tournaments.get(id).cloned()
    }

    fn groups(&self, tournament_id: &str) -> Vec<Group> {
        let mut groups: Vec<Group> = self
            .groups
            .iter()
            .filter(|g| g.tournament_id == tournament_id)
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        groups
    }

    fn stages(&self, tournament_id: &str) -> Vec<Stage> {
        let mut stages: Vec<Stage> = self
            .stages
            .iter()
            .filter(|s| s.tournament_id == tournament_id)
            .cloned()
            .collect();
        stages.sort_by_key(|s| s.order);
        stages
    }

    fn insert_stage(&mut self, stage: Stage) -> Result<Stage, TournamentError> {
        self.stages.retain(|s| s.id != stage.id);
        self.stages.push(stage.clone());
        Ok(stage)
    }

    fn get_match(&self, id: MatchId) -> Option<GameMatch> {
        self.matches.iter().find(|m| m.id == id).cloned()
    }

    fn matches_in_stage(&self, stage_id: &str) -> Vec<GameMatch> {
        self.matches
            .iter()
            .filter(|m| m.stage_id == stage_id)
            .cloned()
            .collect()
    }

    fn insert_match(&mut self, m: GameMatch) -> Result<GameMatch, TournamentError> {
        if self.slot_taken(&m) {
            return Err(Self::duplicate(&m));
        }
        self.matches.push(m.clone());
        Ok(m)
    }

    fn update_match(&mut self, m: GameMatch) -> Result<(), TournamentError> {
        if self.slot_taken(&m) {
            return Err(Self::duplicate(&m));
        }
        let stored = self
            .matches
            .iter_mut()
            .find(|x| x.id == m.id)
            .ok_or(TournamentError::MatchNotFound(m.id))?;
        *stored = m;
        Ok(())
    }

    fn delete_matches(&mut self, ids: &[MatchId]) -> usize {
        let before = self.matches.len();
        self.matches.retain(|m| !ids.contains(&m.id));
        before - self.matches.len()
    }

    fn assign_sourced_team(
        &mut self,
        source: MatchId,
        kind: SourceKind,
        side: Side,
        team: Option<&TeamId>,
    ) -> Vec<MatchId> {
        let mut changed = Vec::new();
        for m in &mut self.matches {
            let slot = m.slot_mut(side);
            if slot.is_fed_by(kind, source) && slot.resolve(team.cloned()) {
                changed.push(m.id);
            }
        }
        changed
    }

    fn transaction<T, F>(&mut self, f: F) -> Result<T, TournamentError>
    where
        F: FnOnce(&mut Self) -> Result<T, TournamentError>,
    {
        let snapshot = self.clone();
        let result = f(self);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }
}
