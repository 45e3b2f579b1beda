//! Tournament, its groups and stages, and the engine's error type.

use crate::models::game::MatchId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Unique identifier for a tournament.
pub type TournamentId = String;
/// Unique identifier for a team (owned by the team registry).
pub type TeamId = String;
pub type GroupId = String;
pub type StageId = String;

/// Coarse error category, used by callers to pick a response status.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Conflict,
}

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),
    #[error("Stage not found")]
    StageNotFound,
    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),
    #[error("Tournament has no groups")]
    NoGroups,
    #[error("No team is assigned to any of the selected groups")]
    NoTeamsAssigned,
    #[error("Team {team} is in group {first} and also in {second}; a team may belong to one group only")]
    TeamInTwoGroups {
        team: TeamId,
        first: GroupId,
        second: GroupId,
    },
    #[error("Finish all group matches first ({remaining} remaining)")]
    UnfinishedGroupMatches { remaining: usize },
    #[error("Not enough teams for the playoffs (found {found})")]
    NotEnoughQualified { found: usize },
    #[error("Number of groups must be even to build a bracket without byes (got {groups})")]
    OddGroupCount { groups: usize },
    #[error("Could not build first round pairs")]
    EmptyFirstRound,
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
    #[error("No free time slot left on {date}")]
    SlotsExhausted { date: NaiveDate },
    #[error("Stage {stage} already has a match at round {round}, index {index}")]
    DuplicateRoundIndex {
        stage: StageId,
        round: u32,
        index: u32,
    },
}

impl TournamentError {
    pub fn kind(&self) -> ErrorKind {
        use TournamentError::*;
        match self {
            TournamentNotFound(_) | StageNotFound | MatchNotFound(_) => ErrorKind::NotFound,
            DuplicateRoundIndex { .. } => ErrorKind::Conflict,
            NoGroups
            | NoTeamsAssigned
            | TeamInTwoGroups { .. }
            | UnfinishedGroupMatches { .. }
            | NotEnoughQualified { .. }
            | OddGroupCount { .. }
            | EmptyFirstRound
            | InvalidOptions(_)
            | SlotsExhausted { .. } => ErrorKind::BadRequest,
        }
    }
}

/// Tournament metadata the engine needs; the rest lives with the tournament registry.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
}

impl Tournament {
    pub fn new(id: impl Into<TournamentId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A group of teams playing each other in the group stage.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub tournament_id: TournamentId,
    pub name: String,
    /// Member teams in registration order.
    pub team_ids: Vec<TeamId>,
}

impl Group {
    pub fn new(
        id: impl Into<GroupId>,
        tournament_id: impl Into<TournamentId>,
        name: impl Into<String>,
        team_ids: Vec<TeamId>,
    ) -> Self {
        Self {
            id: id.into(),
            tournament_id: tournament_id.into(),
            name: name.into(),
            team_ids,
        }
    }
}

/// Phase of the tournament a stage represents.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageKind {
    Group,
    Playoff,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: StageId,
    pub tournament_id: TournamentId,
    pub kind: StageKind,
    pub name: String,
    pub order: u32,
}

impl Stage {
    pub fn new(
        id: impl Into<StageId>,
        tournament_id: impl Into<TournamentId>,
        kind: StageKind,
        name: impl Into<String>,
        order: u32,
    ) -> Self {
        Self {
            id: id.into(),
            tournament_id: tournament_id.into(),
            kind,
            name: name.into(),
            order,
        }
    }
}
