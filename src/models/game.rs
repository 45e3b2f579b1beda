//! Match, its team slots and events.

use crate::models::tournament::{GroupId, StageId, TeamId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Lifecycle of a match. `Finished` may be reverted by the match editor.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Live,
    Finished,
}

/// Home or away side of a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

/// Which result of a source match feeds a slot.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    Winner,
    Loser,
}

/// How one side of a match gets its team.
///
/// Group fixtures and first playoff round use `Team`. Later bracket rounds use
/// `Winner`/`Loser`, whose `team` is filled in (or cleared) by outcome propagation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamSlot {
    Team { team: TeamId },
    Winner { of: MatchId, team: Option<TeamId> },
    Loser { of: MatchId, team: Option<TeamId> },
    /// Bracket bye: nobody will ever fill this side.
    Empty,
}

impl TeamSlot {
    pub fn team(team: impl Into<TeamId>) -> Self {
        TeamSlot::Team { team: team.into() }
    }

    /// Unresolved slot fed by `kind` of match `of`.
    pub fn sourced(kind: SourceKind, of: MatchId) -> Self {
        match kind {
            SourceKind::Winner => TeamSlot::Winner { of, team: None },
            SourceKind::Loser => TeamSlot::Loser { of, team: None },
        }
    }

    /// The team currently occupying this slot, if known.
    pub fn team_id(&self) -> Option<&TeamId> {
        match self {
            TeamSlot::Team { team } => Some(team),
            TeamSlot::Winner { team, .. } | TeamSlot::Loser { team, .. } => team.as_ref(),
            TeamSlot::Empty => None,
        }
    }

    pub fn source(&self) -> Option<(SourceKind, MatchId)> {
        match self {
            TeamSlot::Winner { of, .. } => Some((SourceKind::Winner, *of)),
            TeamSlot::Loser { of, .. } => Some((SourceKind::Loser, *of)),
            TeamSlot::Team { .. } | TeamSlot::Empty => None,
        }
    }

    /// True if this slot takes `kind` of match `of`.
    pub fn is_fed_by(&self, kind: SourceKind, of: MatchId) -> bool {
        self.source() == Some((kind, of))
    }

    /// Set or clear the resolved team of a sourced slot. Returns whether anything changed.
    /// Fixed and empty slots are left alone.
    pub fn resolve(&mut self, resolved: Option<TeamId>) -> bool {
        match self {
            TeamSlot::Winner { team, .. } | TeamSlot::Loser { team, .. } => {
                if *team == resolved {
                    false
                } else {
                    *team = resolved;
                    true
                }
            }
            TeamSlot::Team { .. } | TeamSlot::Empty => false,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchEventKind {
    Goal,
    Assist,
    OwnGoal,
    Card,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardKind {
    Yellow,
    Red,
}

/// Something that happened during a match. Deleted together with its match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEvent {
    pub id: Uuid,
    pub minute: u32,
    #[serde(rename = "type")]
    pub kind: MatchEventKind,
    pub player_id: String,
    pub team_id: TeamId,
    /// Only meaningful for `Card` events.
    pub card: Option<CardKind>,
}

/// A new event to attach to a match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEventInput {
    pub minute: u32,
    #[serde(rename = "type")]
    pub kind: MatchEventKind,
    pub player_id: String,
    pub team_id: TeamId,
    #[serde(default)]
    pub card: Option<CardKind>,
}

impl MatchEventInput {
    pub fn into_event(self) -> MatchEvent {
        // A card kind only makes sense on a card event.
        let card = match self.kind {
            MatchEventKind::Card => self.card,
            _ => None,
        };
        MatchEvent {
            id: Uuid::new_v4(),
            minute: self.minute,
            kind: self.kind,
            player_id: self.player_id,
            team_id: self.team_id,
            card,
        }
    }
}

/// Both scores of a match; `None` clears a score.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

/// Edit applied by the match editor. Absent fields are left unchanged.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchUpdate {
    pub status: Option<MatchStatus>,
    pub score: Option<Score>,
    pub date: Option<NaiveDateTime>,
    pub events_append: Vec<MatchEventInput>,
    pub events_delete: Vec<Uuid>,
}

impl MatchUpdate {
    pub fn apply_to(self, m: &mut GameMatch) {
        if let Some(status) = self.status {
            m.status = status;
        }
        if let Some(score) = self.score {
            m.home_score = score.home;
            m.away_score = score.away;
        }
        if let Some(date) = self.date {
            m.date = date;
        }
        if !self.events_delete.is_empty() {
            m.events.retain(|e| !self.events_delete.contains(&e.id));
        }
        m.events
            .extend(self.events_append.into_iter().map(MatchEventInput::into_event));
        m.events.sort_by_key(|e| e.minute);
    }
}

/// Winner and loser of a decided match.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Outcome {
    pub winner: TeamId,
    pub loser: TeamId,
}

impl Outcome {
    pub fn team_for(&self, kind: SourceKind) -> &TeamId {
        match kind {
            SourceKind::Winner => &self.winner,
            SourceKind::Loser => &self.loser,
        }
    }
}

/// A single fixture, either in group play or in the playoff bracket.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMatch {
    pub id: MatchId,
    pub stage_id: StageId,
    pub group_id: Option<GroupId>,
    /// Group play: matchday (1-based). Playoffs: 1 is the final, higher is earlier.
    pub round: Option<u32>,
    /// Position within `(stage, round)`, unique together with them.
    pub index: Option<u32>,
    pub date: NaiveDateTime,
    pub status: MatchStatus,
    pub home: TeamSlot,
    pub away: TeamSlot,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub events: Vec<MatchEvent>,
}

impl GameMatch {
    /// New scheduled match without scores or events.
    pub fn new(
        stage_id: impl Into<StageId>,
        round: u32,
        index: u32,
        date: NaiveDateTime,
        home: TeamSlot,
        away: TeamSlot,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage_id: stage_id.into(),
            group_id: None,
            round: Some(round),
            index: Some(index),
            date,
            status: MatchStatus::Scheduled,
            home,
            away,
            home_score: None,
            away_score: None,
            events: Vec::new(),
        }
    }

    pub fn in_group(mut self, group_id: impl Into<GroupId>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn home_team(&self) -> Option<&TeamId> {
        self.home.team_id()
    }

    pub fn away_team(&self) -> Option<&TeamId> {
        self.away.team_id()
    }

    pub fn slot_mut(&mut self, side: Side) -> &mut TeamSlot {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }

    /// `(home, away, home_score, away_score)` of a finished, fully known match.
    pub fn result(&self) -> Option<(&TeamId, &TeamId, u32, u32)> {
        if self.status != MatchStatus::Finished {
            return None;
        }
        Some((
            self.home_team()?,
            self.away_team()?,
            self.home_score?,
            self.away_score?,
        ))
    }

    /// Winner and loser, or `None` if unfinished, incomplete, or drawn.
    pub fn outcome(&self) -> Option<Outcome> {
        let (home, away, hs, aws) = self.result()?;
        if hs == aws {
            return None;
        }
        let (winner, loser) = if hs > aws { (home, away) } else { (away, home) };
        Some(Outcome {
            winner: winner.clone(),
            loser: loser.clone(),
        })
    }
}
