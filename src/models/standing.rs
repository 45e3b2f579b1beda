//! Standings rows and qualified teams.

use crate::models::tournament::{GroupId, TeamId};
use serde::{Deserialize, Serialize};

/// One team's line in a group table.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow {
    pub team_id: TeamId,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    /// Wins as the away side (late tie-break).
    pub away_wins: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: u32,
}

impl StandingRow {
    pub fn new(team_id: impl Into<TeamId>) -> Self {
        Self {
            team_id: team_id.into(),
            ..Self::default()
        }
    }

    pub fn goal_difference(&self) -> i64 {
        i64::from(self.goals_for) - i64::from(self.goals_against)
    }

    /// Record one finished match from this team's point of view.
    pub fn record(&mut self, scored: u32, conceded: u32, away: bool) {
        self.played += 1;
        self.goals_for += scored;
        self.goals_against += conceded;
        if scored > conceded {
            self.wins += 1;
            self.points += 3;
            if away {
                self.away_wins += 1;
            }
        } else if scored == conceded {
            self.draws += 1;
            self.points += 1;
        } else {
            self.losses += 1;
        }
    }
}

/// Ranked table of one group.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStandings {
    pub group_id: GroupId,
    pub group_name: String,
    /// Best first.
    pub rows: Vec<StandingRow>,
}

/// A team that made it out of its group. Only places 1 and 2 qualify.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualifiedTeam {
    pub team_id: TeamId,
    pub group: GroupId,
    pub place: u8,
}
