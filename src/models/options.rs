//! Options accepted by the fixture and bracket generators.

use crate::models::tournament::GroupId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Timing configuration shared by round-robin and playoff generation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingOptions {
    /// Day of the first round.
    pub start_date: NaiveDate,
    /// Fixed kick-off times ("HH:MM") used first on every day; order and duplicates don't matter.
    #[serde(default)]
    pub match_times: Vec<String>,
    /// First kick-off ("HH:MM") when no `match_times` are given.
    #[serde(default)]
    pub first_match_time: Option<String>,
    /// Minutes between consecutive kick-offs.
    #[serde(default)]
    pub match_interval_minutes: Option<u32>,
    /// Days between consecutive rounds.
    #[serde(default)]
    pub day_interval: Option<u32>,
    /// All matches of a round on one day (wrap around the clock instead of spilling over).
    #[serde(default = "default_true")]
    pub round_in_single_day: bool,
    /// Delete the stage's existing matches (and their events) first.
    #[serde(default)]
    pub clear_existing: bool,
    /// Playoffs only: add a third-place match next to the final.
    #[serde(default = "default_true")]
    pub with_third_place: bool,
}

impl SchedulingOptions {
    /// Defaults for everything except the start date.
    pub fn starting(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            match_times: Vec::new(),
            first_match_time: None,
            match_interval_minutes: None,
            day_interval: None,
            round_in_single_day: true,
            clear_existing: false,
            with_third_place: true,
        }
    }
}

/// Options for `generate_round_robin`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRobinOptions {
    #[serde(flatten)]
    pub schedule: SchedulingOptions,
    /// Play every pairing twice, venues swapped in the second leg.
    #[serde(default)]
    pub double_round: bool,
    /// Only schedule these groups (all groups when absent or empty).
    #[serde(default)]
    pub group_ids: Option<Vec<GroupId>>,
    /// Randomize the order teams enter the pairing table.
    #[serde(default)]
    pub shuffle_teams: bool,
}

impl RoundRobinOptions {
    pub fn new(schedule: SchedulingOptions) -> Self {
        Self {
            schedule,
            double_round: false,
            group_ids: None,
            shuffle_teams: false,
        }
    }

    /// Effective group filter; an empty list means no filter.
    pub fn group_filter(&self) -> Option<&[GroupId]> {
        self.group_ids.as_deref().filter(|ids| !ids.is_empty())
    }
}

/// Options for `generate_bracket`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayoffOptions {
    #[serde(flatten)]
    pub schedule: SchedulingOptions,
    /// Name of the playoff stage if it has to be created.
    #[serde(default)]
    pub stage_name: Option<String>,
}

impl PlayoffOptions {
    pub fn new(schedule: SchedulingOptions) -> Self {
        Self {
            schedule,
            stage_name: None,
        }
    }
}
