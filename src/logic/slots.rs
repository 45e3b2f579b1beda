//! Kick-off slot allocation: hands out unique `(date, time)` pairs for a generation run.
//!
//! Two modes:
//! - declared times: the configured times of day are used first, then the allocator keeps
//!   stepping forward from the last used time;
//! - interval: the first kick-off is at `first_match_time`, each following one `interval`
//!   minutes later.
//!
//! When a day runs out the allocator either spills to the next calendar day or, for rounds
//! that must stay on one day, wraps around the clock skipping taken times.

use crate::models::{SchedulingOptions, TournamentError};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

const DAY_MINUTES: u32 = 24 * 60;

/// Step used in declared-times mode when neither an interval nor two declared times are given.
const FALLBACK_STEP_MINUTES: u32 = 90;

/// Per-operation defaults for options the caller left out.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScheduleDefaults {
    /// Minute of day.
    pub first_match_minute: u32,
    pub interval_minutes: u32,
    pub day_interval: u32,
}

/// Group fixtures: evenings, two hours apart, one round per week.
pub const ROUND_ROBIN_DEFAULTS: ScheduleDefaults = ScheduleDefaults {
    first_match_minute: 18 * 60,
    interval_minutes: 120,
    day_interval: 7,
};

/// Playoffs: late evening, hourly, every round on the same day unless told otherwise.
pub const PLAYOFF_DEFAULTS: ScheduleDefaults = ScheduleDefaults {
    first_match_minute: 22 * 60,
    interval_minutes: 60,
    day_interval: 0,
};

/// A concrete kick-off.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Slot {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl Slot {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.time.format("%H:%M"))
    }
}

#[derive(Clone, Copy, Debug)]
struct DayState {
    /// Next unconsumed declared time (declared mode) or number of allocations (interval mode).
    next: usize,
    last_minute: u32,
}

/// Slot allocator for one generation call. Not shared between calls.
#[derive(Clone, Debug)]
pub struct SlotAllocator {
    /// Sorted, deduplicated minutes of day. Empty means interval mode.
    declared: Vec<u32>,
    first_minute: u32,
    declared_step: u32,
    interval: u32,
    day_interval: u32,
    allow_next_day: bool,
    current_day: NaiveDate,
    days: HashMap<NaiveDate, DayState>,
    used: HashMap<NaiveDate, HashSet<u32>>,
}

fn parse_minute(raw: &str, field: &str) -> Result<u32, TournamentError> {
    let t = NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
        TournamentError::InvalidOptions(format!("{field}: expected HH:MM, got {raw:?}"))
    })?;
    Ok(t.hour() * 60 + t.minute())
}

fn minute_to_time(minute: u32) -> NaiveTime {
    NaiveTime::from_num_seconds_from_midnight_opt((minute % DAY_MINUTES) * 60, 0).unwrap_or(NaiveTime::MIN)
}

/// First free minute at `from`, `from + stride`, ... before midnight.
fn first_free(used: &HashSet<u32>, from: u32, stride: u32) -> Option<u32> {
    (0..)
        .map(|k| from + k * stride)
        .take_while(|m| *m < DAY_MINUTES)
        .find(|m| !used.contains(m))
}

/// Free minute found by walking the clock from `from` in steps of `stride`; if that lattice is
/// full, any free minute after `from`.
fn wrap_free(used: &HashSet<u32>, from: u32, stride: u32) -> Option<u32> {
    let from = from % DAY_MINUTES;
    (0..DAY_MINUTES)
        .map(|k| (from + k * stride) % DAY_MINUTES)
        .find(|m| !used.contains(m))
        .or_else(|| {
            (0..DAY_MINUTES)
                .map(|k| (from + k) % DAY_MINUTES)
                .find(|m| !used.contains(m))
        })
}

impl SlotAllocator {
    pub fn new(options: &SchedulingOptions, defaults: &ScheduleDefaults) -> Result<Self, TournamentError> {
        if let Some(interval) = options.match_interval_minutes {
            if interval == 0 || interval > DAY_MINUTES {
                return Err(TournamentError::InvalidOptions(format!(
                    "matchIntervalMinutes must be between 1 and {DAY_MINUTES}, got {interval}"
                )));
            }
        }
        let mut declared = options
            .match_times
            .iter()
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_minute(s, "matchTimes"))
            .collect::<Result<Vec<_>, _>>()?;
        declared.sort_unstable();
        declared.dedup();

        let first_minute = match &options.first_match_time {
            Some(raw) => parse_minute(raw, "firstMatchTime")?,
            None => defaults.first_match_minute,
        };
        let inferred_step = match declared.as_slice() {
            [a, b, ..] => b - a,
            _ => FALLBACK_STEP_MINUTES,
        };

        Ok(Self {
            declared,
            first_minute,
            declared_step: options.match_interval_minutes.unwrap_or(inferred_step),
            interval: options.match_interval_minutes.unwrap_or(defaults.interval_minutes),
            day_interval: options.day_interval.unwrap_or(defaults.day_interval),
            allow_next_day: !options.round_in_single_day,
            current_day: options.start_date,
            days: HashMap::new(),
            used: HashMap::new(),
        })
    }

    /// Make `day` the day the following allocations start from.
    pub fn start_of_round(&mut self, day: NaiveDate) {
        self.current_day = day;
    }

    /// The day the round after one played on `day` starts.
    pub fn next_round_day(&self, day: NaiveDate) -> Result<NaiveDate, TournamentError> {
        day.checked_add_days(Days::new(u64::from(self.day_interval)))
            .ok_or_else(|| TournamentError::InvalidOptions("date out of range".into()))
    }

    /// Next free slot on or after the current day. Never returns the same slot twice.
    pub fn allocate(&mut self) -> Result<Slot, TournamentError> {
        let interval_mode = self.declared.is_empty();
        let initial_minute = self.declared.first().copied().unwrap_or(self.first_minute);
        let mut day = self.current_day;

        loop {
            let used = self.used.entry(day).or_default();
            let state = self.days.entry(day).or_insert(DayState {
                next: 0,
                last_minute: initial_minute,
            });

            let (from, stride) = if interval_mode {
                let from = if state.next == 0 {
                    self.first_minute
                } else {
                    state.last_minute + self.interval
                };
                state.next += 1;
                (from, self.interval)
            } else {
                while let Some(&candidate) = self.declared.get(state.next) {
                    state.next += 1;
                    if used.insert(candidate) {
                        state.last_minute = candidate;
                        return Ok(Slot { date: day, time: minute_to_time(candidate) });
                    }
                }
                (state.last_minute + self.declared_step, self.declared_step)
            };

            if let Some(minute) = first_free(used, from, stride) {
                used.insert(minute);
                state.last_minute = minute;
                return Ok(Slot { date: day, time: minute_to_time(minute) });
            }

            if self.allow_next_day {
                day = day
                    .succ_opt()
                    .ok_or(TournamentError::SlotsExhausted { date: day })?;
                continue;
            }

            let minute = wrap_free(used, from, stride)
                .ok_or(TournamentError::SlotsExhausted { date: day })?;
            used.insert(minute);
            state.last_minute = minute;
            return Ok(Slot { date: day, time: minute_to_time(minute) });
        }
    }
}
