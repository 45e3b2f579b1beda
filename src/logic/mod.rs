//! Tournament business logic: standings, slot allocation, group fixtures, playoffs.

mod bracket;
mod propagation;
mod round_robin;
mod slots;
mod standings;

pub use bracket::{first_round_pairs, generate_bracket, rounds_needed};
pub use propagation::{cascade_outcome, propagate_outcome, update_match};
pub use round_robin::{berger_rounds, generate_round_robin, Pairing, RoundRobinSummary};
pub use slots::{ScheduleDefaults, Slot, SlotAllocator, PLAYOFF_DEFAULTS, ROUND_ROBIN_DEFAULTS};
pub use standings::{group_standings, qualified_teams, rank_group};
