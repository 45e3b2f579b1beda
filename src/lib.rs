//! Tournament engine: group fixtures, standings, playoff brackets and result propagation.

pub mod logic;
pub mod models;
pub mod store;

pub use logic::{
    berger_rounds, cascade_outcome, first_round_pairs, generate_bracket, generate_round_robin,
    group_standings, propagate_outcome, qualified_teams, rank_group, rounds_needed, update_match,
    Pairing, RoundRobinSummary, ScheduleDefaults, Slot, SlotAllocator, PLAYOFF_DEFAULTS,
    ROUND_ROBIN_DEFAULTS,
};
pub use models::{
    CardKind, ErrorKind, GameMatch, Group, GroupId, GroupStandings, MatchEvent, MatchEventInput,
    MatchEventKind, MatchId, MatchStatus, MatchUpdate, Outcome, PlayoffOptions, QualifiedTeam,
    RoundRobinOptions, SchedulingOptions, Score, Side, SourceKind, Stage, StageId, StageKind,
    StandingRow, TeamId, TeamSlot, Tournament, TournamentError, TournamentId,
};
pub use store::{stage_of_kind, MemoryStore, Store};
