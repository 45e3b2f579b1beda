//! Data structures for the tournament engine: matches, groups, stages, standings, options.

mod game;
mod options;
mod standing;
mod tournament;

pub use game::{
    CardKind, GameMatch, MatchEvent, MatchEventInput, MatchEventKind, MatchId, MatchStatus,
    MatchUpdate, Outcome, Score, Side, SourceKind, TeamSlot,
};
pub use options::{PlayoffOptions, RoundRobinOptions, SchedulingOptions};
pub use standing::{GroupStandings, QualifiedTeam, StandingRow};
pub use tournament::{
    ErrorKind, Group, GroupId, Stage, StageId, StageKind, TeamId, Tournament, TournamentError,
    TournamentId,
};
