// Error types for the rules engine.
//
// Every error is recoverable: the engine rejects the offending event, leaves
// the game untouched and hands the error back to the driving controller.

use thiserror::Error;

use crate::game::Phase;
use crate::player::PlayerId;
use crate::roles::{Role, Team};
use crate::setup::RoleDistribution;

/// Errors raised while setting up a game.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("player count {count} is outside the supported range {min}..={max}")]
    PlayerCount { count: usize, min: usize, max: usize },

    #[error("{roles} roles were supplied for {players} players")]
    PoolSize { players: usize, roles: usize },

    #[error(
        "role distribution {} does not match the required {}: {}",
        .actual,
        .expected,
        .problems.join("; ")
    )]
    Distribution {
        expected: RoleDistribution,
        actual: RoleDistribution,
        problems: Vec<String>,
    },

    #[error("unknown role name '{name}'{hint}")]
    UnknownRole { name: String, hint: String },

    #[error("too many instances of '{role}': maximum allowed {max}, found {found}")]
    TooManyCopies { role: Role, max: u8, found: usize },

    #[error("malformed bag: {0}")]
    MalformedBag(String),

    #[error("malformed grimoire: {0}")]
    MalformedGrimoire(String),

    #[error("player name '{0}' is empty or used twice")]
    DuplicateName(String),

    #[error("the Drunk needs a {team:?} token that is not in play, but none is left")]
    NoDrunkToken { team: Team },

    #[error("discussion timer must be at least 1, got {0}")]
    InvalidTimer(u32),
}

/// Errors raised by player events and storyteller commands.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{event} is not valid during {phase}")]
    InvalidPhaseEvent { event: &'static str, phase: Phase },

    #[error("{nominator} has already nominated today")]
    DuplicateNomination { nominator: PlayerId },

    #[error("invalid target {target}: {reason}")]
    InvalidTarget {
        target: PlayerId,
        reason: &'static str,
    },

    #[error("{player} has already used their ability")]
    AbilityExhausted { player: PlayerId },

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("{player} cannot act: {reason}")]
    IneligibleActor {
        player: PlayerId,
        reason: &'static str,
    },

    #[error("{voter} has already voted on this nomination")]
    DuplicateVote { voter: PlayerId },
}

impl GameError {
    pub fn invalid_phase(event: &'static str, phase: Phase) -> Self {
        Self::InvalidPhaseEvent { event, phase }
    }

    pub fn invalid_target(target: PlayerId, reason: &'static str) -> Self {
        Self::InvalidTarget { target, reason }
    }

    pub fn ineligible(player: PlayerId, reason: &'static str) -> Self {
        Self::IneligibleActor { player, reason }
    }
}
