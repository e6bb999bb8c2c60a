//! Error types shared by the session rules.
//!
//! Every rule failure is an [`EngineError`]: either something the request
//! names does not exist ([`EngineError::NotFound`]) or the request breaks a
//! game rule ([`EngineError::InvalidRequest`]). Both carry a stable
//! [`GameError::error_code`] that hosts can forward to clients verbatim.

use crate::env::StoreError;
use crate::state::{PlaceableId, PlayerId, Position, SessionId};

/// Severity level of an error, used for categorization and recovery strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// The same request may succeed later (e.g. once the tile frees up).
    Recoverable,

    /// Invalid input; retrying unchanged will fail again.
    Validation,

    /// Unexpected state inconsistency. Indicates a bug.
    Internal,

    /// Session state is corrupted and cannot continue.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all game-core errors.
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Static identifier of the error variant, stable across releases.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// The entity a request referred to but that could not be found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Missing {
    #[error("{0} does not exist")]
    Session(SessionId),

    #[error("player {0} is not part of the session")]
    Player(PlayerId),

    #[error("tile {0} is outside the map")]
    Tile(Position),

    #[error("player {0} has no start point")]
    StartPoint(PlayerId),

    #[error("no free tile to respawn player {0}")]
    SpawnTile(PlayerId),

    #[error("{0} does not exist")]
    Placeable(PlaceableId),
}

impl Missing {
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Session(_) => "SESSION_NOT_FOUND",
            Self::Player(_) => "PLAYER_NOT_FOUND",
            Self::Tile(_) => "TILE_NOT_FOUND",
            Self::StartPoint(_) => "START_POINT_NOT_FOUND",
            Self::SpawnTile(_) => "SPAWN_TILE_NOT_FOUND",
            Self::Placeable(_) => "PLACEABLE_NOT_FOUND",
        }
    }
}

/// A request that is well-formed but not allowed by the rules right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RuleViolation {
    #[error("turn order is not defined")]
    TurnOrderNotDefined,

    #[error("no player is still in the game")]
    NoActivePlayer,

    #[error("player {0} is not the active player")]
    NotActivePlayer(PlayerId),

    #[error("the turn has not started yet")]
    TurnNotStarted,

    #[error("Cannot move onto this tile")]
    Blocked { position: Position },

    #[error("move costs {required} but only {available} movement left")]
    InsufficientMovement { required: u32, available: u32 },

    #[error("player {0} has no actions remaining")]
    NoActionsRemaining(PlayerId),

    #[error("no opponent at {0}")]
    NoOpponentAt(Position),

    #[error("target {0} is not adjacent")]
    TargetNotAdjacent(Position),

    #[error("cannot attack teammate {0}")]
    FriendlyFire(PlayerId),

    #[error("a combat is already in progress")]
    CombatInProgress,

    #[error("player {0} is not part of the combat")]
    NotCombatant(PlayerId),

    #[error("no usable sanctuary at {0}")]
    SanctuaryUnavailable(Position),

    #[error("the game is already over")]
    GameFinished,
}

impl RuleViolation {
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::TurnOrderNotDefined => "TURN_ORDER_NOT_DEFINED",
            Self::NoActivePlayer => "NO_ACTIVE_PLAYER",
            Self::NotActivePlayer(_) => "NOT_ACTIVE_PLAYER",
            Self::TurnNotStarted => "TURN_NOT_STARTED",
            Self::Blocked { .. } => "MOVE_BLOCKED",
            Self::InsufficientMovement { .. } => "INSUFFICIENT_MOVEMENT",
            Self::NoActionsRemaining(_) => "NO_ACTIONS_REMAINING",
            Self::NoOpponentAt(_) => "NO_OPPONENT",
            Self::TargetNotAdjacent(_) => "TARGET_NOT_ADJACENT",
            Self::FriendlyFire(_) => "FRIENDLY_FIRE",
            Self::CombatInProgress => "COMBAT_IN_PROGRESS",
            Self::NotCombatant(_) => "NOT_COMBATANT",
            Self::SanctuaryUnavailable(_) => "SANCTUARY_UNAVAILABLE",
            Self::GameFinished => "GAME_FINISHED",
        }
    }
}

/// Error returned by every engine operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(Missing),

    #[error("invalid request: {0}")]
    InvalidRequest(RuleViolation),
}

impl EngineError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub const fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }
}

impl GameError for EngineError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFound(Missing::SpawnTile(_) | Missing::StartPoint(_)) => {
                ErrorSeverity::Internal
            }
            Self::NotFound(_) => ErrorSeverity::Validation,
            Self::InvalidRequest(
                RuleViolation::Blocked { .. }
                | RuleViolation::CombatInProgress
                | RuleViolation::NotActivePlayer(_)
                | RuleViolation::TurnNotStarted
                | RuleViolation::SanctuaryUnavailable(_),
            ) => ErrorSeverity::Recoverable,
            Self::InvalidRequest(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(missing) => missing.error_code(),
            Self::InvalidRequest(violation) => violation.error_code(),
        }
    }
}

impl From<Missing> for EngineError {
    fn from(missing: Missing) -> Self {
        Self::NotFound(missing)
    }
}

impl From<RuleViolation> for EngineError {
    fn from(violation: RuleViolation) -> Self {
        Self::InvalidRequest(violation)
    }
}

impl From<StoreError> for EngineError {
    fn from(error: StoreError) -> Self {
        let missing = match error {
            StoreError::SessionNotFound(session) => Missing::Session(session),
            StoreError::PlayerNotFound { player, .. } => Missing::Player(player),
            StoreError::StartPointNotFound { player, .. } => Missing::StartPoint(player),
            StoreError::PlaceableNotFound { placeable, .. } => Missing::Placeable(placeable),
        };
        Self::NotFound(missing)
    }
}

pub type Result<T, E = EngineError> = core::result::Result<T, E>;
