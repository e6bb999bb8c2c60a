//! Session rules for the tactical grid game.
//!
//! `game-core` is synchronous and performs no I/O. It defines the session
//! data model, the collaborator traits the rules run against
//! ([`SessionStore`], [`GridQuery`], [`EventSink`], [`RngOracle`]), the
//! [`MovementEngine`], combat round math and the turn selection rule. Timers,
//! duel lifecycles and per-session serialisation live in the runtime crate.
pub mod combat;
pub mod config;
pub mod env;
pub mod error;
pub mod events;
pub mod interact;
pub mod movement;
pub mod state;
pub mod turn;

#[cfg(test)]
pub(crate) mod testing;

pub use combat::{CombatState, Combatant, DuelOutcome, Posture, RoundReport, SideReport};
pub use config::{GameConfig, WaterRule};
pub use env::{
    DicePolicy, GameEnv, GridLayout, GridQuery, LayoutError, PcgRng, RngOracle, SessionStore,
    StoreError, TileEffect, TileKind,
};
pub use error::{EngineError, ErrorSeverity, GameError, Missing, RuleViolation};
pub use events::{
    CombatEndReason, EventSink, ReachableRequest, ReachableTile, RecordingSink, SessionEvent,
};
pub use interact::{Interactions, SanctuaryChoice};
pub use movement::{MoveOutcome, MovementEngine};
pub use state::{
    CombatRecord, DiceKind, FlagRecord, GameMode, Health, MovementPoints, Orientation, Placeable,
    PlaceableId, PlaceableKind, Player, PlayerId, Position, Session, SessionId, Stat,
    TurnDescriptor, TurnPhase,
};
