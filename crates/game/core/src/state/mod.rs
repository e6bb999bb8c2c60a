//! Session state representation.
//!
//! The types here describe one session: its players, turn bookkeeping, flag
//! and placeables. The authoritative copy lives in a
//! [`SessionStore`](crate::env::SessionStore); engines read snapshots and
//! write back through the store's mutators.
mod common;
mod placeable;
mod player;
mod session;
mod turn;

pub use common::{Orientation, PlaceableId, PlayerId, Position, SessionId};
pub use placeable::{Placeable, PlaceableKind};
pub use player::{CombatRecord, DiceKind, Health, MovementPoints, Player, Stat};
pub use session::{FlagRecord, GameMode, Session};
pub use turn::{TurnDescriptor, TurnPhase};
