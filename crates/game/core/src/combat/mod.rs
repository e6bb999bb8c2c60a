//! Duel resolution.
//!
//! Pure functions and value types for posture-based dice rounds. Timers and
//! persistence of the outcome belong to the runtime's combat engine.
//!
//! # Round formula
//!
//! ```text
//! attack  = attack stat + attack die  + posture bonus if offensive + tile attack  + sanctuary bonus
//! defense = defense stat + defense die + posture bonus if defensive + tile defense
//! damage  = max(0, opposing attack - own defense)
//! ```
//!
//! Both sides take damage simultaneously.

mod posture;
mod round;
mod state;

pub use posture::Posture;
pub use round::{
    CombatProfile, Dice, RoundReport, SideReport, damage, effective_attack, effective_defense,
    resolve_round,
};
pub use state::{CombatState, Combatant, DuelOutcome, judge};
