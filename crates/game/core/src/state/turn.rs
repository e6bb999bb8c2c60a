use super::PlayerId;

/// Phase of the per-session turn state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum TurnPhase {
    /// Short pause before the next player's clock starts.
    #[default]
    Transition,
    /// The active player's clock is running.
    PlayerTurn,
    /// A duel is in progress; the active player's clock is suspended.
    CombatPause,
}

/// Whose turn it is and what they have done with it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnDescriptor {
    /// Monotonic turn counter. Zero until the first turn is started.
    pub number: u64,
    pub active: Option<PlayerId>,
    /// Set once the active player spent their action (attack, sanctuary).
    pub action_used: bool,
    pub phase: TurnPhase,
}

impl TurnDescriptor {
    pub fn is_active(&self, player: PlayerId) -> bool {
        self.active == Some(player)
    }
}
