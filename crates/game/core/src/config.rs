/// How water tiles are treated for a player that is not riding a boat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WaterRule {
    /// Water can be waded through at the given cost per tile.
    Wade { cost: u32 },
    /// Water can only be crossed by boat.
    Impassable,
}

impl Default for WaterRule {
    fn default() -> Self {
        Self::Wade {
            cost: GameConfig::DEFAULT_WADE_COST,
        }
    }
}

/// Tunable rule parameters shared by every session of a runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    /// Movement cost of stepping through an open door.
    pub open_door_cost: u32,
    pub water_rule: WaterRule,
    /// Added to attack when Offensive, to defense when Defensive.
    pub posture_bonus: u32,
    /// Subtracted from both rolls of a combatant standing on ice.
    pub ice_penalty: u32,
    /// Duel wins needed to end an elimination game.
    pub wins_to_victory: u32,
    pub actions_per_turn: u32,
    /// Attack bonus granted by a sanctuary's fight blessing.
    pub sanctuary_bonus: u32,
    /// Turns a sanctuary stays dormant after use.
    pub sanctuary_cooldown_turns: u32,
}

impl GameConfig {
    // ===== fixed movement costs =====
    pub const GROUND_COST: u32 = 1;
    pub const ICE_COST: u32 = 0;
    pub const BOAT_WATER_COST: u32 = 1;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_OPEN_DOOR_COST: u32 = 1;
    pub const DEFAULT_WADE_COST: u32 = 2;
    pub const DEFAULT_POSTURE_BONUS: u32 = 2;
    pub const DEFAULT_ICE_PENALTY: u32 = 2;
    pub const DEFAULT_WINS_TO_VICTORY: u32 = 3;
    pub const DEFAULT_ACTIONS_PER_TURN: u32 = 1;
    pub const DEFAULT_SANCTUARY_BONUS: u32 = 2;
    pub const DEFAULT_SANCTUARY_COOLDOWN_TURNS: u32 = 2;

    pub fn new() -> Self {
        Self {
            open_door_cost: Self::DEFAULT_OPEN_DOOR_COST,
            water_rule: WaterRule::default(),
            posture_bonus: Self::DEFAULT_POSTURE_BONUS,
            ice_penalty: Self::DEFAULT_ICE_PENALTY,
            wins_to_victory: Self::DEFAULT_WINS_TO_VICTORY,
            actions_per_turn: Self::DEFAULT_ACTIONS_PER_TURN,
            sanctuary_bonus: Self::DEFAULT_SANCTUARY_BONUS,
            sanctuary_cooldown_turns: Self::DEFAULT_SANCTUARY_COOLDOWN_TURNS,
        }
    }

    pub fn with_water_rule(mut self, water_rule: WaterRule) -> Self {
        self.water_rule = water_rule;
        self
    }

    pub fn with_wins_to_victory(mut self, wins: u32) -> Self {
        self.wins_to_victory = wins;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
