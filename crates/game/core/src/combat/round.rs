use crate::config::GameConfig;
use crate::env::{DicePolicy, RngOracle, RollPurpose, compute_seed};
use crate::state::{DiceKind, Player, PlayerId};

use super::{CombatState, Combatant, Posture};

/// The numbers of a player that matter in a duel, captured at round time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CombatProfile {
    pub player: PlayerId,
    pub attack: u32,
    pub defense: u32,
    pub attack_die: DiceKind,
    pub defense_die: DiceKind,
    /// Sanctuary blessing, added to attack.
    pub attack_bonus: u32,
    pub health: u32,
}

impl CombatProfile {
    pub fn of(player: &Player, config: &GameConfig) -> Self {
        Self {
            player: player.id,
            attack: player.attack.total(),
            defense: player.defense.total(),
            attack_die: player.attack_die,
            defense_die: player.defense_die,
            attack_bonus: if player.combat_bonus {
                config.sanctuary_bonus
            } else {
                0
            },
            health: player.health.current,
        }
    }
}

/// Dice for one round of one duel.
pub struct Dice<'a> {
    rng: &'a dyn RngOracle,
    policy: DicePolicy,
    session_seed: u64,
    nonce: u64,
}

impl<'a> Dice<'a> {
    pub fn new(rng: &'a dyn RngOracle, policy: DicePolicy, session_seed: u64, nonce: u64) -> Self {
        Self {
            rng,
            policy,
            session_seed,
            nonce,
        }
    }

    /// Nonce identifying round `round` of duel `sequence` fought during
    /// turn `turn`.
    pub const fn nonce(turn: u64, sequence: u32, round: u32) -> u64 {
        (turn << 32) | ((sequence as u64 & 0xffff) << 16) | (round as u64 & 0xffff)
    }

    pub fn roll(&self, player: PlayerId, die: DiceKind, purpose: RollPurpose) -> u32 {
        let seed = compute_seed(self.session_seed, self.nonce, player.0, purpose.context());
        self.policy.roll(self.rng, seed, die.sides(), purpose)
    }
}

pub fn effective_attack(
    profile: &CombatProfile,
    side: &Combatant,
    roll: u32,
    config: &GameConfig,
) -> i32 {
    let posture = Posture::attack_bonus(side.posture, config.posture_bonus);
    (profile.attack + roll + posture + profile.attack_bonus) as i32 + side.tile.attack
}

pub fn effective_defense(
    profile: &CombatProfile,
    side: &Combatant,
    roll: u32,
    config: &GameConfig,
) -> i32 {
    let posture = Posture::defense_bonus(side.posture, config.posture_bonus);
    (profile.defense + roll + posture) as i32 + side.tile.defense
}

/// Health lost when `attack` meets `defense`. Never negative.
pub fn damage(attack: i32, defense: i32) -> u32 {
    attack.saturating_sub(defense).max(0) as u32
}

/// One combatant's numbers for a resolved round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SideReport {
    pub player: PlayerId,
    pub posture: Option<Posture>,
    pub attack_roll: u32,
    pub defense_roll: u32,
    pub attack: i32,
    pub defense: i32,
    pub damage_taken: u32,
    /// Health after this round's damage.
    pub health: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundReport {
    /// 1-based round number within the duel.
    pub round: u32,
    pub sides: [SideReport; 2],
}

impl RoundReport {
    pub fn side(&self, player: PlayerId) -> Option<&SideReport> {
        self.sides.iter().find(|side| side.player == player)
    }

    pub fn healths(&self) -> [(PlayerId, u32); 2] {
        self.sides.map(|side| (side.player, side.health))
    }
}

/// Rolls and scores one round. `profiles` follow the order of `state.sides`.
pub fn resolve_round(
    state: &CombatState,
    profiles: [CombatProfile; 2],
    dice: &Dice<'_>,
    config: &GameConfig,
) -> RoundReport {
    let rolled: [(u32, u32, i32, i32); 2] = core::array::from_fn(|index| {
        let profile = &profiles[index];
        let side = &state.sides[index];
        let attack_roll = dice.roll(profile.player, profile.attack_die, RollPurpose::Attack);
        let defense_roll = dice.roll(profile.player, profile.defense_die, RollPurpose::Defense);
        (
            attack_roll,
            defense_roll,
            effective_attack(profile, side, attack_roll, config),
            effective_defense(profile, side, defense_roll, config),
        )
    });

    let sides = core::array::from_fn(|index| {
        let (attack_roll, defense_roll, attack, defense) = rolled[index];
        let opposing_attack = rolled[1 - index].2;
        let damage_taken = damage(opposing_attack, defense);
        SideReport {
            player: profiles[index].player,
            posture: state.sides[index].posture,
            attack_roll,
            defense_roll,
            attack,
            defense,
            damage_taken,
            health: profiles[index].health.saturating_sub(damage_taken),
        }
    });

    RoundReport {
        round: state.round + 1,
        sides,
    }
}
