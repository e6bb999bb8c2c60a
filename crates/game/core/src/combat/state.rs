use crate::env::TileEffect;
use crate::error::RuleViolation;
use crate::state::PlayerId;

use super::Posture;

/// One side of a duel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub player: PlayerId,
    pub posture: Option<Posture>,
    /// Modifier of the tile the combatant stood on when the duel started.
    pub tile: TileEffect,
}

impl Combatant {
    pub const fn new(player: PlayerId, tile: TileEffect) -> Self {
        Self {
            player,
            posture: None,
            tile,
        }
    }
}

/// A running duel. At most one exists per session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatState {
    /// `[attacker, defender]`.
    pub sides: [Combatant; 2],
    /// Rounds resolved so far.
    pub round: u32,
    /// The attacker's duel count when this duel opened. Tells apart duels
    /// fought during the same turn.
    pub sequence: u32,
}

impl CombatState {
    pub const fn new(attacker: Combatant, defender: Combatant) -> Self {
        Self {
            sides: [attacker, defender],
            round: 0,
            sequence: 0,
        }
    }

    pub const fn numbered(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    pub const fn attacker(&self) -> PlayerId {
        self.sides[0].player
    }

    pub const fn defender(&self) -> PlayerId {
        self.sides[1].player
    }

    pub fn participants(&self) -> [PlayerId; 2] {
        self.sides.map(|side| side.player)
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.side_index(player).is_some()
    }

    fn side_index(&self, player: PlayerId) -> Option<usize> {
        self.sides.iter().position(|side| side.player == player)
    }

    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        self.side_index(player)
            .map(|index| self.sides[1 - index].player)
    }

    /// Records a posture and reports whether both sides have now chosen.
    pub fn choose(&mut self, player: PlayerId, posture: Posture) -> Result<bool, RuleViolation> {
        let index = self
            .side_index(player)
            .ok_or(RuleViolation::NotCombatant(player))?;
        self.sides[index].posture = Some(posture);
        Ok(self.both_chosen())
    }

    pub fn both_chosen(&self) -> bool {
        self.sides.iter().all(|side| side.posture.is_some())
    }

    /// Clears both postures and counts the round.
    pub fn finish_round(&mut self) {
        for side in &mut self.sides {
            side.posture = None;
        }
        self.round += 1;
    }
}

/// State of a duel after a round's damage was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DuelOutcome {
    /// Both sides still stand; another round follows.
    Continue,
    Victory { winner: PlayerId, loser: PlayerId },
    /// Both sides fell in the same round.
    Draw,
}

/// Decides the duel from each side's health after damage.
pub fn judge(sides: [(PlayerId, u32); 2]) -> DuelOutcome {
    let [(first, first_health), (second, second_health)] = sides;
    match (first_health == 0, second_health == 0) {
        (false, false) => DuelOutcome::Continue,
        (true, true) => DuelOutcome::Draw,
        (false, true) => DuelOutcome::Victory {
            winner: first,
            loser: second,
        },
        (true, false) => DuelOutcome::Victory {
            winner: second,
            loser: first,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duel() -> CombatState {
        CombatState::new(
            Combatant::new(PlayerId(1), TileEffect::NONE),
            Combatant::new(PlayerId(2), TileEffect::NONE),
        )
    }

    #[test]
    fn resolves_once_both_postures_chosen() {
        let mut state = duel();
        assert_eq!(state.choose(PlayerId(1), Posture::Offensive), Ok(false));
        assert_eq!(state.choose(PlayerId(2), Posture::Defensive), Ok(true));

        state.finish_round();
        assert!(!state.both_chosen());
        assert_eq!(state.round, 1);
    }

    #[test]
    fn outsiders_cannot_choose_posture() {
        let mut state = duel();
        assert_eq!(
            state.choose(PlayerId(3), Posture::Offensive),
            Err(RuleViolation::NotCombatant(PlayerId(3)))
        );
    }

    #[test]
    fn simultaneous_death_is_a_draw() {
        assert_eq!(judge([(PlayerId(1), 0), (PlayerId(2), 0)]), DuelOutcome::Draw);
        assert_eq!(
            judge([(PlayerId(1), 3), (PlayerId(2), 0)]),
            DuelOutcome::Victory {
                winner: PlayerId(1),
                loser: PlayerId(2)
            }
        );
        assert_eq!(judge([(PlayerId(1), 1), (PlayerId(2), 2)]), DuelOutcome::Continue);
    }
}
