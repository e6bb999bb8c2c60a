//! Seeded dice for combat rounds.
//!
//! Rolls are a pure function of a seed so a session can be replayed from its
//! command log. [`DicePolicy::Loaded`] replaces the roll in unrestricted
//! sessions.

/// Deterministic random source.
///
/// Implementations must return the same value for the same seed.
pub trait RngOracle: Send + Sync {
    fn next_u32(&self, seed: u64) -> u32;

    /// Roll a die with N sides (1-N inclusive).
    fn roll_die(&self, seed: u64, sides: u32) -> u32 {
        (self.next_u32(seed) % sides.max(1)) + 1
    }
}

/// PCG-XSH-RR: 64-bit LCG state, 32-bit permuted output.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::pcg_output(Self::pcg_step(seed))
    }
}

/// Mixes the session seed with the round coordinates of a roll.
///
/// `nonce` identifies the round, `context` separates independent rolls of
/// the same player within it.
pub fn compute_seed(session_seed: u64, nonce: u64, player: u32, context: u32) -> u64 {
    let mut hash = session_seed;
    hash ^= nonce.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (player as u64).wrapping_mul(0x517cc1b727220a95);
    hash ^= (context as u64).wrapping_mul(0x85ebca6b);

    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;
    hash
}

/// What a die roll is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RollPurpose {
    Attack,
    Defense,
}

impl RollPurpose {
    /// Seed context separating the two rolls of one combatant.
    pub const fn context(self) -> u32 {
        match self {
            RollPurpose::Attack => 0,
            RollPurpose::Defense => 1,
        }
    }
}

/// Whether dice are thrown or fixed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DicePolicy {
    #[default]
    Fair,
    /// Attack always rolls the die maximum, defense always rolls 1.
    Loaded,
}

impl DicePolicy {
    pub const fn for_session(unrestricted: bool) -> Self {
        if unrestricted {
            DicePolicy::Loaded
        } else {
            DicePolicy::Fair
        }
    }

    pub fn roll(self, rng: &dyn RngOracle, seed: u64, sides: u32, purpose: RollPurpose) -> u32 {
        match (self, purpose) {
            (DicePolicy::Fair, _) => rng.roll_die(seed, sides),
            (DicePolicy::Loaded, RollPurpose::Attack) => sides,
            (DicePolicy::Loaded, RollPurpose::Defense) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcg_is_deterministic() {
        let rng = PcgRng;
        assert_eq!(rng.next_u32(42), rng.next_u32(42));
        assert_ne!(rng.next_u32(42), rng.next_u32(43));
    }

    #[test]
    fn rolls_stay_within_die() {
        let rng = PcgRng;
        for seed in 0..500 {
            let roll = rng.roll_die(compute_seed(7, seed, 1, 0), 6);
            assert!((1..=6).contains(&roll));
        }
    }

    #[test]
    fn loaded_dice_favour_attacker() {
        let rng = PcgRng;
        let policy = DicePolicy::for_session(true);
        assert_eq!(policy.roll(&rng, 1, 6, RollPurpose::Attack), 6);
        assert_eq!(policy.roll(&rng, 1, 4, RollPurpose::Defense), 1);
    }

    #[test]
    fn seed_depends_on_every_component() {
        let base = compute_seed(1, 2, 3, 0);
        assert_ne!(base, compute_seed(1, 2, 3, 1));
        assert_ne!(base, compute_seed(1, 2, 4, 0));
        assert_ne!(base, compute_seed(1, 3, 3, 0));
    }
}
