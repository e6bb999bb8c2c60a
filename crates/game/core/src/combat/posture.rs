/// A combatant's stance for one round.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Posture {
    /// Adds the posture bonus to the attack roll.
    Offensive,
    /// Adds the posture bonus to the defense roll.
    Defensive,
}

impl Posture {
    pub const fn attack_bonus(posture: Option<Posture>, bonus: u32) -> u32 {
        match posture {
            Some(Posture::Offensive) => bonus,
            _ => 0,
        }
    }

    pub const fn defense_bonus(posture: Option<Posture>, bonus: u32) -> u32 {
        match posture {
            Some(Posture::Defensive) => bonus,
            _ => 0,
        }
    }
}
