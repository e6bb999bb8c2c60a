use super::{PlaceableId, PlayerId, Position};

/// Movement allowance: a permanent base, a bonus, and what is left this turn.
///
/// `current` is only nonzero while the owner is the active player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovementPoints {
    pub base: u32,
    pub bonus: u32,
    pub current: u32,
}

impl MovementPoints {
    pub const fn new(base: u32) -> Self {
        Self {
            base,
            bonus: 0,
            current: 0,
        }
    }

    pub const fn full(self) -> u32 {
        self.base + self.bonus
    }

    /// Restores the allowance to base + bonus (turn start).
    pub fn refill(&mut self) {
        self.current = self.full();
    }

    /// Zeroes the allowance (turn end).
    pub fn clear(&mut self) {
        self.current = 0;
    }

    /// Spends up to `amount`, returning what could not be covered.
    pub fn spend(&mut self, amount: u32) -> u32 {
        let covered = amount.min(self.current);
        self.current -= covered;
        amount - covered
    }
}

/// Combat attribute with a permanent base and an avatar bonus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stat {
    pub base: u32,
    pub bonus: u32,
}

impl Stat {
    pub const fn new(base: u32) -> Self {
        Self { base, bonus: 0 }
    }

    pub const fn total(self) -> u32 {
        self.base + self.bonus
    }
}

/// Die thrown for an attack or defense roll.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DiceKind {
    D4,
    #[default]
    D6,
}

impl DiceKind {
    pub const fn sides(self) -> u32 {
        match self {
            DiceKind::D4 => 4,
            DiceKind::D6 => 6,
        }
    }
}

/// Hit points, always kept within `[0, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Health {
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn set(&mut self, value: u32) -> u32 {
        self.current = value.min(self.max);
        self.current
    }

    pub fn restore(&mut self) {
        self.current = self.max;
    }

    pub const fn is_depleted(self) -> bool {
        self.current == 0
    }
}

/// Per-session combat statistics of a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatRecord {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub count: u32,
}

/// A participant in a session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Player {
    pub id: PlayerId,
    pub position: Position,
    pub speed: MovementPoints,
    pub boat_speed: MovementPoints,
    pub attack: Stat,
    pub defense: Stat,
    pub attack_die: DiceKind,
    pub defense_die: DiceKind,
    pub health: Health,
    pub actions_remaining: u32,
    /// False once the player disconnected or was removed from the match.
    pub in_game: bool,
    /// Team number in capture-the-flag sessions.
    pub team: Option<u8>,
    pub combat: CombatRecord,
    pub on_boat: Option<PlaceableId>,
    /// Granted by a sanctuary; cleared when the player's turn ends.
    pub combat_bonus: bool,
    /// Driven by a script rather than a human.
    pub scripted: bool,
}

impl Player {
    pub const DEFAULT_HEALTH: u32 = 4;
    pub const DEFAULT_SPEED: u32 = 4;
    pub const DEFAULT_BOAT_SPEED: u32 = 2;
    pub const DEFAULT_ATTACK: u32 = 4;
    pub const DEFAULT_DEFENSE: u32 = 4;

    pub fn new(id: PlayerId, position: Position) -> Self {
        Self {
            id,
            position,
            speed: MovementPoints::new(Self::DEFAULT_SPEED),
            boat_speed: MovementPoints::new(Self::DEFAULT_BOAT_SPEED),
            attack: Stat::new(Self::DEFAULT_ATTACK),
            defense: Stat::new(Self::DEFAULT_DEFENSE),
            attack_die: DiceKind::D6,
            defense_die: DiceKind::D4,
            health: Health::new(Self::DEFAULT_HEALTH),
            actions_remaining: 0,
            in_game: true,
            team: None,
            combat: CombatRecord::default(),
            on_boat: None,
            combat_bonus: false,
            scripted: false,
        }
    }

    pub fn with_speed(mut self, base: u32) -> Self {
        self.speed = MovementPoints::new(base);
        self
    }

    pub fn with_boat_speed(mut self, base: u32) -> Self {
        self.boat_speed = MovementPoints::new(base);
        self
    }

    pub fn with_attack(mut self, base: u32) -> Self {
        self.attack = Stat::new(base);
        self
    }

    pub fn with_defense(mut self, base: u32) -> Self {
        self.defense = Stat::new(base);
        self
    }

    pub fn with_dice(mut self, attack_die: DiceKind, defense_die: DiceKind) -> Self {
        self.attack_die = attack_die;
        self.defense_die = defense_die;
        self
    }

    pub fn with_health(mut self, max: u32) -> Self {
        self.health = Health::new(max);
        self
    }

    pub fn with_team(mut self, team: u8) -> Self {
        self.team = Some(team);
        self
    }

    pub fn scripted(mut self) -> Self {
        self.scripted = true;
        self
    }

    /// Movement points usable right now. Boat speed only counts while aboard.
    pub fn movement_budget(&self) -> u32 {
        let boat = if self.on_boat.is_some() {
            self.boat_speed.current
        } else {
            0
        };
        self.speed.current + boat
    }

    /// Charges a movement cost against speed first, then boat speed.
    pub fn spend_movement(&mut self, cost: u32) {
        let rest = self.speed.spend(cost);
        if rest > 0 {
            self.boat_speed.spend(rest);
        }
    }

    pub fn is_teammate(&self, other: &Player) -> bool {
        matches!((self.team, other.team), (Some(a), Some(b)) if a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spend_movement_drains_speed_before_boat_speed() {
        let mut player = Player::new(PlayerId(1), Position::ORIGIN)
            .with_speed(2)
            .with_boat_speed(3);
        player.speed.refill();
        player.boat_speed.refill();
        player.on_boat = Some(PlaceableId(7));

        player.spend_movement(4);

        assert_eq!(player.speed.current, 0);
        assert_eq!(player.boat_speed.current, 1);
        assert_eq!(player.movement_budget(), 1);
    }

    #[test]
    fn boat_speed_ignored_on_land() {
        let mut player = Player::new(PlayerId(1), Position::ORIGIN).with_speed(3);
        player.speed.refill();
        player.boat_speed.refill();
        assert_eq!(player.movement_budget(), 3);
    }

    #[test]
    fn health_set_is_clamped() {
        let mut health = Health::new(5);
        assert_eq!(health.set(9), 5);
        assert_eq!(health.set(0), 0);
        assert!(health.is_depleted());
    }

    #[test]
    fn teammates_require_matching_teams() {
        let a = Player::new(PlayerId(1), Position::ORIGIN).with_team(1);
        let b = Player::new(PlayerId(2), Position::ORIGIN).with_team(1);
        let c = Player::new(PlayerId(3), Position::ORIGIN);
        assert!(a.is_teammate(&b));
        assert!(!a.is_teammate(&c));
    }
}
