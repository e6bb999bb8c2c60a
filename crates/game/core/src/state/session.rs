use std::collections::BTreeMap;

use super::{
    Placeable, PlaceableId, PlaceableKind, Player, PlayerId, Position, SessionId, TurnDescriptor,
};

/// Win condition of a session.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum GameMode {
    /// First player to reach the configured number of duel wins.
    #[default]
    Elimination,
    /// Carry the flag back to your own start point.
    CaptureTheFlag,
}

/// Location of the flag and who carries it, if anyone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlagRecord {
    pub holder: Option<PlayerId>,
    pub position: Position,
}

impl FlagRecord {
    pub const fn on_ground(position: Position) -> Self {
        Self {
            holder: None,
            position,
        }
    }
}

/// Mutable state of one session, owned by the session store.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Session {
    pub id: SessionId,
    /// Side length of the square map.
    pub map_size: u32,
    pub mode: GameMode,
    pub turn_order: Vec<PlayerId>,
    pub turn: TurnDescriptor,
    pub players: BTreeMap<PlayerId, Player>,
    pub flag: Option<FlagRecord>,
    pub start_points: BTreeMap<PlayerId, Position>,
    pub placeables: Vec<Placeable>,
    /// Placeables that cannot be used for the given number of turns.
    pub disabled_placeables: BTreeMap<PlaceableId, u32>,
    /// Admin/debug mode: dice are loaded in the attacker's favour.
    pub unrestricted: bool,
    /// Seed for the session's dice rolls.
    pub seed: u64,
    pub winner: Option<PlayerId>,
    pub finished: bool,
}

impl Session {
    pub fn new(id: SessionId, map_size: u32, mode: GameMode) -> Self {
        Self {
            id,
            map_size,
            mode,
            turn_order: Vec::new(),
            turn: TurnDescriptor::default(),
            players: BTreeMap::new(),
            flag: None,
            start_points: BTreeMap::new(),
            placeables: Vec::new(),
            disabled_placeables: BTreeMap::new(),
            unrestricted: false,
            seed: 0,
            winner: None,
            finished: false,
        }
    }

    /// Adds a player at their start point and appends them to the turn order.
    pub fn with_player(mut self, player: Player) -> Self {
        self.turn_order.push(player.id);
        self.start_points.insert(player.id, player.position);
        self.players.insert(player.id, player);
        self
    }

    pub fn with_placeable(mut self, placeable: Placeable) -> Self {
        self.placeables.push(placeable);
        self
    }

    pub fn with_flag(mut self, position: Position) -> Self {
        self.flag = Some(FlagRecord::on_ground(position));
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn unrestricted(mut self) -> Self {
        self.unrestricted = true;
        self
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn is_in_game(&self, id: PlayerId) -> bool {
        self.player(id).is_some_and(|player| player.in_game)
    }

    pub fn in_game_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|player| player.in_game)
    }

    /// In-game player standing on `position`.
    pub fn occupant(&self, position: Position) -> Option<PlayerId> {
        self.in_game_players()
            .find(|player| player.position == position)
            .map(|player| player.id)
    }

    pub fn placeable(&self, id: PlaceableId) -> Option<&Placeable> {
        self.placeables.iter().find(|placeable| placeable.id == id)
    }

    pub fn placeables_at(&self, position: Position) -> impl Iterator<Item = &Placeable> {
        self.placeables
            .iter()
            .filter(move |placeable| placeable.position == position)
    }

    /// Boat on `position` that nobody is riding.
    pub fn free_boat_at(&self, position: Position) -> Option<PlaceableId> {
        self.placeables_at(position)
            .filter(|placeable| placeable.kind == PlaceableKind::Boat)
            .map(|placeable| placeable.id)
            .find(|&boat| !self.players.values().any(|p| p.on_boat == Some(boat)))
    }

    pub fn is_disabled(&self, id: PlaceableId) -> bool {
        self.disabled_placeables.contains_key(&id)
    }
}
