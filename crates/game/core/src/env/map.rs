use std::collections::BTreeMap;

use crate::config::GameConfig;
use crate::state::{Placeable, PlayerId, Position, SessionId};

/// Read-only map-shape queries, answered per session.
///
/// Occupancy and placeables change during play, so they are answered from
/// live session state; terrain and teleport pairing come from the static layout.
pub trait GridQuery: Send + Sync {
    fn tile_at(&self, session: SessionId, position: Position) -> Option<TileKind>;

    /// In-game player standing on `position`.
    fn occupant_at(&self, session: SessionId, position: Position) -> Option<PlayerId>;

    /// Side length of the session's square map.
    fn map_size(&self, session: SessionId) -> Option<u32>;

    /// Paired exit of the teleport tile at `position`.
    fn teleport_destination(&self, session: SessionId, position: Position) -> Option<Position>;

    fn placeables_at(&self, session: SessionId, position: Position) -> Vec<Placeable>;

    fn contains(&self, session: SessionId, position: Position) -> bool {
        self.map_size(session)
            .is_some_and(|size| position.within(size))
    }
}

/// Terrain class of a tile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum TileKind {
    #[default]
    Ground,
    Wall,
    Water,
    Ice,
    Door {
        open: bool,
    },
    Teleport,
}

impl TileKind {
    /// Walls and closed doors can never be entered.
    pub const fn is_passable(self) -> bool {
        !matches!(self, TileKind::Wall | TileKind::Door { open: false })
    }

    /// Tiles a respawning player may be placed on.
    pub const fn is_spawnable(self) -> bool {
        matches!(
            self,
            TileKind::Ground | TileKind::Ice | TileKind::Door { open: true }
        )
    }

    /// Attack/defense modifier for a combatant standing on this tile.
    pub fn combat_effect(self, config: &GameConfig) -> TileEffect {
        match self {
            TileKind::Ice => {
                let penalty = -(config.ice_penalty as i32);
                TileEffect::new(penalty, penalty)
            }
            _ => TileEffect::NONE,
        }
    }
}

/// Tile-derived bonus (positive) or penalty (negative) to combat rolls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileEffect {
    pub attack: i32,
    pub defense: i32,
}

impl TileEffect {
    pub const NONE: Self = Self {
        attack: 0,
        defense: 0,
    };

    pub const fn new(attack: i32, defense: i32) -> Self {
        Self { attack, defense }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("row {row} has {found} tiles, expected {expected}")]
    Ragged {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("unknown tile glyph '{glyph}' at {position}")]
    UnknownGlyph { glyph: char, position: Position },

    #[error("teleport at {0} has no partner")]
    UnpairedTeleport(Position),
}

/// Static terrain of a square map plus its teleport pairs.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridLayout {
    size: u32,
    tiles: Vec<TileKind>,
    teleports: BTreeMap<Position, Position>,
}

impl GridLayout {
    /// A map of plain ground.
    pub fn new(size: u32) -> Self {
        Self {
            size,
            tiles: vec![TileKind::Ground; (size as usize) * (size as usize)],
            teleports: BTreeMap::new(),
        }
    }

    /// Parses a map drawn as text, one string per row.
    ///
    /// ```text
    /// .  ground     #  wall      ~  water     *  ice
    /// D  closed door            d  open door
    /// T  teleport (paired with the next T in reading order)
    /// ```
    pub fn from_rows(rows: &[&str]) -> Result<Self, LayoutError> {
        let size = rows.len();
        let mut layout = Self::new(size as u32);
        let mut pending_teleport: Option<Position> = None;

        for (y, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != size {
                return Err(LayoutError::Ragged {
                    row: y,
                    found,
                    expected: size,
                });
            }
            for (x, glyph) in row.chars().enumerate() {
                let position = Position::new(x as i32, y as i32);
                let tile = match glyph {
                    '.' => TileKind::Ground,
                    '#' => TileKind::Wall,
                    '~' => TileKind::Water,
                    '*' => TileKind::Ice,
                    'D' => TileKind::Door { open: false },
                    'd' => TileKind::Door { open: true },
                    'T' => TileKind::Teleport,
                    _ => return Err(LayoutError::UnknownGlyph { glyph, position }),
                };
                layout.set_tile(position, tile);
                if tile == TileKind::Teleport {
                    match pending_teleport.take() {
                        Some(first) => layout.link_teleports(first, position),
                        None => pending_teleport = Some(position),
                    }
                }
            }
        }

        match pending_teleport {
            Some(position) => Err(LayoutError::UnpairedTeleport(position)),
            None => Ok(layout),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    fn index(&self, position: Position) -> Option<usize> {
        position
            .within(self.size)
            .then(|| position.y as usize * self.size as usize + position.x as usize)
    }

    pub fn tile(&self, position: Position) -> Option<TileKind> {
        self.index(position).map(|index| self.tiles[index])
    }

    /// Overwrites a tile. Positions outside the map are ignored.
    pub fn set_tile(&mut self, position: Position, tile: TileKind) {
        if let Some(index) = self.index(position) {
            self.tiles[index] = tile;
        }
    }

    /// Links two teleport tiles in both directions.
    pub fn link_teleports(&mut self, a: Position, b: Position) {
        self.set_tile(a, TileKind::Teleport);
        self.set_tile(b, TileKind::Teleport);
        self.teleports.insert(a, b);
        self.teleports.insert(b, a);
    }

    pub fn teleport_destination(&self, position: Position) -> Option<Position> {
        self.teleports.get(&position).copied()
    }
}
