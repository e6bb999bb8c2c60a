use super::{PlaceableId, Position};

/// Object that sits on a tile without being part of the terrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum PlaceableKind {
    /// Can be boarded; carries its rider across water.
    Boat,
    /// Offers a heal or a fight bonus, then goes dormant for a few turns.
    Sanctuary,
    /// Cosmetic marker of a team's flag base.
    FlagBase,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placeable {
    pub id: PlaceableId,
    pub kind: PlaceableKind,
    pub position: Position,
}

impl Placeable {
    pub const fn new(id: PlaceableId, kind: PlaceableKind, position: Position) -> Self {
        Self { id, kind, position }
    }
}
