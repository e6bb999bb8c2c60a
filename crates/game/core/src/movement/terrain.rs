use crate::config::{GameConfig, WaterRule};
use crate::env::{GridQuery, TileKind};
use crate::state::{PlaceableId, PlayerId, Position, Session};

/// Result of entering one tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Step {
    pub cost: u32,
    /// Where the mover ends up; differs from the entered tile after a teleport.
    pub landing: Position,
    /// Whether the mover is on a boat after the step.
    pub afloat: bool,
    /// Free boat boarded by this step.
    pub boards: Option<PlaceableId>,
    pub teleported: bool,
}

/// Movement rules for one mover, evaluated against live session state.
pub(crate) struct Terrain<'a> {
    grid: &'a dyn GridQuery,
    session: &'a Session,
    config: &'a GameConfig,
    mover: PlayerId,
}

impl<'a> Terrain<'a> {
    pub fn new(
        grid: &'a dyn GridQuery,
        session: &'a Session,
        config: &'a GameConfig,
        mover: PlayerId,
    ) -> Self {
        Self {
            grid,
            session,
            config,
            mover,
        }
    }

    /// Movement cost of a tile, `None` when it cannot be entered.
    pub fn tile_cost(&self, tile: TileKind, afloat: bool) -> Option<u32> {
        match tile {
            TileKind::Wall | TileKind::Door { open: false } => None,
            TileKind::Ground | TileKind::Teleport => Some(GameConfig::GROUND_COST),
            TileKind::Ice => Some(GameConfig::ICE_COST),
            TileKind::Door { open: true } => Some(self.config.open_door_cost),
            TileKind::Water if afloat => Some(GameConfig::BOAT_WATER_COST),
            TileKind::Water => match self.config.water_rule {
                WaterRule::Wade { cost } => Some(cost),
                WaterRule::Impassable => None,
            },
        }
    }

    /// Another player stands on `position`.
    pub fn occupied_by_other(&self, position: Position) -> bool {
        self.grid
            .occupant_at(self.session.id, position)
            .is_some_and(|occupant| occupant != self.mover)
    }

    fn free_boat(&self, position: Position) -> Option<PlaceableId> {
        self.session.free_boat_at(position)
    }

    /// Paired exit of a teleport, if it can take the mover right now.
    ///
    /// The exit must be inside the map, enterable on foot and not held by
    /// another player.
    pub fn teleport_exit(&self, position: Position) -> Option<Position> {
        let exit = self.grid.teleport_destination(self.session.id, position)?;
        let tile = self.grid.tile_at(self.session.id, exit)?;
        let usable = self.grid.contains(self.session.id, exit)
            && self.tile_cost(tile, false).is_some()
            && !self.occupied_by_other(exit);
        usable.then_some(exit)
    }

    /// Enters `position` from a neighbouring tile.
    pub fn enter(&self, position: Position, afloat: bool) -> Option<Step> {
        let tile = self.grid.tile_at(self.session.id, position)?;
        if !tile.is_passable() || self.occupied_by_other(position) {
            return None;
        }

        if !afloat && let Some(boat) = self.free_boat(position) {
            return Some(Step {
                cost: GameConfig::BOAT_WATER_COST,
                landing: position,
                afloat: true,
                boards: Some(boat),
                teleported: false,
            });
        }

        let cost = self.tile_cost(tile, afloat)?;
        let step = match tile {
            TileKind::Teleport => match self.teleport_exit(position) {
                Some(exit) => Step {
                    cost,
                    landing: exit,
                    afloat: false,
                    boards: None,
                    teleported: true,
                },
                None => Step::walk(cost, position, false),
            },
            TileKind::Water => Step::walk(cost, position, afloat),
            _ => Step::walk(cost, position, false),
        };
        Some(step)
    }
}

impl Step {
    fn walk(cost: u32, landing: Position, afloat: bool) -> Self {
        Self {
            cost,
            landing,
            afloat,
            boards: None,
            teleported: false,
        }
    }
}
