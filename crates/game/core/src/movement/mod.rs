//! Grid movement: reachability, single steps and respawn.
//!
//! Tile costs:
//!
//! | tile        | cost                                   |
//! |-------------|----------------------------------------|
//! | ground      | 1                                      |
//! | ice         | 0                                      |
//! | open door   | `open_door_cost`                       |
//! | water       | 1 on a boat, otherwise per `WaterRule` |
//! | wall, door  | impassable                             |
//!
//! Tiles held by another player are neither stopping points nor
//! thoroughfares. Entering a teleport whose exit is free lands on the exit.
mod reachable;
mod terrain;

use std::collections::{BTreeSet, VecDeque};

use crate::env::GameEnv;
use crate::error::{Missing, Result, RuleViolation};
use crate::events::{ReachableRequest, ReachableTile, SessionEvent};
use crate::state::{
    FlagRecord, GameMode, Orientation, Player, PlayerId, Position, Session, SessionId,
};

use terrain::Terrain;

/// Result of a successful single-step move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub position: Position,
    pub remaining_speed: u32,
    pub flag_picked_up: bool,
    /// Set when the move won a capture-the-flag game.
    pub winner: Option<PlayerId>,
}

pub struct MovementEngine<'a> {
    env: GameEnv<'a>,
}

impl<'a> MovementEngine<'a> {
    pub fn new(env: GameEnv<'a>) -> Self {
        Self { env }
    }

    fn load(&self, session: SessionId, player: PlayerId) -> Result<(Session, Player)> {
        let snapshot = self.env.store.find_by_id(session)?;
        let player = snapshot
            .player(player)
            .cloned()
            .ok_or(Missing::Player(player))?;
        Ok((snapshot, player))
    }

    /// Tiles the player can stop on with their current movement points.
    ///
    /// Always publishes [`SessionEvent::PlayerReachableTiles`], even when the
    /// result is empty.
    pub fn compute_reachable(
        &self,
        session: SessionId,
        player: PlayerId,
    ) -> Result<Vec<ReachableTile>> {
        let (snapshot, mover) = self.load(session, player)?;
        let terrain = Terrain::new(self.env.grid, &snapshot, self.env.config, player);
        let budget = mover.movement_budget();
        let tiles = reachable::search(&terrain, &mover);

        self.env.events.publish(SessionEvent::PlayerReachableTiles {
            session,
            request: ReachableRequest {
                player,
                origin: mover.position,
                budget,
            },
            tiles: tiles.clone(),
        });
        Ok(tiles)
    }

    /// Moves the player one tile in `orientation`.
    pub fn move_player(
        &self,
        session: SessionId,
        player: PlayerId,
        orientation: Orientation,
    ) -> Result<MoveOutcome> {
        let (snapshot, mover) = self.load(session, player)?;
        if snapshot.finished {
            return Err(RuleViolation::GameFinished.into());
        }

        let from = mover.position;
        let target = from.step(orientation);
        if !self.env.grid.contains(session, target) {
            return Err(Missing::Tile(target).into());
        }

        let terrain = Terrain::new(self.env.grid, &snapshot, self.env.config, player);
        let step = terrain
            .enter(target, mover.on_boat.is_some())
            .ok_or(RuleViolation::Blocked { position: target })?;
        let available = mover.movement_budget();
        if step.cost > available {
            return Err(RuleViolation::InsufficientMovement {
                required: step.cost,
                available,
            }
            .into());
        }

        let riding = mover.on_boat;
        let moved = self.env.store.update_player(session, player, &mut |p: &mut Player| {
            p.spend_movement(step.cost);
            if let Some(boat) = step.boards {
                p.on_boat = Some(boat);
            }
            if !step.afloat {
                p.on_boat = None;
            }
        })?;
        self.env
            .store
            .move_player_position(session, player, step.landing)?;
        if let Some(boat) = riding
            && step.afloat
        {
            self.env.store.move_placeable(session, boat, step.landing)?;
        }

        let remaining_speed = moved.movement_budget();
        self.env.events.publish(SessionEvent::PlayerMoved {
            session,
            player,
            from,
            to: step.landing,
            remaining_speed,
            boat: moved.on_boat,
        });

        let mut outcome = MoveOutcome {
            position: step.landing,
            remaining_speed,
            flag_picked_up: false,
            winner: None,
        };
        if snapshot.mode == GameMode::CaptureTheFlag {
            self.carry_flag(&snapshot, player, step.landing, &mut outcome)?;
        }

        self.compute_reachable(session, player)?;
        Ok(outcome)
    }

    fn carry_flag(
        &self,
        snapshot: &Session,
        player: PlayerId,
        landing: Position,
        outcome: &mut MoveOutcome,
    ) -> Result<()> {
        let Some(flag) = snapshot.flag else {
            return Ok(());
        };
        let session = snapshot.id;
        match flag.holder {
            None if flag.position == landing => {
                self.env.store.set_flag(
                    session,
                    Some(FlagRecord {
                        holder: Some(player),
                        position: landing,
                    }),
                )?;
                self.env.events.publish(SessionEvent::FlagPickedUp {
                    session,
                    player,
                    position: landing,
                });
                outcome.flag_picked_up = true;
            }
            Some(holder) if holder == player => {
                self.env.store.set_flag(
                    session,
                    Some(FlagRecord {
                        holder: Some(player),
                        position: landing,
                    }),
                )?;
            }
            _ => return Ok(()),
        }

        let home = self.env.store.find_start_point(session, player)?;
        if home == landing {
            outcome.winner = Some(player);
        }
        Ok(())
    }

    /// Leaves a carried flag on `position`. Returns whether a flag was dropped.
    pub fn drop_flag(
        &self,
        session: SessionId,
        player: PlayerId,
        position: Position,
    ) -> Result<bool> {
        let snapshot = self.env.store.find_by_id(session)?;
        match snapshot.flag {
            Some(flag) if flag.holder == Some(player) => {
                self.env
                    .store
                    .set_flag(session, Some(FlagRecord::on_ground(position)))?;
                self.env.events.publish(SessionEvent::FlagDropped {
                    session,
                    player,
                    position,
                });
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Respawns the player at their start point, or at the nearest free tile
    /// around it, with full health and no boat.
    pub fn move_to_start_position(
        &self,
        session: SessionId,
        player: PlayerId,
    ) -> Result<Position> {
        let (snapshot, _) = self.load(session, player)?;
        let start = self.env.store.find_start_point(session, player)?;
        let terrain = Terrain::new(self.env.grid, &snapshot, self.env.config, player);
        let position = self
            .nearest_spawn(&terrain, session, start)
            .ok_or(Missing::SpawnTile(player))?;

        self.env
            .store
            .move_player_position(session, player, position)?;
        let respawned = self
            .env
            .store
            .update_player(session, player, &mut |p: &mut Player| p.on_boat = None)?;
        self.env
            .store
            .set_health(session, player, respawned.health.max)?;

        self.env.events.publish(SessionEvent::PlayerRespawned {
            session,
            player,
            position,
        });
        Ok(position)
    }

    /// Breadth-first search outward from `start`, ignoring movement points.
    fn nearest_spawn(
        &self,
        terrain: &Terrain<'_>,
        session: SessionId,
        start: Position,
    ) -> Option<Position> {
        let grid = self.env.grid;
        let spawnable = |position: Position| {
            grid.tile_at(session, position)
                .is_some_and(|tile| tile.is_spawnable())
                && !terrain.occupied_by_other(position)
        };

        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(position) = queue.pop_front() {
            if spawnable(position) {
                return Some(position);
            }
            for neighbor in position.neighbors() {
                if grid.contains(session, neighbor) && seen.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        None
    }
}
