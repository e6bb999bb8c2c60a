//! Single-session store used by the unit tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::GameConfig;
use crate::env::{GameEnv, GridLayout, GridQuery, SessionStore, StoreError, TileKind};
use crate::events::RecordingSink;
use crate::state::{
    FlagRecord, PlaceableId, Placeable, Player, PlayerId, Position, Session, SessionId,
    TurnDescriptor,
};

pub(crate) struct Fixture {
    session: Mutex<Session>,
    layout: GridLayout,
    pub events: RecordingSink,
    pub config: GameConfig,
}

impl Fixture {
    pub fn new(session: Session, rows: &[&str]) -> Self {
        let layout = GridLayout::from_rows(rows).unwrap();
        let session = Session {
            map_size: layout.size(),
            ..session
        };
        Self {
            session: Mutex::new(session),
            layout,
            events: RecordingSink::new(),
            config: GameConfig::default(),
        }
    }

    pub fn env(&self) -> GameEnv<'_> {
        GameEnv::new(self, self, &self.events, &self.config)
    }

    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    pub fn player(&self, id: PlayerId) -> Player {
        self.snapshot().player(id).cloned().unwrap()
    }

    /// Refills the player's movement as at turn start.
    pub fn grant_turn(&self, id: PlayerId) {
        let mut session = self.lock();
        let player = session.player_mut(id).unwrap();
        player.speed.refill();
        player.boat_speed.refill();
        player.actions_remaining = 1;
        session.turn.active = Some(id);
    }

    pub fn edit(&self, update: impl FnOnce(&mut Session)) {
        update(&mut self.lock());
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, session: SessionId) -> Result<MutexGuard<'_, Session>, StoreError> {
        let guard = self.lock();
        if guard.id == session {
            Ok(guard)
        } else {
            Err(StoreError::SessionNotFound(session))
        }
    }
}

fn player_of(session: &mut Session, player: PlayerId) -> Result<&mut Player, StoreError> {
    let id = session.id;
    session
        .player_mut(player)
        .ok_or(StoreError::PlayerNotFound {
            session: id,
            player,
        })
}

impl SessionStore for Fixture {
    fn find_by_id(&self, session: SessionId) -> Result<Session, StoreError> {
        Ok(self.check(session)?.clone())
    }

    fn move_player_position(
        &self,
        session: SessionId,
        player: PlayerId,
        position: Position,
    ) -> Result<(), StoreError> {
        player_of(&mut *self.check(session)?, player)?.position = position;
        Ok(())
    }

    fn update_player(
        &self,
        session: SessionId,
        player: PlayerId,
        update: &mut dyn FnMut(&mut Player),
    ) -> Result<Player, StoreError> {
        let mut guard = self.check(session)?;
        let player = player_of(&mut guard, player)?;
        update(player);
        Ok(player.clone())
    }

    fn set_health(
        &self,
        session: SessionId,
        player: PlayerId,
        value: u32,
    ) -> Result<u32, StoreError> {
        Ok(player_of(&mut *self.check(session)?, player)?.health.set(value))
    }

    fn set_flag(&self, session: SessionId, flag: Option<FlagRecord>) -> Result<(), StoreError> {
        self.check(session)?.flag = flag;
        Ok(())
    }

    fn find_start_point(
        &self,
        session: SessionId,
        player: PlayerId,
    ) -> Result<Position, StoreError> {
        self.check(session)?
            .start_points
            .get(&player)
            .copied()
            .ok_or(StoreError::StartPointNotFound { session, player })
    }

    fn set_turn(&self, session: SessionId, turn: TurnDescriptor) -> Result<(), StoreError> {
        self.check(session)?.turn = turn;
        Ok(())
    }

    fn update_turn(
        &self,
        session: SessionId,
        update: &mut dyn FnMut(&mut TurnDescriptor),
    ) -> Result<TurnDescriptor, StoreError> {
        let mut guard = self.check(session)?;
        update(&mut guard.turn);
        Ok(guard.turn)
    }

    fn move_placeable(
        &self,
        session: SessionId,
        placeable: PlaceableId,
        position: Position,
    ) -> Result<(), StoreError> {
        let mut guard = self.check(session)?;
        let found = guard
            .placeables
            .iter_mut()
            .find(|p| p.id == placeable)
            .ok_or(StoreError::PlaceableNotFound { session, placeable })?;
        found.position = position;
        Ok(())
    }

    fn tick_disabled_placeables(&self, session: SessionId) -> Result<(), StoreError> {
        let mut guard = self.check(session)?;
        guard.disabled_placeables.retain(|_, turns| {
            *turns = turns.saturating_sub(1);
            *turns > 0
        });
        Ok(())
    }

    fn disable_placeable(
        &self,
        session: SessionId,
        placeable: PlaceableId,
        turns: u32,
    ) -> Result<(), StoreError> {
        self.check(session)?
            .disabled_placeables
            .insert(placeable, turns);
        Ok(())
    }

    fn set_winner(&self, session: SessionId, winner: Option<PlayerId>) -> Result<(), StoreError> {
        let mut guard = self.check(session)?;
        guard.winner = winner;
        guard.finished = true;
        Ok(())
    }
}

impl GridQuery for Fixture {
    fn tile_at(&self, _session: SessionId, position: Position) -> Option<TileKind> {
        self.layout.tile(position)
    }

    fn occupant_at(&self, _session: SessionId, position: Position) -> Option<PlayerId> {
        self.lock().occupant(position)
    }

    fn map_size(&self, _session: SessionId) -> Option<u32> {
        Some(self.layout.size())
    }

    fn teleport_destination(&self, _session: SessionId, position: Position) -> Option<Position> {
        self.layout.teleport_destination(position)
    }

    fn placeables_at(&self, _session: SessionId, position: Position) -> Vec<Placeable> {
        self.lock().placeables_at(position).copied().collect()
    }
}
