//! In-memory session store for tests and local runs.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use game_core::{
    FlagRecord, GridLayout, GridQuery, Placeable, PlaceableId, Player, PlayerId, Position,
    Session, SessionId, SessionStore, StoreError, TileKind, TurnDescriptor,
};

struct SessionRecord {
    session: Session,
    layout: GridLayout,
}

/// Holds every registered session together with its static map.
///
/// Serves both [`SessionStore`] and [`GridQuery`]: terrain comes from the
/// session's [`GridLayout`], occupants from its live player positions.
/// Poisoned locks are recovered; every mutator leaves the record consistent
/// before it can panic.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a session. The map size is taken from the layout.
    /// Returns `false` if the id is already taken.
    pub fn insert(&self, session: Session, layout: GridLayout) -> bool {
        let mut sessions = self.write();
        if sessions.contains_key(&session.id) {
            return false;
        }
        let session = Session {
            map_size: layout.size(),
            ..session
        };
        sessions.insert(session.id, SessionRecord { session, layout });
        true
    }

    pub fn remove(&self, session: SessionId) -> Option<Session> {
        self.write().remove(&session).map(|record| record.session)
    }

    /// Applies `update` to a registered session. Returns `false` if unknown.
    pub fn edit(&self, session: SessionId, update: impl FnOnce(&mut Session)) -> bool {
        match self.write().get_mut(&session) {
            Some(record) => {
                update(&mut record.session);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, session: SessionId) -> bool {
        self.read().contains_key(&session)
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, SessionRecord>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, SessionRecord>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_session<T>(
        &self,
        session: SessionId,
        update: impl FnOnce(&mut Session) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut sessions = self.write();
        let record = sessions
            .get_mut(&session)
            .ok_or(StoreError::SessionNotFound(session))?;
        update(&mut record.session)
    }

    fn with_player<T>(
        &self,
        session: SessionId,
        player: PlayerId,
        update: impl FnOnce(&mut Player) -> T,
    ) -> Result<T, StoreError> {
        self.with_session(session, |state| {
            let found = state
                .player_mut(player)
                .ok_or(StoreError::PlayerNotFound { session, player })?;
            Ok(update(found))
        })
    }

    fn inspect<T>(&self, session: SessionId, read: impl FnOnce(&SessionRecord) -> T) -> Option<T> {
        self.read().get(&session).map(read)
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn find_by_id(&self, session: SessionId) -> Result<Session, StoreError> {
        self.inspect(session, |record| record.session.clone())
            .ok_or(StoreError::SessionNotFound(session))
    }

    fn move_player_position(
        &self,
        session: SessionId,
        player: PlayerId,
        position: Position,
    ) -> Result<(), StoreError> {
        self.with_player(session, player, |p| p.position = position)
    }

    fn update_player(
        &self,
        session: SessionId,
        player: PlayerId,
        update: &mut dyn FnMut(&mut Player),
    ) -> Result<Player, StoreError> {
        self.with_player(session, player, |p| {
            update(p);
            p.clone()
        })
    }

    fn set_health(
        &self,
        session: SessionId,
        player: PlayerId,
        value: u32,
    ) -> Result<u32, StoreError> {
        self.with_player(session, player, |p| p.health.set(value))
    }

    fn set_flag(&self, session: SessionId, flag: Option<FlagRecord>) -> Result<(), StoreError> {
        self.with_session(session, |state| {
            state.flag = flag;
            Ok(())
        })
    }

    fn find_start_point(
        &self,
        session: SessionId,
        player: PlayerId,
    ) -> Result<Position, StoreError> {
        self.inspect(session, |record| {
            record.session.start_points.get(&player).copied()
        })
        .ok_or(StoreError::SessionNotFound(session))?
        .ok_or(StoreError::StartPointNotFound { session, player })
    }

    fn set_turn(&self, session: SessionId, turn: TurnDescriptor) -> Result<(), StoreError> {
        self.with_session(session, |state| {
            state.turn = turn;
            Ok(())
        })
    }

    fn update_turn(
        &self,
        session: SessionId,
        update: &mut dyn FnMut(&mut TurnDescriptor),
    ) -> Result<TurnDescriptor, StoreError> {
        self.with_session(session, |state| {
            update(&mut state.turn);
            Ok(state.turn)
        })
    }

    fn move_placeable(
        &self,
        session: SessionId,
        placeable: PlaceableId,
        position: Position,
    ) -> Result<(), StoreError> {
        self.with_session(session, |state| {
            let found = state
                .placeables
                .iter_mut()
                .find(|p| p.id == placeable)
                .ok_or(StoreError::PlaceableNotFound { session, placeable })?;
            found.position = position;
            Ok(())
        })
    }

    fn tick_disabled_placeables(&self, session: SessionId) -> Result<(), StoreError> {
        self.with_session(session, |state| {
            state.disabled_placeables.retain(|_, turns| {
                *turns = turns.saturating_sub(1);
                *turns > 0
            });
            Ok(())
        })
    }

    fn disable_placeable(
        &self,
        session: SessionId,
        placeable: PlaceableId,
        turns: u32,
    ) -> Result<(), StoreError> {
        self.with_session(session, |state| {
            if turns == 0 {
                state.disabled_placeables.remove(&placeable);
            } else {
                state.disabled_placeables.insert(placeable, turns);
            }
            Ok(())
        })
    }

    fn set_winner(&self, session: SessionId, winner: Option<PlayerId>) -> Result<(), StoreError> {
        self.with_session(session, |state| {
            state.winner = winner;
            state.finished = true;
            Ok(())
        })
    }
}

impl GridQuery for InMemorySessionStore {
    fn tile_at(&self, session: SessionId, position: Position) -> Option<TileKind> {
        self.inspect(session, |record| record.layout.tile(position))
            .flatten()
    }

    fn occupant_at(&self, session: SessionId, position: Position) -> Option<PlayerId> {
        self.inspect(session, |record| record.session.occupant(position))
            .flatten()
    }

    fn map_size(&self, session: SessionId) -> Option<u32> {
        self.inspect(session, |record| record.layout.size())
    }

    fn teleport_destination(&self, session: SessionId, position: Position) -> Option<Position> {
        self.inspect(session, |record| record.layout.teleport_destination(position))
            .flatten()
    }

    fn placeables_at(&self, session: SessionId, position: Position) -> Vec<Placeable> {
        self.inspect(session, |record| {
            record.session.placeables_at(position).copied().collect()
        })
        .unwrap_or_default()
    }
}
