use crate::state::{
    FlagRecord, PlaceableId, Player, PlayerId, Position, Session, SessionId, TurnDescriptor,
};

/// Failure of a [`SessionStore`] lookup or mutator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    SessionNotFound(SessionId),

    #[error("player {player} not found in {session}")]
    PlayerNotFound { session: SessionId, player: PlayerId },

    #[error("no start point for player {player} in {session}")]
    StartPointNotFound { session: SessionId, player: PlayerId },

    #[error("{placeable} not found in {session}")]
    PlaceableNotFound {
        session: SessionId,
        placeable: PlaceableId,
    },
}

/// Authoritative per-session state.
///
/// Reads hand out owned snapshots; every mutator is atomic with respect to
/// the session it touches.
pub trait SessionStore: Send + Sync {
    fn find_by_id(&self, session: SessionId) -> Result<Session, StoreError>;

    fn move_player_position(
        &self,
        session: SessionId,
        player: PlayerId,
        position: Position,
    ) -> Result<(), StoreError>;

    /// Applies `update` to the player and returns the updated copy.
    fn update_player(
        &self,
        session: SessionId,
        player: PlayerId,
        update: &mut dyn FnMut(&mut Player),
    ) -> Result<Player, StoreError>;

    /// Sets health, clamped to `[0, max]`, and returns the stored value.
    fn set_health(&self, session: SessionId, player: PlayerId, value: u32)
    -> Result<u32, StoreError>;

    fn set_flag(&self, session: SessionId, flag: Option<FlagRecord>) -> Result<(), StoreError>;

    fn find_start_point(&self, session: SessionId, player: PlayerId)
    -> Result<Position, StoreError>;

    fn set_turn(&self, session: SessionId, turn: TurnDescriptor) -> Result<(), StoreError>;

    /// Applies `update` to the turn descriptor and returns the updated copy.
    fn update_turn(
        &self,
        session: SessionId,
        update: &mut dyn FnMut(&mut TurnDescriptor),
    ) -> Result<TurnDescriptor, StoreError>;

    fn move_placeable(
        &self,
        session: SessionId,
        placeable: PlaceableId,
        position: Position,
    ) -> Result<(), StoreError>;

    /// Counts every disabled placeable down by one turn, re-enabling those
    /// that reach zero.
    fn tick_disabled_placeables(&self, session: SessionId) -> Result<(), StoreError>;

    fn disable_placeable(
        &self,
        session: SessionId,
        placeable: PlaceableId,
        turns: u32,
    ) -> Result<(), StoreError>;

    /// Marks the session finished with the given winner.
    fn set_winner(&self, session: SessionId, winner: Option<PlayerId>) -> Result<(), StoreError>;
}
