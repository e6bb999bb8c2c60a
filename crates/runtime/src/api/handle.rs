//! Cloneable façades for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] registers sessions and streams events; each registered
//! session is driven through its own [`SessionHandle`], which hides the
//! channel plumbing to the session worker.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use game_core::{
    CombatState, GridLayout, MoveOutcome, Orientation, PlaceableId, PlayerId, Position, Posture,
    ReachableTile, RngOracle, SanctuaryChoice, Session, SessionEvent, SessionId, TurnDescriptor,
};

use super::errors::{Result, RuntimeError};
use crate::combat::{CombatProgress, DuelEnd};
use crate::config::RuntimeConfig;
use crate::context::EngineContext;
use crate::events::{EventBus, Topic};
use crate::repository::InMemorySessionStore;
use crate::workers::{Command, SessionWorker};

struct SessionEntry {
    command_tx: mpsc::Sender<Command>,
    worker: JoinHandle<()>,
}

pub(crate) struct Registry {
    store: Arc<InMemorySessionStore>,
    event_bus: EventBus,
    rng: Arc<dyn RngOracle>,
    config: Arc<RuntimeConfig>,
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
}

impl Registry {
    pub(crate) fn new(
        store: Arc<InMemorySessionStore>,
        event_bus: EventBus,
        rng: Arc<dyn RngOracle>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            store,
            event_bus,
            rng,
            config: Arc::new(config),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Client-facing handle to the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    registry: Arc<Registry>,
}

impl RuntimeHandle {
    pub(crate) fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Registers a session with its map and spawns the worker that drives it.
    ///
    /// The session's `map_size` is taken from `layout`. Nothing is scheduled
    /// until [`SessionHandle::start_first_turn`] is called.
    pub fn register_session(&self, session: Session, layout: GridLayout) -> Result<SessionHandle> {
        let id = session.id;
        let registry = &self.registry;
        let mut sessions = registry.sessions();
        if sessions.contains_key(&id) || !registry.store.insert(session, layout) {
            return Err(RuntimeError::SessionAlreadyRegistered(id));
        }

        let (command_tx, command_rx) = mpsc::channel(registry.config.command_buffer_size);
        let ctx = EngineContext::new(
            registry.store.clone(),
            registry.store.clone(),
            Arc::new(registry.event_bus.clone()),
            registry.rng.clone(),
            registry.config.clone(),
        );
        let worker = tokio::spawn(SessionWorker::new(id, ctx, command_rx).run());
        sessions.insert(
            id,
            SessionEntry {
                command_tx: command_tx.clone(),
                worker,
            },
        );

        info!(target: "runtime::worker", session = %id, "session registered");
        Ok(SessionHandle::new(id, command_tx))
    }

    /// Handle to an already registered session
    pub fn session(&self, id: SessionId) -> Result<SessionHandle> {
        self.registry
            .sessions()
            .get(&id)
            .map(|entry| SessionHandle::new(id, entry.command_tx.clone()))
            .ok_or(RuntimeError::SessionNotRegistered(id))
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.registry.store.session_ids()
    }

    /// Stops the session's worker and returns its final state.
    ///
    /// Outstanding [`SessionHandle`]s for it fail with
    /// [`RuntimeError::CommandChannelClosed`] afterwards.
    pub async fn remove_session(&self, id: SessionId) -> Result<Session> {
        let entry = self
            .registry
            .sessions()
            .remove(&id)
            .ok_or(RuntimeError::SessionNotRegistered(id))?;
        stop_worker(id, entry).await?;
        self.registry
            .store
            .remove(id)
            .ok_or(RuntimeError::SessionNotRegistered(id))
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// let mut combat_rx = handle.subscribe(Topic::Combat);
    /// while let Ok(event) = combat_rx.recv().await {
    ///     // Handle combat events of every session
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<SessionEvent> {
        self.registry.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<SessionEvent>> {
        self.registry.event_bus.subscribe_multiple(topics)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.registry.config
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.registry.event_bus
    }

    /// Stops every session worker. Used by [`Runtime::shutdown`](crate::Runtime::shutdown).
    pub(crate) async fn shutdown_all(&self) -> Result<()> {
        let entries: Vec<(SessionId, SessionEntry)> =
            self.registry.sessions().drain().collect();
        for (id, entry) in entries {
            stop_worker(id, entry).await?;
        }
        Ok(())
    }
}

async fn stop_worker(id: SessionId, entry: SessionEntry) -> Result<()> {
    if entry.command_tx.send(Command::Shutdown).await.is_err() {
        debug!(target: "runtime::worker", session = %id, "worker already stopped");
    }
    entry.worker.await.map_err(RuntimeError::WorkerJoin)?;
    info!(target: "runtime::worker", session = %id, "session removed");
    Ok(())
}

/// Handle bound to one session's worker.
#[derive(Clone)]
pub struct SessionHandle {
    session: SessionId,
    command_tx: mpsc::Sender<Command>,
}

impl SessionHandle {
    fn new(session: SessionId, command_tx: mpsc::Sender<Command>) -> Self {
        Self {
            session,
            command_tx,
        }
    }

    pub fn id(&self) -> SessionId {
        self.session
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Selects the first eligible player and opens the transition window.
    pub async fn start_first_turn(&self) -> Result<TurnDescriptor> {
        self.request(|reply| Command::StartFirstTurn { reply }).await?
    }

    /// Ends the active turn early. Returns `None` once the game is over.
    pub async fn end_turn(&self) -> Result<Option<TurnDescriptor>> {
        self.request(|reply| Command::EndTurn { reply }).await?
    }

    pub async fn move_player(
        &self,
        player: PlayerId,
        orientation: Orientation,
    ) -> Result<MoveOutcome> {
        self.request(|reply| Command::Move {
            player,
            orientation,
            reply,
        })
        .await?
    }

    /// Tiles the player can still reach this turn. Also published as
    /// `PlayerReachableTiles`.
    pub async fn compute_reachable(&self, player: PlayerId) -> Result<Vec<ReachableTile>> {
        self.request(|reply| Command::ComputeReachable { player, reply })
            .await?
    }

    pub async fn move_to_start_position(&self, player: PlayerId) -> Result<Position> {
        self.request(|reply| Command::MoveToStartPosition { player, reply })
            .await?
    }

    /// Opens a duel against the player standing on `target`.
    pub async fn attack(&self, attacker: PlayerId, target: Position) -> Result<CombatState> {
        self.request(|reply| Command::Attack {
            attacker,
            target,
            reply,
        })
        .await?
    }

    /// Locks in a posture for the current round. Resolves the round as soon
    /// as both duelists have chosen.
    pub async fn choose_posture(
        &self,
        player: PlayerId,
        posture: Posture,
    ) -> Result<Option<CombatProgress>> {
        self.request(|reply| Command::ChoosePosture {
            player,
            posture,
            reply,
        })
        .await?
    }

    pub async fn pause_for_combat(&self) -> Result<bool> {
        self.request(|reply| Command::PauseForCombat { reply })
            .await?
    }

    pub async fn resume_after_combat(&self) -> Result<bool> {
        self.request(|reply| Command::ResumeAfterCombat { reply })
            .await?
    }

    pub async fn abandon_combat(&self, player: PlayerId) -> Result<Option<DuelEnd>> {
        self.request(|reply| Command::AbandonCombat { player, reply })
            .await?
    }

    pub async fn use_sanctuary(
        &self,
        player: PlayerId,
        position: Position,
        choice: SanctuaryChoice,
    ) -> Result<PlaceableId> {
        self.request(|reply| Command::UseSanctuary {
            player,
            position,
            choice,
            reply,
        })
        .await?
    }

    pub async fn leave_session(&self, player: PlayerId) -> Result<()> {
        self.request(|reply| Command::LeaveSession { player, reply })
            .await?
    }

    /// Query the current session state (read-only snapshot)
    pub async fn query_session(&self) -> Result<Session> {
        self.request(|reply| Command::QuerySession { reply }).await?
    }

    /// Time left on the turn clock, frozen while a duel pauses it.
    pub async fn remaining_turn_time(&self) -> Result<Option<Duration>> {
        self.request(|reply| Command::RemainingTurnTime { reply })
            .await
    }

    /// Cancels every timer of the session.
    pub async fn force_stop(&self) -> Result<()> {
        self.request(|reply| Command::ForceStop { reply }).await
    }
}
