//! Session worker that serialises every mutation of one session.
//!
//! Receives commands from [`SessionHandle`](crate::api::SessionHandle) and
//! timer expiries from its own [`Timers`] registry on one `select!` loop, so a
//! command and a timer callback never run against the session at the same
//! time.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use game_core::{
    CombatState, MoveOutcome, Orientation, PlaceableId, PlayerId, Position, Posture,
    ReachableTile, SanctuaryChoice, Session, SessionId, TurnDescriptor,
};

use crate::api::Result;
use crate::combat::{CombatProgress, DuelEnd};
use crate::context::EngineContext;
use crate::engine::SessionEngine;
use crate::timers::{TimerFired, Timers};

/// Commands that can be sent to a session worker
pub enum Command {
    StartFirstTurn {
        reply: oneshot::Sender<Result<TurnDescriptor>>,
    },
    EndTurn {
        reply: oneshot::Sender<Result<Option<TurnDescriptor>>>,
    },
    Move {
        player: PlayerId,
        orientation: Orientation,
        reply: oneshot::Sender<Result<MoveOutcome>>,
    },
    ComputeReachable {
        player: PlayerId,
        reply: oneshot::Sender<Result<Vec<ReachableTile>>>,
    },
    MoveToStartPosition {
        player: PlayerId,
        reply: oneshot::Sender<Result<Position>>,
    },
    Attack {
        attacker: PlayerId,
        target: Position,
        reply: oneshot::Sender<Result<CombatState>>,
    },
    ChoosePosture {
        player: PlayerId,
        posture: Posture,
        reply: oneshot::Sender<Result<Option<CombatProgress>>>,
    },
    PauseForCombat {
        reply: oneshot::Sender<Result<bool>>,
    },
    ResumeAfterCombat {
        reply: oneshot::Sender<Result<bool>>,
    },
    AbandonCombat {
        player: PlayerId,
        reply: oneshot::Sender<Result<Option<DuelEnd>>>,
    },
    UseSanctuary {
        player: PlayerId,
        position: Position,
        choice: SanctuaryChoice,
        reply: oneshot::Sender<Result<PlaceableId>>,
    },
    LeaveSession {
        player: PlayerId,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Read-only snapshot of the session.
    QuerySession {
        reply: oneshot::Sender<Result<Session>>,
    },
    RemainingTurnTime {
        reply: oneshot::Sender<Option<Duration>>,
    },
    /// Stops every timer of the session; the worker keeps serving commands.
    ForceStop { reply: oneshot::Sender<()> },
    /// Stops the worker even while handles to it are still alive.
    Shutdown,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::StartFirstTurn { .. } => "start_first_turn",
            Command::EndTurn { .. } => "end_turn",
            Command::Move { .. } => "move",
            Command::ComputeReachable { .. } => "compute_reachable",
            Command::MoveToStartPosition { .. } => "move_to_start_position",
            Command::Attack { .. } => "attack",
            Command::ChoosePosture { .. } => "choose_posture",
            Command::PauseForCombat { .. } => "pause_for_combat",
            Command::ResumeAfterCombat { .. } => "resume_after_combat",
            Command::AbandonCombat { .. } => "abandon_combat",
            Command::UseSanctuary { .. } => "use_sanctuary",
            Command::LeaveSession { .. } => "leave_session",
            Command::QuerySession { .. } => "query_session",
            Command::RemainingTurnTime { .. } => "remaining_turn_time",
            Command::ForceStop { .. } => "force_stop",
            Command::Shutdown => "shutdown",
        }
    }
}

/// Background task that owns one session's engines and timers.
pub struct SessionWorker {
    session: SessionId,
    engine: SessionEngine,
    command_rx: mpsc::Receiver<Command>,
    fired_rx: mpsc::UnboundedReceiver<TimerFired>,
}

fn respond<T>(reply: oneshot::Sender<T>, value: T, command: &'static str) {
    if reply.send(value).is_err() {
        debug!(target: "runtime::worker", command, "reply channel closed (caller dropped)");
    }
}

impl SessionWorker {
    pub fn new(session: SessionId, ctx: EngineContext, command_rx: mpsc::Receiver<Command>) -> Self {
        let (timers, fired_rx) = Timers::channel();
        Self {
            session,
            engine: SessionEngine::new(ctx, timers),
            command_rx,
            fired_rx,
        }
    }

    /// Main worker loop. Ends when every handle to the session is dropped.
    pub async fn run(mut self) {
        info!(target: "runtime::worker", session = %self.session, "session worker started");
        loop {
            tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(fired) = self.fired_rx.recv() => {
                    if let Some(activation) = self.engine.on_timer(fired) {
                        debug!(
                            target: "runtime::worker",
                            session = %self.session,
                            player = %activation.player,
                            scripted = activation.scripted,
                            "player activated"
                        );
                    }
                }
            }
        }
        self.engine.force_stop(self.session);
        info!(target: "runtime::worker", session = %self.session, "session worker stopped");
    }

    fn handle_command(&mut self, command: Command) {
        let session = self.session;
        let name = command.name();
        debug!(target: "runtime::worker", %session, command = name, "handling command");
        let engine = &mut self.engine;
        match command {
            Command::StartFirstTurn { reply } => {
                respond(reply, engine.start_first_turn(session).map_err(Into::into), name)
            }
            Command::EndTurn { reply } => {
                respond(reply, engine.end_turn_manual(session).map_err(Into::into), name)
            }
            Command::Move {
                player,
                orientation,
                reply,
            } => respond(
                reply,
                engine
                    .move_player(session, player, orientation)
                    .map_err(Into::into),
                name,
            ),
            Command::ComputeReachable { player, reply } => respond(
                reply,
                engine.compute_reachable(session, player).map_err(Into::into),
                name,
            ),
            Command::MoveToStartPosition { player, reply } => respond(
                reply,
                engine
                    .move_to_start_position(session, player)
                    .map_err(Into::into),
                name,
            ),
            Command::Attack {
                attacker,
                target,
                reply,
            } => respond(
                reply,
                engine.attack(session, attacker, target).map_err(Into::into),
                name,
            ),
            Command::ChoosePosture {
                player,
                posture,
                reply,
            } => respond(
                reply,
                engine
                    .choose_posture(session, player, posture)
                    .map_err(Into::into),
                name,
            ),
            Command::PauseForCombat { reply } => {
                respond(reply, engine.pause_for_combat(session).map_err(Into::into), name)
            }
            Command::ResumeAfterCombat { reply } => respond(
                reply,
                engine.resume_after_combat(session).map_err(Into::into),
                name,
            ),
            Command::AbandonCombat { player, reply } => respond(
                reply,
                engine.abandon_combat(session, player).map_err(Into::into),
                name,
            ),
            Command::UseSanctuary {
                player,
                position,
                choice,
                reply,
            } => respond(
                reply,
                engine
                    .use_sanctuary(session, player, position, choice)
                    .map_err(Into::into),
                name,
            ),
            Command::LeaveSession { player, reply } => respond(
                reply,
                engine.leave_session(session, player).map_err(Into::into),
                name,
            ),
            Command::QuerySession { reply } => {
                respond(reply, engine.snapshot(session).map_err(Into::into), name)
            }
            Command::RemainingTurnTime { reply } => {
                respond(reply, engine.remaining_turn_time(session), name)
            }
            Command::ForceStop { reply } => {
                engine.force_stop(session);
                respond(reply, (), name)
            }
            Command::Shutdown => {}
        }
    }
}
