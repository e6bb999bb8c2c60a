//! Outcome notifications published by the engines.
//!
//! Engines never know who listens. They hand every [`SessionEvent`] to an
//! injected [`EventSink`]; the runtime routes them onto its event bus and
//! tests record them.

use std::sync::{Mutex, PoisonError};

use crate::combat::{Posture, RoundReport};
use crate::interact::SanctuaryChoice;
use crate::state::{PlaceableId, PlayerId, Position, SessionId};

/// Publish-only notification channel.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: SessionEvent);
}

/// What triggered a reachability computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReachableRequest {
    pub player: PlayerId,
    pub origin: Position,
    pub budget: u32,
}

/// A tile the player can stop on this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReachableTile {
    pub position: Position,
    /// Cumulative movement cost from the origin.
    pub cost: u32,
    /// Movement left after stopping here.
    pub remaining: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum CombatEndReason {
    /// One side fell.
    Defeat,
    /// Both sides fell in the same round.
    Draw,
    /// A participant left the duel.
    Abandoned,
}

#[derive(Clone, Debug, PartialEq, Eq, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum SessionEvent {
    /// A player was selected; their clock starts after the transition pause.
    TurnTransition {
        session: SessionId,
        turn: u64,
        player: PlayerId,
    },
    TurnStarted {
        session: SessionId,
        turn: u64,
        player: PlayerId,
        scripted: bool,
    },
    TurnEnded {
        session: SessionId,
        turn: u64,
        player: Option<PlayerId>,
    },
    PlayerMoved {
        session: SessionId,
        player: PlayerId,
        from: Position,
        to: Position,
        remaining_speed: u32,
        boat: Option<PlaceableId>,
    },
    PlayerReachableTiles {
        session: SessionId,
        request: ReachableRequest,
        tiles: Vec<ReachableTile>,
    },
    PlayerRespawned {
        session: SessionId,
        player: PlayerId,
        position: Position,
    },
    FlagPickedUp {
        session: SessionId,
        player: PlayerId,
        position: Position,
    },
    FlagDropped {
        session: SessionId,
        player: PlayerId,
        position: Position,
    },
    SanctuaryUsed {
        session: SessionId,
        player: PlayerId,
        sanctuary: PlaceableId,
        choice: SanctuaryChoice,
    },
    CombatStarted {
        session: SessionId,
        attacker: PlayerId,
        defender: PlayerId,
    },
    PostureChosen {
        session: SessionId,
        player: PlayerId,
        posture: Posture,
    },
    CombatRoundResolved {
        session: SessionId,
        report: RoundReport,
    },
    CombatEnded {
        session: SessionId,
        winner: Option<PlayerId>,
        loser: Option<PlayerId>,
        reason: CombatEndReason,
    },
    GameOver {
        session: SessionId,
        winner: Option<PlayerId>,
    },
}

impl SessionEvent {
    pub fn session(&self) -> SessionId {
        match self {
            SessionEvent::TurnTransition { session, .. }
            | SessionEvent::TurnStarted { session, .. }
            | SessionEvent::TurnEnded { session, .. }
            | SessionEvent::PlayerMoved { session, .. }
            | SessionEvent::PlayerReachableTiles { session, .. }
            | SessionEvent::PlayerRespawned { session, .. }
            | SessionEvent::FlagPickedUp { session, .. }
            | SessionEvent::FlagDropped { session, .. }
            | SessionEvent::SanctuaryUsed { session, .. }
            | SessionEvent::CombatStarted { session, .. }
            | SessionEvent::PostureChosen { session, .. }
            | SessionEvent::CombatRoundResolved { session, .. }
            | SessionEvent::CombatEnded { session, .. }
            | SessionEvent::GameOver { session, .. } => *session,
        }
    }

    /// Snake-case name of the variant, e.g. `"turn_started"`.
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// Sink that keeps every event in memory, for tests and replays.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drains the recorded events.
    pub fn take(&self) -> Vec<SessionEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(SessionEvent::kind).collect()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: SessionEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
