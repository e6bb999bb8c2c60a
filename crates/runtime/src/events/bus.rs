//! Topic-based event bus implementation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use game_core::{EventSink, SessionEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Topic {
    /// Turn transitions, starts and ends
    Turn,
    /// Moves, reachability, respawns, flag and sanctuary events
    Movement,
    /// Duel lifecycle and round results
    Combat,
    /// Session-wide outcomes
    Session,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Turn, Topic::Movement, Topic::Combat, Topic::Session];

    pub fn of(event: &SessionEvent) -> Topic {
        match event {
            SessionEvent::TurnTransition { .. }
            | SessionEvent::TurnStarted { .. }
            | SessionEvent::TurnEnded { .. } => Topic::Turn,
            SessionEvent::PlayerMoved { .. }
            | SessionEvent::PlayerReachableTiles { .. }
            | SessionEvent::PlayerRespawned { .. }
            | SessionEvent::FlagPickedUp { .. }
            | SessionEvent::FlagDropped { .. }
            | SessionEvent::SanctuaryUsed { .. } => Topic::Movement,
            SessionEvent::CombatStarted { .. }
            | SessionEvent::PostureChosen { .. }
            | SessionEvent::CombatRoundResolved { .. }
            | SessionEvent::CombatEnded { .. } => Topic::Combat,
            SessionEvent::GameOver { .. } => Topic::Session,
        }
    }

    const fn index(self) -> usize {
        match self {
            Topic::Turn => 0,
            Topic::Movement => 1,
            Topic::Combat => 2,
            Topic::Session => 3,
        }
    }
}

/// Topic-based event bus
///
/// One broadcast channel per topic, shared by every session worker. Consumers
/// subscribe to the topics they care about and filter by session id.
#[derive(Clone)]
pub struct EventBus {
    channels: [broadcast::Sender<SessionEvent>; 4],
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Topic::ALL.map(|_| broadcast::channel(capacity).0),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: SessionEvent) {
        let topic = Topic::of(&event);
        let kind = event.kind();
        let session = event.session();
        if self.channels[topic.index()].send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!(target: "runtime::events", %topic, kind, %session, "no subscribers");
        } else {
            tracing::trace!(target: "runtime::events", %topic, kind, %session, "event published");
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<SessionEvent> {
        self.channels[topic.index()].subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<SessionEvent>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: SessionEvent) {
        EventBus::publish(self, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{PlayerId, SessionId};

    #[test]
    fn routes_events_by_topic() {
        let bus = EventBus::with_capacity(8);
        let mut turns = bus.subscribe(Topic::Turn);
        let mut sessions = bus.subscribe(Topic::Session);

        bus.publish(SessionEvent::TurnTransition {
            session: SessionId(1),
            turn: 1,
            player: PlayerId(1),
        });
        bus.publish(SessionEvent::GameOver {
            session: SessionId(1),
            winner: Some(PlayerId(1)),
        });

        assert_eq!(turns.try_recv().unwrap().kind(), "turn_transition");
        assert!(turns.try_recv().is_err());
        assert_eq!(sessions.try_recv().unwrap().kind(), "game_over");
    }

    #[test]
    fn publishing_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        bus.publish(SessionEvent::TurnEnded {
            session: SessionId(3),
            turn: 4,
            player: None,
        });
    }
}
