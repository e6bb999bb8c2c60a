//! Shared fixtures for the runtime's unit tests.

use std::sync::Arc;
use std::time::Duration;

use game_core::{
    GridLayout, Player, PlayerId, RecordingSink, RngOracle, Session, SessionId, SessionStore,
};

use crate::config::RuntimeConfig;
use crate::context::EngineContext;
use crate::repository::InMemorySessionStore;
use crate::timers::Timers;

/// Oracle whose every draw is the same number.
pub struct FixedRng(pub u32);

impl RngOracle for FixedRng {
    fn next_u32(&self, _seed: u64) -> u32 {
        self.0
    }
}

pub struct Harness {
    pub ctx: EngineContext,
    pub store: Arc<InMemorySessionStore>,
    pub events: Arc<RecordingSink>,
    session: SessionId,
}

pub fn harness(session: Session, rows: &[&str]) -> Harness {
    harness_with_rng(session, rows, FixedRng(0))
}

pub fn harness_with_rng(session: Session, rows: &[&str], rng: FixedRng) -> Harness {
    let id = session.id;
    let store = Arc::new(InMemorySessionStore::new());
    let layout = GridLayout::from_rows(rows).unwrap();
    assert!(store.insert(session, layout));
    let events = Arc::new(RecordingSink::new());
    let config = RuntimeConfig::default()
        .with_turn_duration(Duration::from_secs(30))
        .with_transition_duration(Duration::from_secs(3))
        .with_combat_round_interval(Duration::from_secs(5));
    let ctx = EngineContext::new(
        store.clone(),
        store.clone(),
        events.clone(),
        Arc::new(rng),
        Arc::new(config),
    );
    Harness {
        ctx,
        store,
        events,
        session: id,
    }
}

impl Harness {
    /// A registry whose expiries nobody reads.
    pub fn timers(&self) -> Timers {
        Timers::channel().0
    }

    pub fn session(&self) -> Session {
        self.store.find_by_id(self.session).unwrap()
    }

    pub fn player(&self, id: PlayerId) -> Player {
        self.session().player(id).cloned().unwrap()
    }

    pub fn edit(&self, update: impl FnOnce(&mut Session)) {
        assert!(self.store.edit(self.session, update));
    }
}
