//! High-level runtime orchestrator.
//!
//! The runtime owns the shared session store, the event bus, and one worker
//! per registered session, and exposes a builder-based API for clients.

use std::sync::Arc;

use tokio::sync::broadcast;

use game_core::{GridLayout, PcgRng, RngOracle, Session, SessionEvent};

use crate::api::{Registry, Result, RuntimeHandle, SessionHandle};
use crate::config::RuntimeConfig;
use crate::events::{EventBus, Topic};
use crate::repository::InMemorySessionStore;

/// Main runtime hosting game sessions
///
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    store: Arc<InMemorySessionStore>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Shorthand for [`RuntimeHandle::register_session`].
    pub fn register_session(
        &self,
        session: Session,
        layout: GridLayout,
    ) -> Result<SessionHandle> {
        self.handle.register_session(session, layout)
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<SessionEvent> {
        self.handle.subscribe(topic)
    }

    /// Direct read access to the session store, e.g. for persistence.
    pub fn store(&self) -> &Arc<InMemorySessionStore> {
        &self.store
    }

    /// Shutdown the runtime gracefully
    ///
    /// Stops every session worker and waits for it to exit. Pending timers
    /// are cancelled.
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown_all().await
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    store: Option<Arc<InMemorySessionStore>>,
    rng: Option<Arc<dyn RngOracle>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            store: None,
            rng: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing store instead of creating an empty one.
    pub fn store(mut self, store: Arc<InMemorySessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the dice oracle (default: [`PcgRng`]).
    pub fn rng(mut self, rng: impl RngOracle + 'static) -> Self {
        self.rng = Some(Arc::new(rng));
        self
    }

    /// Build the runtime
    pub fn build(self) -> Runtime {
        let store = self.store.unwrap_or_default();
        let rng = self.rng.unwrap_or_else(|| Arc::new(PcgRng));
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let registry = Registry::new(store.clone(), event_bus, rng, self.config);

        Runtime {
            handle: RuntimeHandle::new(Arc::new(registry)),
            store,
        }
    }
}
