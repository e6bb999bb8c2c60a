//! Collaborators shared by the engines of one runtime.

use std::sync::Arc;

use game_core::{EventSink, GameConfig, GameEnv, GridQuery, RngOracle, SessionStore};

use crate::config::RuntimeConfig;

/// Handles every engine of a session worker needs. Cheap to clone.
#[derive(Clone)]
pub struct EngineContext {
    pub store: Arc<dyn SessionStore>,
    pub grid: Arc<dyn GridQuery>,
    pub events: Arc<dyn EventSink>,
    pub rng: Arc<dyn RngOracle>,
    pub config: Arc<RuntimeConfig>,
}

impl EngineContext {
    pub fn new(
        store: Arc<dyn SessionStore>,
        grid: Arc<dyn GridQuery>,
        events: Arc<dyn EventSink>,
        rng: Arc<dyn RngOracle>,
        config: Arc<RuntimeConfig>,
    ) -> Self {
        Self {
            store,
            grid,
            events,
            rng,
            config,
        }
    }

    pub fn game_config(&self) -> &GameConfig {
        &self.config.game_config
    }

    /// Borrowed view for the synchronous rule engines.
    pub fn env(&self) -> GameEnv<'_> {
        GameEnv::new(
            self.store.as_ref(),
            self.grid.as_ref(),
            self.events.as_ref(),
            &self.config.game_config,
        )
    }
}
