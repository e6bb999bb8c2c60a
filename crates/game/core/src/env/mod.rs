//! Collaborator traits the engines consume.
//!
//! The engines never own session data. They read snapshots from a
//! [`SessionStore`], ask a [`GridQuery`] about terrain, and roll through an
//! [`RngOracle`]. The runtime crate supplies in-memory implementations.
use crate::config::GameConfig;
use crate::events::EventSink;

mod map;
mod rng;
mod store;

pub use map::{GridLayout, GridQuery, LayoutError, TileEffect, TileKind};
pub use rng::{DicePolicy, PcgRng, RngOracle, RollPurpose, compute_seed};
pub use store::{SessionStore, StoreError};

/// Collaborators an engine operation works against.
#[derive(Clone, Copy)]
pub struct GameEnv<'a> {
    pub store: &'a dyn SessionStore,
    pub grid: &'a dyn GridQuery,
    pub events: &'a dyn EventSink,
    pub config: &'a GameConfig,
}

impl<'a> GameEnv<'a> {
    pub fn new(
        store: &'a dyn SessionStore,
        grid: &'a dyn GridQuery,
        events: &'a dyn EventSink,
        config: &'a GameConfig,
    ) -> Self {
        Self {
            store,
            grid,
            events,
            config,
        }
    }
}
