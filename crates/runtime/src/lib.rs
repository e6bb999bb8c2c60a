//! Runtime orchestration for timed grid-game sessions.
//!
//! This crate wires the pure rules of `game-core` to tokio: cancellable
//! timers, the turn scheduler, the duel arena, and one worker task per
//! session. Consumers embed [`Runtime`] to register sessions, then drive each
//! one through a [`SessionHandle`] and follow it on the [`EventBus`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`engine`] coordinates [`scheduler`], [`combat`], and movement for one session
//! - [`timers`] keeps the per-session cancellable timers
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`repository`] provides the in-memory session store
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod combat;
pub mod config;
pub mod context;
pub mod engine;
pub mod events;
pub mod repository;
pub mod runtime;
pub mod scheduler;
pub mod timers;

mod workers;

#[cfg(test)]
mod testing;

pub use api::{ConfigError, Result, RuntimeError, RuntimeHandle, SessionHandle};
pub use combat::{CombatEngine, CombatProgress, DuelEnd};
pub use config::RuntimeConfig;
pub use context::EngineContext;
pub use engine::SessionEngine;
pub use events::{EventBus, Topic};
pub use repository::InMemorySessionStore;
pub use runtime::{Runtime, RuntimeBuilder};
pub use scheduler::{TurnActivation, TurnScheduler};
pub use timers::{TimerFired, TimerKind, Timers};
