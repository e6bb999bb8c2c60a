//! Topic-based event bus for session events.
//!
//! Engines publish through the [`game_core::EventSink`] trait; the bus fans
//! events out to per-topic broadcast channels so consumers subscribe only to
//! the topics they need.

mod bus;

pub use bus::{EventBus, Topic};
