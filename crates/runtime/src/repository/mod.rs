//! Storage for live session state.
//!
//! Sessions are kept in memory only; a lost process loses its sessions.
//! Static map layouts travel with the session record so one store answers
//! both [`game_core::SessionStore`] and [`game_core::GridQuery`].

mod session;

pub use session::InMemorySessionStore;
