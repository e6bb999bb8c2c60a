//! Worker tasks that back the runtime orchestration.
//!
//! Each registered session runs on its own [`SessionWorker`]; sessions never
//! share a worker, so they progress independently.

mod session;

pub use session::{Command, SessionWorker};
