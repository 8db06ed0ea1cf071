// # Session State
//
// In-memory session store owned by the session engine.

pub mod memory;

pub use memory::{SessionState, SessionStore};
