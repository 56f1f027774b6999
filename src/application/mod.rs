//! Application layer managing state and business workflows.
//!
//! This module coordinates between the domain layer and presentation layer:
//! the session lifecycle and its autosave timing, and the UI state that
//! drives them.

pub mod scheduler;
pub mod lifecycle;
pub mod state;

pub use scheduler::*;
pub use lifecycle::*;
pub use state::*;
