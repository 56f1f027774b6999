//! fitlog - Terminal Workout Logger Library
//!
//! Session lifecycle with debounced autosave, crash recovery through a
//! scratch store, and JSON import/export of the workout history.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
