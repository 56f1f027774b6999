//! Infrastructure layer providing external service integrations.
//!
//! This module contains the key/value stores backing durable and scratch
//! persistence, configuration loading and log setup.

pub mod persistence;
pub mod config;
pub mod logging;

pub use persistence::*;
pub use config::*;
pub use logging::*;
