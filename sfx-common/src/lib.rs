//! # SFX Common Library
//!
//! Shared code for the sound-effect tooling crates:
//! - Common error type
//! - Configuration file resolution and TOML loading
//! - Human-readable time formatting and parsing for trim fields
//! - Generic broadcast event bus

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;

pub use error::{Error, Result};
pub use events::EventBus;
