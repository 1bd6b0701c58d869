//! Podium protocol - types shared by the presenter and audience windows.
//!
//! This crate contains everything that crosses the broadcast channel:
//! - the closed message union ([`BusMessage`])
//! - slide and quiz payload DTOs
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - only serde, serde_json, and thiserror
//! 2. **No business logic** - pure data types and serialization
//! 3. **Immutable value objects** - the bus never mutates or buffers them

pub mod error;
pub mod messages;
pub mod quiz;
pub mod slides;

pub use error::ProtocolError;
pub use messages::BusMessage;
pub use quiz::{GameMode, GameSnapshot, QuizQuestion};
pub use slides::Slide;
