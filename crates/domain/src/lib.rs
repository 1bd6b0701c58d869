//! Podium domain layer.
//!
//! Pure types and algorithms with no I/O:
//! - the cold-call rotation engine ([`rotation`])
//! - secondary-display placement states ([`display`])
//!
//! Everything here is deterministic given its inputs (the rotation engine
//! takes its randomness as an explicit `Rng` parameter), which is what keeps
//! this layer unit-testable without any async machinery.

pub mod display;
pub mod error;
pub mod rotation;

pub use display::{PermissionState, ScreenTarget};
pub use error::DomainError;
pub use rotation::{assign_slots, SpeakerRotation};
