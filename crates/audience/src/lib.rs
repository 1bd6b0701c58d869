//! Podium audience window.
//!
//! The audience side of the sync protocol: a pure mirror of presenter
//! state. It requests a resync on mount, renders the latest snapshot per
//! stream, echoes every heartbeat, and owns nothing but the cold-call
//! banner timers.

pub mod receiver;
pub mod view;

pub use receiver::{AudienceHandle, AudienceReceiver, BannerTiming};
pub use view::{AudienceView, BannerState, ViewPhase};
