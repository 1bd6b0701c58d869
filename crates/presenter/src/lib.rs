//! Podium presenter.
//!
//! The authoritative side of the dual-window sync protocol:
//! - [`controller`]: canonical slide/game state, push-on-mutation
//! - [`session`]: controller + resync loop + liveness monitor lifecycle
//! - [`monitor`]: heartbeat probe deriving the audience-link state
//! - [`display`]: secondary-display permission machine and window launch

pub mod controller;
pub mod display;
pub mod monitor;
pub mod session;
pub mod settings;

pub use controller::{assign_readers, GamePatch, PresentationController, PresentationSnapshot};
pub use display::{
    AudienceWindow, DisplayHost, DisplayPlacementService, InProcessOpener, LaunchError,
    WindowOpener,
};
pub use monitor::{ConnectionMonitor, HeartbeatConfig, LinkState, LinkStateObserver};
pub use session::PresenterSession;
pub use settings::Settings;
