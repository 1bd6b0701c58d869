//! Host-environment ports for display placement.
//!
//! The host's permission and screen APIs live behind these traits so the
//! placement state machine can be driven by mocks in tests and by whatever
//! windowing host the binary runs under in production.

use async_trait::async_trait;
use tokio::sync::watch;

use podium_domain::{PermissionState, ScreenTarget};

/// Host capability for multi-display placement.
///
/// `permission_changes` is the event-driven path for host revocation; hosts
/// that never emit change events are covered by the service's polling
/// fallback.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DisplayHost: Send + Sync {
    /// Current permission, without prompting the user.
    async fn permission(&self) -> PermissionState;

    /// Prompt the user; resolves to the resulting state.
    async fn request_permission(&self) -> PermissionState;

    /// Usable areas of the non-primary displays, empty when none are
    /// attached.
    async fn secondary_displays(&self) -> Vec<ScreenTarget>;

    /// Host-driven permission change notifications.
    fn permission_changes(&self) -> watch::Receiver<PermissionState>;
}

/// A live audience window as the host reports it.
pub trait AudienceWindow: Send {
    /// Hosts that block a popup often hand back a handle that is already
    /// closed; this is how the blocked condition is detected.
    fn is_closed(&self) -> bool;

    fn close(&self);
}

/// Opens the audience window.
///
/// The open call is synchronous by contract: it must run inside the user
/// gesture's call stack, with no awaited step in between, or the host
/// treats the window as an unrequested popup and blocks it.
#[cfg_attr(test, mockall::automock)]
pub trait WindowOpener: Send + Sync {
    fn open(&self, url: &str, target: Option<ScreenTarget>) -> Option<Box<dyn AudienceWindow>>;
}
