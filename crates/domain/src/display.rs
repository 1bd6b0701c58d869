//! Secondary-display placement states.
//!
//! These are the value objects the placement service derives from the host
//! environment. `ScreenTarget` is only ever meaningful while permission is
//! `Granted`; the service clears it the moment the host revokes.

use serde::{Deserialize, Serialize};

/// Usable area of a secondary display, in host screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenTarget {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    /// Host-provided display label, used as the in-memory cache key.
    pub label: String,
}

/// Host permission for multi-display window placement.
///
/// `Unavailable` and `Prompt` only change on user action. `Granted` can flip
/// to `Denied` at any time (host-driven revocation, e.g. a settings change),
/// so cached geometry must be re-derived reactively, never trusted forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// Host has no multi-display placement capability. Terminal for the session.
    Unavailable,
    /// User has not decided yet; an explicit request is required.
    Prompt,
    /// Placement queries are allowed.
    Granted,
    /// User or host refused; recoverable only through a settings change.
    Denied,
}

impl PermissionState {
    /// Whether display geometry may be queried and cached in this state.
    pub fn allows_placement(self) -> bool {
        matches!(self, PermissionState::Granted)
    }

    /// Operator-facing guidance for leaving this state, if any applies.
    pub fn remediation(self) -> Option<&'static str> {
        match self {
            PermissionState::Unavailable => {
                Some("This environment cannot place windows on other displays; open the audience window manually and drag it over.")
            }
            PermissionState::Denied => {
                Some("Window placement was denied; re-enable the permission in the host settings and refresh.")
            }
            PermissionState::Prompt | PermissionState::Granted => None,
        }
    }
}
