//! Secondary-display placement service.
//!
//! Permission/state machine for discovering a second screen and opening the
//! audience window on it. The one hard rule: the launch itself is
//! synchronous and touches nothing but in-memory cache, because any awaited
//! permission or geometry query between the user's click and the window
//! open gets the window blocked as an unrequested popup. Geometry is
//! therefore pre-fetched whenever permission allows and invalidated the
//! moment the host revokes.

mod in_process;
mod ports;

pub use in_process::InProcessOpener;
pub use ports::{AudienceWindow, DisplayHost, WindowOpener};
#[cfg(test)]
pub use ports::{MockDisplayHost, MockWindowOpener};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use podium_domain::{PermissionState, ScreenTarget};

/// Launch failures that are not permission states.
///
/// A blocked popup and a denied permission need different remediation
/// (open a URL by hand vs change a host setting), so they must never be
/// conflated. Permission problems are exposed as [`PermissionState`], not
/// as errors.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(
        "The host blocked the audience window; open {fallback_url} manually in a new window"
    )]
    Blocked { fallback_url: String },
}

#[derive(Debug, Clone)]
struct Placement {
    permission: PermissionState,
    /// Geometry cache keyed by the host's display label.
    targets: HashMap<String, ScreenTarget>,
    /// Label of the display the operator picked, if any.
    preferred: Option<String>,
}

/// Placement service: owns the permission state and the geometry cache.
pub struct DisplayPlacementService {
    host: Arc<dyn DisplayHost>,
    placement: Mutex<Placement>,
    audience_url: String,
}

impl DisplayPlacementService {
    pub fn new(host: Arc<dyn DisplayHost>, audience_url: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            host,
            placement: Mutex::new(Placement {
                permission: PermissionState::Prompt,
                targets: HashMap::new(),
                preferred: None,
            }),
            audience_url: audience_url.into(),
        })
    }

    /// Re-derive permission and geometry from the host. Called at startup,
    /// on change notifications, and by the polling fallback.
    pub async fn refresh(&self) {
        let permission = self.host.permission().await;
        self.apply_permission(permission).await;
    }

    /// Prompt the user for placement permission.
    pub async fn request_permission(&self) -> PermissionState {
        let permission = self.host.request_permission().await;
        self.apply_permission(permission).await;
        permission
    }

    /// Current permission state.
    pub fn permission(&self) -> PermissionState {
        self.lock().permission
    }

    /// The display the audience window will be placed on: the preferred
    /// one while it stays attached, otherwise the first by label. Populated
    /// only while permission is granted; `None` also covers "no second
    /// display attached".
    pub fn target(&self) -> Option<ScreenTarget> {
        let placement = self.lock();
        if let Some(target) = placement
            .preferred
            .as_ref()
            .and_then(|label| placement.targets.get(label))
        {
            return Some(target.clone());
        }
        placement
            .targets
            .iter()
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, target)| target.clone())
    }

    /// All cached secondary-display geometry, keyed by display label.
    pub fn targets(&self) -> HashMap<String, ScreenTarget> {
        self.lock().targets.clone()
    }

    /// Pick the display to place the audience window on. Returns `false`
    /// when no display with that label is currently cached.
    pub fn prefer_display(&self, label: &str) -> bool {
        let mut placement = self.lock();
        if placement.targets.contains_key(label) {
            placement.preferred = Some(label.to_string());
            true
        } else {
            false
        }
    }

    /// Open the audience window inside the caller's gesture stack.
    ///
    /// Reads only the cache - no awaiting. Without a cached target the
    /// window still opens, just unplaced. A falsy or immediately-closed
    /// handle is reported as blocked, which is a different condition from
    /// denied permission.
    pub fn launch(
        &self,
        opener: &dyn WindowOpener,
    ) -> Result<Box<dyn AudienceWindow>, LaunchError> {
        let target = self.target();
        match &target {
            Some(target) => {
                tracing::info!(label = %target.label, "Opening audience window on secondary display")
            }
            None => tracing::info!("Opening audience window without placement"),
        }
        match opener.open(&self.audience_url, target) {
            Some(window) if !window.is_closed() => Ok(window),
            _ => {
                tracing::warn!("Audience window blocked by the host");
                Err(LaunchError::Blocked {
                    fallback_url: self.audience_url.clone(),
                })
            }
        }
    }

    /// Watch for host-driven permission changes, with an optional polling
    /// fallback for hosts that never emit them. The task runs until
    /// aborted; abort it on teardown.
    pub fn spawn_watcher(self: &Arc<Self>, poll: Option<Duration>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut changes = service.host.permission_changes();
            loop {
                tokio::select! {
                    changed = changes.changed() => {
                        if changed.is_err() {
                            // Host dropped its notifier; polling is all that's left.
                            match poll {
                                Some(period) => loop {
                                    tokio::time::sleep(period).await;
                                    service.refresh().await;
                                },
                                None => break,
                            }
                        }
                        let permission = *changes.borrow_and_update();
                        service.apply_permission(permission).await;
                    }
                    _ = async {
                        match poll {
                            Some(period) => tokio::time::sleep(period).await,
                            None => std::future::pending().await,
                        }
                    }, if poll.is_some() => {
                        service.refresh().await;
                    }
                }
            }
        })
    }

    async fn apply_permission(&self, permission: PermissionState) {
        // Geometry is queried outside the lock; the last writer wins, which
        // matches how the rest of the protocol treats state.
        let targets: HashMap<String, ScreenTarget> = if permission.allows_placement() {
            self.host
                .secondary_displays()
                .await
                .into_iter()
                .map(|target| (target.label.clone(), target))
                .collect()
        } else {
            HashMap::new()
        };

        let mut placement = self.lock();
        let was = placement.permission;
        if was.allows_placement() && permission == PermissionState::Denied {
            tracing::warn!("Display placement permission revoked by the host");
        }
        placement.permission = permission;
        placement.targets = targets;
        // A preference only survives while that display stays attached.
        let detached = placement
            .preferred
            .as_ref()
            .is_some_and(|label| !placement.targets.contains_key(label));
        if detached {
            placement.preferred = None;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Placement> {
        self.placement.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
