//! In-process audience "window".
//!
//! Desktop builds without a multi-window host (and the demo binary) mount
//! the audience receiver as a task in the same process. The opener maps the
//! audience URL's last path segment to the broadcast channel name, e.g.
//! `podium://audience/lesson` joins channel `lesson`.

use std::sync::{Mutex, PoisonError};

use podium_audience::{AudienceHandle, AudienceReceiver, BannerTiming};
use podium_bus::Bus;
use podium_domain::ScreenTarget;

use super::ports::{AudienceWindow, WindowOpener};

/// Opens audience windows as in-process receiver tasks.
pub struct InProcessOpener {
    bus: Bus,
    timing: BannerTiming,
}

impl InProcessOpener {
    pub fn new(bus: Bus) -> Self {
        Self {
            bus,
            timing: BannerTiming::default(),
        }
    }

    pub fn with_timing(mut self, timing: BannerTiming) -> Self {
        self.timing = timing;
        self
    }
}

impl WindowOpener for InProcessOpener {
    fn open(&self, url: &str, target: Option<ScreenTarget>) -> Option<Box<dyn AudienceWindow>> {
        let channel = url.rsplit('/').next().filter(|c| !c.is_empty())?;
        if let Some(target) = &target {
            // Nothing to place in-process; recorded for parity with real hosts.
            tracing::debug!(label = %target.label, "Ignoring placement for in-process window");
        }
        let handle = AudienceReceiver::spawn_with_timing(&self.bus, channel, self.timing);
        Some(Box::new(InProcessWindow {
            handle: Mutex::new(Some(handle)),
        }))
    }
}

struct InProcessWindow {
    handle: Mutex<Option<AudienceHandle>>,
}

impl InProcessWindow {
    fn lock(&self) -> std::sync::MutexGuard<'_, Option<AudienceHandle>> {
        self.handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudienceWindow for InProcessWindow {
    fn is_closed(&self) -> bool {
        self.lock().as_ref().map_or(true, AudienceHandle::is_closed)
    }

    fn close(&self) {
        if let Some(handle) = self.lock().take() {
            handle.shutdown();
        }
    }
}
