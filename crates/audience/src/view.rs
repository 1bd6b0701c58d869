//! What the audience window currently shows.
//!
//! A read-only mirror of the most recent message per stream. The UI layer
//! renders this value directly; nothing here is ever advanced locally.

use podium_protocol::{GameSnapshot, Slide};

/// Slide-stream content.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewPhase {
    /// No `STATE_UPDATE` has arrived yet (fresh or refreshed window).
    Waiting,
    /// Mirroring the presenter's slide snapshot.
    Slides {
        current_index: usize,
        visible_bullets: usize,
        slides: Vec<Slide>,
    },
}

/// Cold-call banner lifecycle.
///
/// `Leaving` is the 0.5 s exit transition after the 3 s display window; a
/// `STUDENT_CLEAR` skips it and hides the banner at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BannerState {
    Hidden,
    Visible(String),
    Leaving(String),
}

/// Complete audience-side render state.
#[derive(Debug, Clone, PartialEq)]
pub struct AudienceView {
    pub phase: ViewPhase,
    /// `Some` overrides slide rendering until the matching `GAME_CLOSE`.
    pub game: Option<GameSnapshot>,
    pub banner: BannerState,
}

impl AudienceView {
    pub fn waiting() -> Self {
        Self {
            phase: ViewPhase::Waiting,
            game: None,
            banner: BannerState::Hidden,
        }
    }

    /// Whether the window is still waiting for its first snapshot.
    pub fn is_waiting(&self) -> bool {
        matches!(self.phase, ViewPhase::Waiting) && self.game.is_none()
    }
}
