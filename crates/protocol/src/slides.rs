//! Slide content DTO.
//!
//! Slides come from a content provider this subsystem does not own; they are
//! carried opaquely in `STATE_UPDATE` payloads so a late-joining audience
//! window can render without any prior message.

use serde::{Deserialize, Serialize};

/// One slide of the lesson deck, as produced by the content provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub title: String,
    /// Bullet points revealed progressively; `visible_bullets` in the
    /// snapshot says how many are currently shown.
    pub bullets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_notes: Option<String>,
    /// Marks a "read aloud" point - one cold-call reading slot per flagged slide.
    #[serde(default)]
    pub read_aloud: bool,
}

impl Slide {
    pub fn new(title: impl Into<String>, bullets: Vec<String>) -> Self {
        Self {
            title: title.into(),
            bullets,
            speaker_notes: None,
            read_aloud: false,
        }
    }

    pub fn with_read_aloud(mut self) -> Self {
        self.read_aloud = true;
        self
    }
}
