//! Broadcast message types for presenter-audience communication.
//!
//! This is the entire wire protocol: a closed, tagged union discriminated by
//! a `type` tag. Every variant carries only the fields it needs, and every
//! state-bearing variant is a full snapshot, never a diff - delivery is
//! at-most-once and unordered, so "last snapshot observed wins" only works
//! if each message is self-contained.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Removing or renaming variants is a breaking change

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::quiz::GameSnapshot;
use crate::slides::Slide;

/// Messages exchanged over the broadcast channel.
///
/// The slide stream (`StateUpdate`) and the game stream (`GameStateUpdate`
/// / `GameClose`) are logically independent; they multiplex over one
/// physical channel and receivers discriminate by variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BusMessage {
    /// Audience asks for a full resync (sent on mount or refresh).
    #[serde(rename = "STATE_REQUEST")]
    StateRequest,

    /// Full presenter snapshot; the only way slide state crosses windows.
    #[serde(rename = "STATE_UPDATE")]
    #[serde(rename_all = "camelCase")]
    StateUpdate {
        current_index: usize,
        visible_bullets: usize,
        slides: Vec<Slide>,
    },

    /// Full game snapshot; overrides slide rendering until `GameClose`.
    #[serde(rename = "GAME_STATE_UPDATE")]
    GameStateUpdate {
        #[serde(flatten)]
        state: GameSnapshot,
    },

    /// Game over; audience falls back to mirroring slides.
    #[serde(rename = "GAME_CLOSE")]
    GameClose,

    /// Show the cold-call banner for this student.
    #[serde(rename = "STUDENT_SELECT")]
    #[serde(rename_all = "camelCase")]
    StudentSelect {
        student_name: String,
        /// Display window for this banner; the receiver falls back to its
        /// default timing when unset.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_millis: Option<u64>,
    },

    /// Hide the banner immediately (no exit transition).
    #[serde(rename = "STUDENT_CLEAR")]
    StudentClear,

    /// Unconditionally close the audience window.
    #[serde(rename = "CLOSE_AUDIENCE")]
    CloseAudience,

    /// Liveness probe from the presenter, epoch milliseconds.
    #[serde(rename = "HEARTBEAT")]
    Heartbeat { timestamp: u64 },

    /// Mandatory echo of a `Heartbeat`, same timestamp.
    #[serde(rename = "HEARTBEAT_ACK")]
    HeartbeatAck { timestamp: u64 },
}

impl BusMessage {
    /// Serialize for a wire boundary (e.g. handing off to a host channel).
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode defensively: validates the `type` tag and payload shape
    /// instead of trusting whoever published on the channel name.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::GameMode;

    #[test]
    fn messages_carry_the_wire_tag_names() {
        let encoded = BusMessage::StateRequest.encode().expect("encodes");
        assert_eq!(encoded, r#"{"type":"STATE_REQUEST"}"#);

        let encoded = BusMessage::Heartbeat { timestamp: 17 }
            .encode()
            .expect("encodes");
        assert_eq!(encoded, r#"{"type":"HEARTBEAT","timestamp":17}"#);
    }

    #[test]
    fn state_update_uses_camel_case_fields() {
        let msg = BusMessage::StateUpdate {
            current_index: 2,
            visible_bullets: 1,
            slides: vec![Slide::new("Intro", vec!["first".into()])],
        };
        let encoded = msg.encode().expect("encodes");
        assert!(encoded.contains(r#""currentIndex":2"#), "{encoded}");
        assert!(encoded.contains(r#""visibleBullets":1"#), "{encoded}");
        assert_eq!(BusMessage::decode(&encoded).expect("decodes"), msg);
    }

    #[test]
    fn game_state_update_flattens_the_snapshot() {
        let msg = BusMessage::GameStateUpdate {
            state: GameSnapshot {
                mode: GameMode::Play,
                questions: Vec::new(),
                current_question_index: 3,
                is_answer_revealed: true,
            },
        };
        let encoded = msg.encode().expect("encodes");
        assert!(encoded.contains(r#""mode":"play""#), "{encoded}");
        assert!(encoded.contains(r#""currentQuestionIndex":3"#), "{encoded}");
        assert_eq!(BusMessage::decode(&encoded).expect("decodes"), msg);
    }

    #[test]
    fn student_select_display_window_is_optional_on_the_wire() {
        let msg = BusMessage::StudentSelect {
            student_name: "Ana".into(),
            display_millis: None,
        };
        let encoded = msg.encode().expect("encodes");
        assert!(!encoded.contains("displayMillis"), "{encoded}");

        let msg = BusMessage::StudentSelect {
            student_name: "Ana".into(),
            display_millis: Some(8_000),
        };
        let encoded = msg.encode().expect("encodes");
        assert!(encoded.contains(r#""displayMillis":8000"#), "{encoded}");

        // Payloads without the field still decode.
        let decoded = BusMessage::decode(r#"{"type":"STUDENT_SELECT","studentName":"Ana"}"#)
            .expect("decodes");
        assert_eq!(
            decoded,
            BusMessage::StudentSelect {
                student_name: "Ana".into(),
                display_millis: None,
            }
        );
    }

    #[test]
    fn unknown_tags_and_malformed_payloads_are_rejected() {
        assert!(BusMessage::decode(r#"{"type":"NOT_A_MESSAGE"}"#).is_err());
        assert!(BusMessage::decode(r#"{"type":"HEARTBEAT"}"#).is_err());
        assert!(BusMessage::decode("not json").is_err());
    }
}
