//! Mini-game state DTOs.
//!
//! Only the *synchronization* of game state is in scope: these types carry
//! whatever the presenter's game produced, so the audience window can mirror
//! it. Game rules (scoring, money ladders) live with the game, not here.

use serde::{Deserialize, Serialize};

/// Phase of the mini-game as shown to the audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Content is still being generated; show a holding screen.
    Loading,
    /// A question is live.
    Play,
    /// The game is over; show the recap.
    Summary,
}

/// One quiz question, content opaque to the sync layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub prompt: String,
    pub choices: Vec<String>,
    pub correct_index: usize,
}

/// Complete, self-contained game state.
///
/// Published whole on every game mutation; the audience renders the latest
/// one it saw and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub mode: GameMode,
    pub questions: Vec<QuizQuestion>,
    pub current_question_index: usize,
    pub is_answer_revealed: bool,
}

impl GameSnapshot {
    /// A fresh game still waiting for content.
    pub fn loading() -> Self {
        Self {
            mode: GameMode::Loading,
            questions: Vec::new(),
            current_question_index: 0,
            is_answer_revealed: false,
        }
    }
}
