//! Presenter-authoritative lesson state.
//!
//! The controller owns the canonical snapshot; the audience window only ever
//! mirrors it. Every mutation synchronously publishes a full `STATE_UPDATE`
//! (no batching, no diffs) so the audience never observes a stale index for
//! longer than one event-loop turn, and so a snapshot alone is always enough
//! to recover a late joiner.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use podium_bus::BusHandle;
use podium_domain::{assign_slots, DomainError, SpeakerRotation};
use podium_protocol::{BusMessage, GameMode, GameSnapshot, QuizQuestion, Slide};

/// The presenter's authoritative, in-memory view.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationSnapshot {
    pub current_index: usize,
    pub visible_bullets: usize,
    pub slides: Vec<Slide>,
}

impl PresentationSnapshot {
    fn to_message(&self) -> BusMessage {
        BusMessage::StateUpdate {
            current_index: self.current_index,
            visible_bullets: self.visible_bullets,
            slides: self.slides.clone(),
        }
    }
}

/// Partial game mutation; unset fields keep their current value.
///
/// The *wire* always carries the full snapshot - this type only spares
/// presenter-side call sites from restating unchanged fields.
#[derive(Debug, Default, Clone)]
pub struct GamePatch {
    pub mode: Option<GameMode>,
    pub questions: Option<Vec<QuizQuestion>>,
    pub current_question_index: Option<usize>,
    pub is_answer_revealed: Option<bool>,
}

/// Owns canonical slide and game state and pushes it to the audience.
pub struct PresentationController {
    handle: Arc<BusHandle>,
    snapshot: PresentationSnapshot,
    game: Option<GameSnapshot>,
    on_call: Option<String>,
    rotation: SpeakerRotation,
    rng: StdRng,
}

impl PresentationController {
    pub fn new(
        handle: Arc<BusHandle>,
        slides: Vec<Slide>,
        roster: &[String],
    ) -> Result<Self, DomainError> {
        Self::with_rng(handle, slides, roster, StdRng::from_entropy())
    }

    /// Like [`new`](Self::new), but with an explicit rng so cold-call draws
    /// are reproducible.
    pub fn with_rng(
        handle: Arc<BusHandle>,
        slides: Vec<Slide>,
        roster: &[String],
        mut rng: StdRng,
    ) -> Result<Self, DomainError> {
        if slides.is_empty() {
            return Err(DomainError::validation("deck must contain at least one slide"));
        }
        let rotation = SpeakerRotation::new(roster, &mut rng)?;
        Ok(Self {
            handle,
            snapshot: PresentationSnapshot {
                current_index: 0,
                visible_bullets: 0,
                slides,
            },
            game: None,
            on_call: None,
            rotation,
            rng,
        })
    }

    /// Read-only access to the canonical snapshot.
    pub fn snapshot(&self) -> &PresentationSnapshot {
        &self.snapshot
    }

    /// Whether a mini-game currently overrides the audience's slide view.
    pub fn game_open(&self) -> bool {
        self.game.is_some()
    }

    // -------------------------------------------------------------------------
    // Slide navigation
    // -------------------------------------------------------------------------

    /// Reveal the next bullet, or move to the next slide once all bullets
    /// on the current one are visible. No-op (and no publish) at the end.
    pub fn advance(&mut self) {
        let bullets = self.current_bullet_count();
        if self.snapshot.visible_bullets < bullets {
            self.snapshot.visible_bullets += 1;
        } else if self.snapshot.current_index + 1 < self.snapshot.slides.len() {
            self.snapshot.current_index += 1;
            self.snapshot.visible_bullets = 0;
            self.clear_student();
        } else {
            return;
        }
        self.publish_snapshot();
    }

    /// Mirror of [`advance`](Self::advance): hide the last revealed bullet,
    /// or step back to the previous slide fully revealed.
    pub fn retreat(&mut self) {
        if self.snapshot.visible_bullets > 0 {
            self.snapshot.visible_bullets -= 1;
        } else if self.snapshot.current_index > 0 {
            self.snapshot.current_index -= 1;
            self.snapshot.visible_bullets = self.current_bullet_count();
            self.clear_student();
        } else {
            return;
        }
        self.publish_snapshot();
    }

    /// Jump straight to a slide (clamped to the deck), resetting reveals.
    pub fn jump_to(&mut self, index: usize) {
        let target = index.min(self.snapshot.slides.len() - 1);
        if target == self.snapshot.current_index {
            return;
        }
        self.snapshot.current_index = target;
        self.snapshot.visible_bullets = 0;
        self.clear_student();
        self.publish_snapshot();
    }

    // -------------------------------------------------------------------------
    // Game stream
    // -------------------------------------------------------------------------

    /// Open a mini-game. An already-open game is closed first so the
    /// audience never straddles two games.
    pub fn open_game(&mut self, state: GameSnapshot) {
        if self.game.is_some() {
            tracing::debug!("Opening a game over an open one; closing the old game first");
            self.close_game();
        }
        self.handle.publish(BusMessage::GameStateUpdate {
            state: state.clone(),
        });
        self.game = Some(state);
    }

    /// Apply a partial mutation and push the resulting full snapshot.
    /// Ignored when no game is open.
    pub fn update_game(&mut self, patch: GamePatch) {
        let Some(game) = self.game.as_mut() else {
            tracing::warn!("update_game with no open game; ignored");
            return;
        };
        if let Some(mode) = patch.mode {
            game.mode = mode;
        }
        if let Some(questions) = patch.questions {
            game.questions = questions;
        }
        if let Some(index) = patch.current_question_index {
            game.current_question_index = index;
        }
        if let Some(revealed) = patch.is_answer_revealed {
            game.is_answer_revealed = revealed;
        }
        self.handle.publish(BusMessage::GameStateUpdate {
            state: game.clone(),
        });
    }

    /// Close the game and publish `GAME_CLOSE` - exactly once per opened
    /// game, so the audience reliably falls back to slide mode instead of
    /// waiting for a message that may never come.
    pub fn close_game(&mut self) {
        if self.game.take().is_some() {
            self.handle.publish(BusMessage::GameClose);
        }
    }

    // -------------------------------------------------------------------------
    // Cold calls
    // -------------------------------------------------------------------------

    /// Draw the next student from the rotation and show their banner for
    /// the receiver's default display window.
    pub fn select_student(&mut self) -> String {
        self.call_student(None)
    }

    /// Like [`select_student`](Self::select_student), with an explicit
    /// display window for this one banner.
    pub fn select_student_for(&mut self, display: Duration) -> String {
        self.call_student(Some(display))
    }

    fn call_student(&mut self, display: Option<Duration>) -> String {
        let name = self.rotation.draw(&mut self.rng);
        tracing::info!(student = %name, "Cold call");
        self.on_call = Some(name.clone());
        self.handle.publish(BusMessage::StudentSelect {
            student_name: name.clone(),
            display_millis: display.map(|d| d.as_millis() as u64),
        });
        name
    }

    /// Hide the banner now. Called on every slide change, where a stale
    /// name would be actively misleading.
    pub fn clear_student(&mut self) {
        if self.on_call.take().is_some() {
            self.handle.publish(BusMessage::StudentClear);
        }
    }

    /// The student currently on call, if any.
    pub fn on_call(&self) -> Option<&str> {
        self.on_call.as_deref()
    }

    // -------------------------------------------------------------------------
    // Protocol plumbing
    // -------------------------------------------------------------------------

    /// Late-join recovery: republish the full current state, never a diff.
    pub fn handle_resync(&self) {
        tracing::debug!(
            current_index = self.snapshot.current_index,
            game_open = self.game.is_some(),
            "Resync requested; republishing full snapshot"
        );
        self.handle.publish(self.snapshot.to_message());
        if let Some(game) = &self.game {
            self.handle.publish(BusMessage::GameStateUpdate {
                state: game.clone(),
            });
        }
    }

    /// Ask the audience window to close itself.
    pub fn close_audience(&self) {
        self.handle.publish(BusMessage::CloseAudience);
    }

    /// Teardown: close any open game so the audience is not left waiting
    /// in game mode forever.
    pub fn teardown(&mut self) {
        self.close_game();
    }

    fn current_bullet_count(&self) -> usize {
        self.snapshot.slides[self.snapshot.current_index].bullets.len()
    }

    fn publish_snapshot(&self) {
        self.handle.publish(self.snapshot.to_message());
    }
}

/// Pre-assign a reader to every "read aloud" slide in the deck.
///
/// The slot count is derived from the deck itself; assignments follow the
/// rotation fairness rules.
pub fn assign_readers<R: rand::Rng>(
    slides: &[Slide],
    roster: &[String],
    rng: &mut R,
) -> Result<Vec<(usize, String)>, DomainError> {
    let slots: Vec<usize> = slides
        .iter()
        .enumerate()
        .filter(|(_, slide)| slide.read_aloud)
        .map(|(i, _)| i)
        .collect();
    let names = assign_slots(roster, slots.len(), rng)?;
    Ok(slots.into_iter().zip(names).collect())
}
