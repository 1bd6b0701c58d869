//! The audience-side receiver task.
//!
//! Subscribes to the lesson channel, mirrors whatever the latest snapshot
//! says, and requests a resync on mount. The receiver never infers or
//! locally advances presentation state; the only timers it owns are the
//! cold-call banner's display and exit windows.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};

use podium_bus::{Bus, BusHandle, BusSubscription};
use podium_protocol::BusMessage;

use crate::view::{AudienceView, BannerState, ViewPhase};

/// Cold-call banner timings.
#[derive(Debug, Clone, Copy)]
pub struct BannerTiming {
    /// How long the name stays fully visible.
    pub display: Duration,
    /// Length of the exit transition that follows.
    pub exit: Duration,
}

impl Default for BannerTiming {
    fn default() -> Self {
        Self {
            display: Duration::from_secs(3),
            exit: Duration::from_millis(500),
        }
    }
}

/// Pending banner transition, if any.
#[derive(Clone, Copy)]
enum BannerDeadline {
    Idle,
    /// Display window ends; switch to the exit transition.
    BeginExit(Instant),
    /// Exit transition ends; hide the banner.
    Finish(Instant),
}

impl BannerDeadline {
    fn at(&self) -> Option<Instant> {
        match self {
            BannerDeadline::Idle => None,
            BannerDeadline::BeginExit(at) | BannerDeadline::Finish(at) => Some(*at),
        }
    }
}

/// Audience window receiver.
pub struct AudienceReceiver;

impl AudienceReceiver {
    /// Mount the receiver on a channel with the default banner timings.
    pub fn spawn(bus: &Bus, channel: &str) -> AudienceHandle {
        Self::spawn_with_timing(bus, channel, BannerTiming::default())
    }

    /// Mount with explicit banner timings (UI themes may retune them).
    pub fn spawn_with_timing(bus: &Bus, channel: &str, timing: BannerTiming) -> AudienceHandle {
        let handle = bus.open(channel);
        // Subscribe before spawning: a message published right after spawn()
        // returns must be buffered, not dropped while the task is first
        // scheduled.
        let sub = handle.subscribe();
        let (view_tx, view_rx) = watch::channel(AudienceView::waiting());
        let task = tokio::spawn(run(handle, sub, view_tx, timing));
        AudienceHandle {
            view_rx,
            task: Some(task),
        }
    }
}

/// Live handle to a mounted audience window.
///
/// Dropping the handle tears the receiver down and releases its channel.
pub struct AudienceHandle {
    view_rx: watch::Receiver<AudienceView>,
    task: Option<JoinHandle<()>>,
}

impl AudienceHandle {
    /// Current render state.
    pub fn view(&self) -> AudienceView {
        self.view_rx.borrow().clone()
    }

    /// Observe render-state changes (for UI binding).
    pub fn view_changes(&self) -> watch::Receiver<AudienceView> {
        self.view_rx.clone()
    }

    /// Whether the window has closed (`CLOSE_AUDIENCE` or channel gone).
    pub fn is_closed(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Wait until the window closes on its own.
    pub async fn wait(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Tear the window down immediately.
    pub fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for AudienceHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    handle: BusHandle,
    mut sub: BusSubscription,
    view_tx: watch::Sender<AudienceView>,
    timing: BannerTiming,
) {
    // Late-join recovery: ask the presenter for the full current snapshot.
    handle.publish(BusMessage::StateRequest);
    tracing::info!(channel = %handle.channel(), "Audience window mounted; resync requested");

    let mut view = AudienceView::waiting();
    let mut deadline = BannerDeadline::Idle;

    loop {
        let timer_at = deadline.at();
        let changed = tokio::select! {
            maybe = sub.recv() => {
                let Some(message) = maybe else {
                    tracing::debug!("Broadcast channel closed; audience window shutting down");
                    break;
                };
                match apply(&handle, &mut view, &mut deadline, timing, message) {
                    Applied::Continue(changed) => changed,
                    Applied::Close => break,
                }
            }
            _ = async {
                match timer_at {
                    Some(at) => sleep_until(at).await,
                    // Unreachable: branch is disabled when no deadline is set.
                    None => std::future::pending().await,
                }
            }, if timer_at.is_some() => {
                advance_banner(&mut view, &mut deadline, timing);
                true
            }
        };

        if changed && view_tx.send(view.clone()).is_err() {
            // Every observer is gone; nothing left to mirror for.
            break;
        }
    }
}

enum Applied {
    Continue(bool),
    Close,
}

fn apply(
    handle: &BusHandle,
    view: &mut AudienceView,
    deadline: &mut BannerDeadline,
    timing: BannerTiming,
    message: BusMessage,
) -> Applied {
    let before = view.clone();
    match message {
        BusMessage::StateUpdate {
            current_index,
            visible_bullets,
            slides,
        } => {
            tracing::debug!(current_index, visible_bullets, "Mirroring slide snapshot");
            view.phase = ViewPhase::Slides {
                current_index,
                visible_bullets,
                slides,
            };
        }
        BusMessage::GameStateUpdate { state } => {
            view.game = Some(state);
        }
        BusMessage::GameClose => {
            view.game = None;
        }
        BusMessage::StudentSelect {
            student_name,
            display_millis,
        } => {
            tracing::debug!(student = %student_name, "Cold-call banner shown");
            let display = display_millis
                .map(Duration::from_millis)
                .unwrap_or(timing.display);
            view.banner = BannerState::Visible(student_name);
            *deadline = BannerDeadline::BeginExit(Instant::now() + display);
        }
        BusMessage::StudentClear => {
            // No exit transition: a stale name on a new slide is misleading.
            view.banner = BannerState::Hidden;
            *deadline = BannerDeadline::Idle;
        }
        BusMessage::Heartbeat { timestamp } => {
            // Echoed unconditionally, game mode included.
            handle.publish(BusMessage::HeartbeatAck { timestamp });
        }
        BusMessage::CloseAudience => {
            tracing::info!("Close requested by presenter; audience window shutting down");
            return Applied::Close;
        }
        // Presenter-bound traffic on the shared channel; not ours.
        BusMessage::StateRequest | BusMessage::HeartbeatAck { .. } => {}
    }
    Applied::Continue(*view != before)
}

fn advance_banner(view: &mut AudienceView, deadline: &mut BannerDeadline, timing: BannerTiming) {
    match (*deadline, view.banner.clone()) {
        (BannerDeadline::BeginExit(_), BannerState::Visible(name)) => {
            view.banner = BannerState::Leaving(name);
            *deadline = BannerDeadline::Finish(Instant::now() + timing.exit);
        }
        _ => {
            view.banner = BannerState::Hidden;
            *deadline = BannerDeadline::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podium_protocol::{GameMode, GameSnapshot, Slide};
    use tokio::time::timeout;

    fn snapshot(index: usize) -> BusMessage {
        BusMessage::StateUpdate {
            current_index: index,
            visible_bullets: 0,
            slides: vec![Slide::new("One", vec![]), Slide::new("Two", vec![])],
        }
    }

    async fn next_view(rx: &mut watch::Receiver<AudienceView>) -> AudienceView {
        timeout(Duration::from_secs(30), rx.changed())
            .await
            .expect("view change before timeout")
            .expect("receiver alive");
        rx.borrow().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn mount_requests_resync_and_waits() {
        let bus = Bus::new();
        let presenter = bus.open("lesson");
        let mut presenter_sub = presenter.subscribe();

        let audience = AudienceReceiver::spawn(&bus, "lesson");
        assert!(audience.view().is_waiting());

        assert_eq!(
            presenter_sub.recv().await,
            Some(BusMessage::StateRequest),
            "first thing on the wire must be the resync request"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn renders_strictly_the_latest_snapshot() {
        let bus = Bus::new();
        let presenter = bus.open("lesson");
        let audience = AudienceReceiver::spawn(&bus, "lesson");
        let mut views = audience.view_changes();

        presenter.publish(snapshot(0));
        presenter.publish(snapshot(1));

        let mut view = next_view(&mut views).await;
        if view.phase
            == (ViewPhase::Slides {
                current_index: 0,
                visible_bullets: 0,
                slides: vec![Slide::new("One", vec![]), Slide::new("Two", vec![])],
            })
        {
            view = next_view(&mut views).await;
        }
        match view.phase {
            ViewPhase::Slides { current_index, .. } => assert_eq!(current_index, 1),
            other => panic!("expected slides, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn game_stream_overrides_slides_until_game_close() {
        let bus = Bus::new();
        let presenter = bus.open("lesson");
        let audience = AudienceReceiver::spawn(&bus, "lesson");
        let mut views = audience.view_changes();

        presenter.publish(snapshot(0));
        next_view(&mut views).await;

        presenter.publish(BusMessage::GameStateUpdate {
            state: GameSnapshot {
                mode: GameMode::Play,
                questions: vec![],
                current_question_index: 0,
                is_answer_revealed: false,
            },
        });
        let view = next_view(&mut views).await;
        assert!(view.game.is_some());
        // The slide mirror is retained underneath the game overlay.
        assert!(matches!(view.phase, ViewPhase::Slides { .. }));

        presenter.publish(BusMessage::GameClose);
        let view = next_view(&mut views).await;
        assert!(view.game.is_none());
        assert!(matches!(view.phase, ViewPhase::Slides { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn banner_shows_then_exits_on_schedule() {
        let bus = Bus::new();
        let presenter = bus.open("lesson");
        let audience = AudienceReceiver::spawn(&bus, "lesson");
        let mut views = audience.view_changes();

        presenter.publish(BusMessage::StudentSelect {
            student_name: "Ana".into(),
            display_millis: None,
        });

        let view = next_view(&mut views).await;
        assert_eq!(view.banner, BannerState::Visible("Ana".into()));
        let shown_at = Instant::now();

        let view = next_view(&mut views).await;
        assert_eq!(view.banner, BannerState::Leaving("Ana".into()));
        assert_eq!(shown_at.elapsed(), Duration::from_secs(3));

        let view = next_view(&mut views).await;
        assert_eq!(view.banner, BannerState::Hidden);
        assert_eq!(shown_at.elapsed(), Duration::from_millis(3500));
    }

    #[tokio::test(start_paused = true)]
    async fn per_call_display_window_overrides_the_default() {
        let bus = Bus::new();
        let presenter = bus.open("lesson");
        let audience = AudienceReceiver::spawn(&bus, "lesson");
        let mut views = audience.view_changes();

        presenter.publish(BusMessage::StudentSelect {
            student_name: "Ana".into(),
            display_millis: Some(1_000),
        });

        let view = next_view(&mut views).await;
        assert_eq!(view.banner, BannerState::Visible("Ana".into()));
        let shown_at = Instant::now();

        let view = next_view(&mut views).await;
        assert_eq!(view.banner, BannerState::Leaving("Ana".into()));
        assert_eq!(shown_at.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn newer_select_replaces_a_pending_banner() {
        let bus = Bus::new();
        let presenter = bus.open("lesson");
        let audience = AudienceReceiver::spawn(&bus, "lesson");
        let mut views = audience.view_changes();

        presenter.publish(BusMessage::StudentSelect {
            student_name: "Ana".into(),
            display_millis: None,
        });
        let view = next_view(&mut views).await;
        assert_eq!(view.banner, BannerState::Visible("Ana".into()));

        presenter.publish(BusMessage::StudentSelect {
            student_name: "Ben".into(),
            display_millis: None,
        });
        let view = next_view(&mut views).await;
        assert_eq!(view.banner, BannerState::Visible("Ben".into()));
        let replaced_at = Instant::now();

        // Ben gets a fresh, full display window.
        let view = next_view(&mut views).await;
        assert_eq!(view.banner, BannerState::Leaving("Ben".into()));
        assert_eq!(replaced_at.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn student_clear_hides_immediately_without_exit_phase() {
        let bus = Bus::new();
        let presenter = bus.open("lesson");
        let audience = AudienceReceiver::spawn(&bus, "lesson");
        let mut views = audience.view_changes();

        presenter.publish(BusMessage::StudentSelect {
            student_name: "Ana".into(),
            display_millis: None,
        });
        let view = next_view(&mut views).await;
        assert_eq!(view.banner, BannerState::Visible("Ana".into()));

        presenter.publish(BusMessage::StudentClear);
        let view = next_view(&mut views).await;
        assert_eq!(view.banner, BannerState::Hidden);

        // The cancelled display timer must not resurrect any banner state.
        let quiet = timeout(Duration::from_secs(10), views.changed()).await;
        assert!(quiet.is_err(), "no further banner transitions expected");
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeats_are_echoed_even_in_game_mode() {
        let bus = Bus::new();
        let presenter = bus.open("lesson");
        let mut presenter_sub = presenter.subscribe();
        let _audience = AudienceReceiver::spawn(&bus, "lesson");

        // Drain the mount-time resync request.
        assert_eq!(presenter_sub.recv().await, Some(BusMessage::StateRequest));

        presenter.publish(BusMessage::GameStateUpdate {
            state: GameSnapshot::loading(),
        });
        presenter.publish(BusMessage::Heartbeat { timestamp: 42 });

        loop {
            match presenter_sub.recv().await {
                Some(BusMessage::HeartbeatAck { timestamp }) => {
                    assert_eq!(timestamp, 42);
                    break;
                }
                Some(_) => continue,
                None => panic!("channel closed before ack"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn close_audience_shuts_the_window_down() {
        let bus = Bus::new();
        let presenter = bus.open("lesson");
        let audience = AudienceReceiver::spawn(&bus, "lesson");

        presenter.publish(BusMessage::CloseAudience);
        timeout(Duration::from_secs(5), audience.wait())
            .await
            .expect("audience closes promptly");
    }
}
