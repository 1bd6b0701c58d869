//! Podium presenter - demo entry point.
//!
//! Runs a scripted lesson against an in-process audience window: walks a
//! sample deck, cold-calls readers, runs a short quiz, and logs the
//! audience-link state along the way. Real deployments replace the
//! [`EnvDisplayHost`] and [`InProcessOpener`] with the host platform's
//! window APIs; everything else is the production path.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use podium_bus::Bus;
use podium_domain::{PermissionState, ScreenTarget};
use podium_presenter::{
    assign_readers, DisplayHost, DisplayPlacementService, GamePatch, InProcessOpener, LaunchError,
    PresenterSession, Settings,
};
use podium_protocol::{GameMode, GameSnapshot, QuizQuestion, Slide};

/// Display host configured from the environment.
///
/// `PODIUM_PLACEMENT` = granted | denied | prompt | unavailable
/// (default granted, with one fake secondary display).
struct EnvDisplayHost {
    permission: PermissionState,
    // Held so the change channel stays open for the watcher.
    _changes_tx: watch::Sender<PermissionState>,
    changes_rx: watch::Receiver<PermissionState>,
}

impl EnvDisplayHost {
    fn from_env() -> Self {
        let permission = match std::env::var("PODIUM_PLACEMENT").as_deref() {
            Ok("denied") => PermissionState::Denied,
            Ok("prompt") => PermissionState::Prompt,
            Ok("unavailable") => PermissionState::Unavailable,
            _ => PermissionState::Granted,
        };
        let (tx, rx) = watch::channel(permission);
        Self {
            permission,
            _changes_tx: tx,
            changes_rx: rx,
        }
    }
}

#[async_trait]
impl DisplayHost for EnvDisplayHost {
    async fn permission(&self) -> PermissionState {
        self.permission
    }

    async fn request_permission(&self) -> PermissionState {
        self.permission
    }

    async fn secondary_displays(&self) -> Vec<ScreenTarget> {
        vec![ScreenTarget {
            left: 1920,
            top: 0,
            width: 1920,
            height: 1080,
            label: "DEMO-1".into(),
        }]
    }

    fn permission_changes(&self) -> watch::Receiver<PermissionState> {
        self.changes_rx.clone()
    }
}

fn sample_deck() -> Vec<Slide> {
    vec![
        Slide::new("Welcome", vec![]),
        Slide::new(
            "Water cycle",
            vec![
                "Evaporation".into(),
                "Condensation".into(),
                "Precipitation".into(),
            ],
        )
        .with_read_aloud(),
        Slide::new("Key terms", vec!["Humidity".into(), "Dew point".into()]).with_read_aloud(),
        Slide::new("Recap", vec!["Questions?".into()]),
    ]
}

fn sample_quiz() -> Vec<QuizQuestion> {
    vec![
        QuizQuestion {
            prompt: "Which process turns vapor into droplets?".into(),
            choices: vec!["Evaporation".into(), "Condensation".into(), "Runoff".into()],
            correct_index: 1,
        },
        QuizQuestion {
            prompt: "What falls as rain or snow?".into(),
            choices: vec!["Precipitation".into(), "Percolation".into()],
            correct_index: 0,
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "podium=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env();
    tracing::info!(channel = %settings.channel, "Starting Podium presenter");

    let roster: Vec<String> = vec!["Ana".into(), "Ben".into(), "Cleo".into(), "Dara".into()];
    let deck = sample_deck();
    let mut rng = rand::thread_rng();
    for (slide, reader) in assign_readers(&deck, &roster, &mut rng)? {
        tracing::info!(slide, reader = %reader, "Pre-assigned reading slot");
    }

    let bus = Bus::new();
    let session = PresenterSession::start(
        &bus,
        &settings.channel,
        deck.clone(),
        &roster,
        settings.heartbeat,
    )?;
    let link = session.link();

    // Placement: pre-fetch geometry now so the launch path stays synchronous.
    let placement = DisplayPlacementService::new(
        Arc::new(EnvDisplayHost::from_env()),
        settings.audience_url.clone(),
    );
    placement.refresh().await;
    if let Some(text) = placement.permission().remediation() {
        tracing::warn!("{text}");
    }
    let watcher = placement.spawn_watcher(Some(settings.permission_poll));

    let opener = InProcessOpener::new(bus.clone());
    let window = match placement.launch(&opener) {
        Ok(window) => window,
        Err(err @ LaunchError::Blocked { .. }) => {
            tracing::error!("{err}");
            return Ok(());
        }
    };

    // Give the audience window a beat to mount and resync.
    sleep(Duration::from_secs(1)).await;
    tracing::info!(connected = link.is_connected(), "Audience link");

    // Walk the deck, cold-calling on read-aloud slides.
    for _ in 0..12 {
        let on_read_aloud = {
            let controller = session.controller();
            let snapshot = controller.snapshot();
            snapshot.slides[snapshot.current_index].read_aloud
                && snapshot.visible_bullets == 0
        };
        if on_read_aloud {
            session.controller().select_student();
            sleep(Duration::from_secs(4)).await;
        }
        session.controller().advance();
        sleep(Duration::from_secs(1)).await;
    }

    // A short quiz between slides and recap.
    session.controller().open_game(GameSnapshot::loading());
    sleep(Duration::from_secs(1)).await;
    session.controller().update_game(GamePatch {
        mode: Some(GameMode::Play),
        questions: Some(sample_quiz()),
        ..GamePatch::default()
    });
    sleep(Duration::from_secs(2)).await;
    session.controller().update_game(GamePatch {
        is_answer_revealed: Some(true),
        ..GamePatch::default()
    });
    sleep(Duration::from_secs(2)).await;
    session.controller().update_game(GamePatch {
        mode: Some(GameMode::Summary),
        ..GamePatch::default()
    });
    sleep(Duration::from_secs(2)).await;
    session.controller().close_game();

    tracing::info!(connected = link.is_connected(), "Lesson done; closing down");
    session.close_audience();
    sleep(Duration::from_millis(200)).await;
    if !window.is_closed() {
        window.close();
    }
    watcher.abort();
    session.shutdown();
    Ok(())
}
