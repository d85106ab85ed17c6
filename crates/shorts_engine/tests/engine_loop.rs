use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use shorts_core::{
    BoundState, ChannelRef, Msg, OrchestrationError, OrchestrationState, Policy, RangeSelection,
    Stage, StageProgress,
};
use shorts_engine::{Backend, BackendError, Engine, EngineSettings, FailureKind};
use url::Url;

const HOUR: Duration = Duration::from_secs(3600);

#[derive(Clone)]
struct Scripted {
    delay: Duration,
    result: Result<StageProgress, BackendError>,
}

fn after(delay: Duration, stage: &str, completed: u32, total: u32) -> Scripted {
    Scripted {
        delay,
        result: Ok(StageProgress::new(Stage::from_label(stage), completed, total)),
    }
}

fn now(stage: &str, completed: u32, total: u32) -> Scripted {
    after(Duration::ZERO, stage, completed, total)
}

/// Backend whose answers follow a script. The last entry of each feed
/// repeats forever.
struct ScriptedBackend {
    base: Url,
    bounds: HashMap<String, (Duration, u32)>,
    downloads: Mutex<VecDeque<Scripted>>,
    conversions: Mutex<VecDeque<Scripted>>,
    download_calls: AtomicUsize,
    conversion_calls: AtomicUsize,
    submit_calls: AtomicUsize,
}

impl ScriptedBackend {
    fn new(downloads: Vec<Scripted>, conversions: Vec<Scripted>) -> Self {
        Self {
            base: Url::parse("http://backend.test").unwrap(),
            bounds: HashMap::from([("chan".to_string(), (Duration::ZERO, 12))]),
            downloads: Mutex::new(downloads.into()),
            conversions: Mutex::new(conversions.into()),
            download_calls: AtomicUsize::new(0),
            conversion_calls: AtomicUsize::new(0),
            submit_calls: AtomicUsize::new(0),
        }
    }

    fn with_bound(mut self, channel: &str, delay: Duration, count: u32) -> Self {
        self.bounds.insert(channel.to_string(), (delay, count));
        self
    }

    fn next(feed: &Mutex<VecDeque<Scripted>>) -> Scripted {
        let mut feed = feed.lock().unwrap();
        if feed.len() > 1 {
            feed.pop_front().unwrap()
        } else {
            feed.front().cloned().expect("script exhausted")
        }
    }

    async fn play(entry: Scripted) -> Result<StageProgress, BackendError> {
        if !entry.delay.is_zero() {
            tokio::time::sleep(entry.delay).await;
        }
        entry.result
    }
}

#[async_trait::async_trait]
impl Backend for ScriptedBackend {
    fn base_url(&self) -> &Url {
        &self.base
    }

    async fn discover_bound(
        &self,
        channel: &ChannelRef,
        _range: RangeSelection,
    ) -> Result<u32, BackendError> {
        let (delay, count) = self.bounds.get(channel.as_str()).copied().ok_or_else(|| {
            BackendError {
                kind: FailureKind::HttpStatus(404),
                message: "No Shorts URLs found.".into(),
            }
        })?;
        tokio::time::sleep(delay).await;
        Ok(count)
    }

    async fn submit_job(
        &self,
        _channel: &ChannelRef,
        _range: RangeSelection,
    ) -> Result<String, BackendError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        Ok("/download/shorts_videos.zip".into())
    }

    async fn download_progress(&self) -> Result<StageProgress, BackendError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        Self::play(Self::next(&self.downloads)).await
    }

    async fn conversion_progress(&self) -> Result<StageProgress, BackendError> {
        self.conversion_calls.fetch_add(1, Ordering::SeqCst);
        Self::play(Self::next(&self.conversions)).await
    }
}

fn engine_with(backend: Arc<ScriptedBackend>, policy: Policy) -> Engine {
    engine_logging::initialize_for_tests();
    Engine::new(
        OrchestrationState::with_policy(policy),
        backend,
        EngineSettings {
            poll_interval: Duration::from_millis(1000),
        },
    )
}

/// Selects `chan`, waits for its bound, selects `0..end` and submits.
async fn submit(engine: &mut Engine, end: u32) {
    engine.dispatch(Msg::ChannelChanged("chan".into()));
    engine.run_until(|state| !state.bound().is_pending()).await;
    engine.dispatch(Msg::EndChanged(end));
    engine.dispatch(Msg::SubmitClicked);
    engine
        .run_until(|state| state.active_job().is_some() || !state.is_busy())
        .await;
    assert!(engine.is_polling());
}

#[tokio::test(start_paused = true)]
async fn scenario_runs_to_single_completion() {
    let backend = Arc::new(ScriptedBackend::new(
        vec![
            now("Downloading", 3, 10),
            now("Downloading", 10, 10),
            now("Converting to MP4", 10, 10),
            now("Completed", 10, 10),
        ],
        vec![now("Converting to MP4", 0, 5), now("Converting to MP4", 5, 5)],
    ));
    let mut engine = engine_with(backend.clone(), Policy::default());
    let mut snapshots = engine.subscribe();

    submit(&mut engine, 10).await;
    tokio::time::timeout(Duration::from_secs(60), engine.run_until(|state| !state.is_busy()))
        .await
        .expect("job finishes");

    let outcome = engine.state().pipeline().outcome().expect("outcome").clone();
    assert_eq!(
        outcome.artifact_link,
        "http://backend.test/download/shorts_videos.zip"
    );
    assert_eq!(outcome.conversion.completed, 5);
    assert_eq!(backend.download_calls.load(Ordering::SeqCst), 4);
    // Conversion is fetched on the Converting tick and the Completed tick only.
    assert_eq!(backend.conversion_calls.load(Ordering::SeqCst), 2);
    assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 1);
    assert!(!engine.is_polling());

    let view = snapshots.borrow_and_update().clone();
    assert_eq!(
        view.progress.artifact_link.as_deref(),
        Some("http://backend.test/download/shorts_videos.zip")
    );
    assert!(!view.loading);

    // No further ticks are scheduled after termination.
    let idle = tokio::time::timeout(Duration::from_secs(10), engine.step()).await;
    assert!(idle.is_err());
    assert_eq!(backend.download_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn job_without_conversion_work_completes() {
    // The backend reports an empty conversion phase when every download is
    // already an mp4.
    let backend = Arc::new(ScriptedBackend::new(
        vec![
            now("Downloading", 5, 10),
            now("Converting to MP4", 10, 10),
            now("Completed", 10, 10),
        ],
        vec![now("Converting to MP4", 0, 0)],
    ));
    let mut engine = engine_with(backend.clone(), Policy::default());
    let mut snapshots = engine.subscribe();

    submit(&mut engine, 10).await;
    tokio::time::timeout(Duration::from_secs(60), engine.run_until(|state| !state.is_busy()))
        .await
        .expect("job finishes");

    assert!(engine.state().pipeline().is_completed());
    assert!(engine.state().last_error().is_none());
    assert!(!engine.is_polling());
    assert_eq!(backend.download_calls.load(Ordering::SeqCst), 3);
    assert_eq!(backend.conversion_calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        snapshots.borrow_and_update().progress.artifact_link.as_deref(),
        Some("http://backend.test/download/shorts_videos.zip")
    );

    let idle = tokio::time::timeout(Duration::from_secs(10), engine.step()).await;
    assert!(idle.is_err());
    assert_eq!(backend.download_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn slow_tick_never_overwrites_newer_tick() {
    // Tick 1 fires at 1s and answers at 2.5s; tick 2 fires at 2s and
    // answers at once; tick 3 fires at 3s and never answers.
    let backend = Arc::new(ScriptedBackend::new(
        vec![
            after(Duration::from_millis(1500), "Downloading", 3, 10),
            now("Downloading", 6, 10),
            after(HOUR, "Downloading", 9, 10),
        ],
        vec![now("", 0, 0)],
    ));
    let mut engine = engine_with(backend.clone(), Policy::default());
    submit(&mut engine, 10).await;

    let _ = tokio::time::timeout(Duration::from_millis(3500), engine.run_until(|_| false)).await;

    let download = engine.state().pipeline().download().cloned().expect("progress");
    assert_eq!((download.completed, download.total), (6, 10));
    assert_eq!(engine.state().active_job().unwrap().ticks.applied(), 2);
    assert_eq!(backend.download_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn latest_channel_lookup_wins() {
    let backend = Arc::new(
        ScriptedBackend::new(vec![now("", 0, 0)], vec![now("", 0, 0)])
            .with_bound("first", Duration::from_millis(500), 5)
            .with_bound("second", Duration::from_millis(10), 12),
    );
    let mut engine = engine_with(backend, Policy::default());

    engine.dispatch(Msg::ChannelChanged("first".into()));
    engine.dispatch(Msg::ChannelChanged("second".into()));
    engine
        .run_until(|state| !state.bound().is_pending())
        .await;
    assert_eq!(engine.state().bound(), &BoundState::Resolved(12));

    // The superseded lookup was aborted and never reports back.
    let late = tokio::time::timeout(Duration::from_secs(2), engine.step()).await;
    assert!(late.is_err());
    assert_eq!(engine.state().bound(), &BoundState::Resolved(12));
}

#[tokio::test(start_paused = true)]
async fn failed_ticks_keep_polling_until_limit() {
    let failing = Scripted {
        delay: Duration::ZERO,
        result: Err(BackendError {
            kind: FailureKind::Network,
            message: "connection refused".into(),
        }),
    };
    let backend = Arc::new(ScriptedBackend::new(vec![failing], vec![now("", 0, 0)]));
    let mut engine = engine_with(
        backend.clone(),
        Policy {
            max_consecutive_poll_failures: Some(3),
            ..Policy::default()
        },
    );
    submit(&mut engine, 10).await;

    tokio::time::timeout(Duration::from_secs(30), engine.run_until(|state| !state.is_busy()))
        .await
        .expect("job abandoned");

    assert_eq!(backend.download_calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        engine.state().last_error(),
        Some(&OrchestrationError::PollGaveUp { failures: 3 })
    );
    assert!(!engine.is_polling());
}

#[tokio::test(start_paused = true)]
async fn over_cap_submission_makes_no_call() {
    let backend = Arc::new(
        ScriptedBackend::new(vec![now("", 0, 0)], vec![now("", 0, 0)]).with_bound(
            "small",
            Duration::ZERO,
            5,
        ),
    );
    let mut engine = engine_with(backend.clone(), Policy::default());

    engine.dispatch(Msg::ChannelChanged("small".into()));
    engine.run_until(|state| !state.bound().is_pending()).await;
    engine.dispatch(Msg::EndChanged(40));
    engine.dispatch(Msg::SubmitClicked);

    assert!(matches!(
        engine.state().last_error(),
        Some(OrchestrationError::PolicyViolation(violation)) if violation.cap == 30
    ));
    let idle = tokio::time::timeout(Duration::from_secs(2), engine.step()).await;
    assert!(idle.is_err());
    assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_the_timer() {
    let backend = Arc::new(ScriptedBackend::new(
        vec![now("Downloading", 1, 10)],
        vec![now("", 0, 0)],
    ));
    let mut engine = engine_with(backend.clone(), Policy::default());
    submit(&mut engine, 10).await;

    let sender = engine.sender();
    sender.send(Msg::CancelClicked).unwrap();
    engine.run_until(|state| !state.is_busy()).await;
    assert!(!engine.is_polling());

    let idle = tokio::time::timeout(Duration::from_secs(5), engine.step()).await;
    assert!(idle.is_err());
    assert_eq!(backend.download_calls.load(Ordering::SeqCst), 0);
}
