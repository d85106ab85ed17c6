use std::sync::Arc;

use engine_logging::{engine_debug, engine_info, engine_trace, engine_warn};
use shorts_core::{update, AppViewModel, Effect, Msg, OrchestrationState, StopReason};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::poller::{poll_once, PollTimer};
use crate::settings::EngineSettings;
use crate::{Backend, JobSubmitter};

/// Owns the orchestration state and runs its effects.
///
/// Every network call runs in its own task and reports back through the
/// message queue, so state only changes inside [`Engine::dispatch`].
pub struct Engine {
    state: OrchestrationState,
    backend: Arc<dyn Backend>,
    submitter: JobSubmitter,
    settings: EngineSettings,
    msg_tx: mpsc::UnboundedSender<Msg>,
    msg_rx: mpsc::UnboundedReceiver<Msg>,
    discovery: Option<JoinHandle<()>>,
    poll_timer: Option<PollTimer>,
    snapshots: watch::Sender<AppViewModel>,
}

impl Engine {
    pub fn new(state: OrchestrationState, backend: Arc<dyn Backend>, settings: EngineSettings) -> Self {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(state.view());
        let submitter = JobSubmitter::new(backend.clone(), state.policy().cap);
        Self {
            state,
            backend,
            submitter,
            settings,
            msg_tx,
            msg_rx,
            discovery: None,
            poll_timer: None,
            snapshots,
        }
    }

    /// Handle for posting user input from outside the engine.
    pub fn sender(&self) -> mpsc::UnboundedSender<Msg> {
        self.msg_tx.clone()
    }

    /// Snapshots published after every visible change.
    pub fn subscribe(&self) -> watch::Receiver<AppViewModel> {
        self.snapshots.subscribe()
    }

    pub fn state(&self) -> &OrchestrationState {
        &self.state
    }

    pub fn is_polling(&self) -> bool {
        self.poll_timer
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    pub fn dispatch(&mut self, msg: Msg) {
        match &msg {
            Msg::PollTick { .. } | Msg::ProgressFetched { .. } => engine_trace!("dispatch {:?}", msg),
            _ => engine_debug!("dispatch {:?}", msg),
        }

        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let view = state.view();
        let was_dirty = state.consume_dirty();
        self.state = state;

        for effect in effects {
            self.run_effect(effect);
        }
        if was_dirty {
            self.snapshots.send_replace(view);
        }
    }

    /// Waits for the next message and dispatches it.
    pub async fn step(&mut self) -> bool {
        match self.msg_rx.recv().await {
            Some(msg) => {
                self.dispatch(msg);
                true
            }
            None => false,
        }
    }

    pub async fn run_until<F>(&mut self, mut done: F)
    where
        F: FnMut(&OrchestrationState) -> bool,
    {
        while !done(&self.state) {
            if !self.step().await {
                break;
            }
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::DiscoverBound {
                seq,
                channel,
                range,
            } => {
                if let Some(previous) = self.discovery.take() {
                    if !previous.is_finished() {
                        engine_debug!("aborting superseded channel lookup");
                    }
                    previous.abort();
                }
                let backend = self.backend.clone();
                let tx = self.msg_tx.clone();
                self.discovery = Some(tokio::spawn(async move {
                    let result = backend
                        .discover_bound(&channel, range)
                        .await
                        .map_err(|err| {
                            engine_warn!("lookup of {} failed: {}", channel, err);
                            err.to_string()
                        });
                    let _ = tx.send(Msg::BoundDiscovered { seq, result });
                }));
            }
            Effect::SubmitJob {
                job_id,
                channel,
                range,
            } => {
                let submitter = self.submitter.clone();
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = submitter
                        .submit(job_id, &channel, range)
                        .await
                        .map_err(|err| {
                            engine_warn!("job {} submission failed: {}", job_id, err);
                            err.to_string()
                        });
                    if let Ok(handle) = &result {
                        engine_info!("job {} accepted, artifact at {}", job_id, handle.artifact_url);
                    }
                    let _ = tx.send(Msg::JobSubmitted { job_id, result });
                });
            }
            Effect::StartPolling { job_id } => {
                if let Some(previous) = self.poll_timer.take() {
                    engine_warn!("replacing poll timer of job {}", previous.job_id());
                    previous.stop();
                }
                self.poll_timer = Some(PollTimer::start(
                    job_id,
                    self.settings.poll_interval,
                    self.msg_tx.clone(),
                ));
            }
            Effect::FetchProgress { job_id, tick } => {
                let backend = self.backend.clone();
                let tx = self.msg_tx.clone();
                tokio::spawn(async move {
                    let result = poll_once(backend.as_ref())
                        .await
                        .map_err(|err| {
                            engine_warn!("job {} poll tick {} failed: {}", job_id, tick, err);
                            err.to_string()
                        });
                    let _ = tx.send(Msg::ProgressFetched {
                        job_id,
                        tick,
                        result,
                    });
                });
            }
            Effect::StopPolling { job_id, reason } => match self.poll_timer.take() {
                Some(timer) if timer.job_id() == job_id => {
                    timer.stop();
                    match reason {
                        StopReason::Completed => engine_info!("job {} completed", job_id),
                        StopReason::Abandoned => engine_warn!("job {} abandoned", job_id),
                        StopReason::Cancelled => engine_info!("job {} cancelled", job_id),
                    }
                }
                other => self.poll_timer = other,
            },
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(discovery) = self.discovery.take() {
            discovery.abort();
        }
    }
}
