use std::time::Duration;

use shorts_core::{JobId, Msg, ProgressReport};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{Backend, BackendError};

/// One tick: the download feed, then the conversion feed once the backend
/// has reached a stage where it means something.
pub async fn poll_once(backend: &dyn Backend) -> Result<ProgressReport, BackendError> {
    let download = backend.download_progress().await?;
    let conversion = if download.stage.follows_conversion() {
        Some(backend.conversion_progress().await?)
    } else {
        None
    };
    Ok(ProgressReport {
        download,
        conversion,
    })
}

/// Fixed-cadence timer that posts [`Msg::PollTick`] for one job. The first
/// tick fires one period after start. Dropping the timer stops it.
pub struct PollTimer {
    job_id: JobId,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollTimer {
    pub fn start(job_id: JobId, period: Duration, tx: UnboundedSender<Msg>) -> Self {
        let period = period.max(Duration::from_millis(1));
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        if tx.send(Msg::PollTick { job_id }).is_err() {
                            break;
                        }
                    }
                }
            }
        });
        Self {
            job_id,
            token,
            task,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Consumes the timer so it can only be stopped once.
    pub fn stop(self) {
        self.token.cancel();
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
