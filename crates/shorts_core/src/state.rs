use crate::view_model::AppViewModel;
use crate::{
    validate_range, BoundState, ChannelRef, Effect, JobHandle, JobId, OrchestrationError, Pipeline,
    ProgressReport, RangeSelection, RangeStatus, StopReason, TerminationRule, TickLedger,
};

/// Client-side limits applied to every job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Largest number of items a single job may request.
    pub cap: u32,
    pub termination: TerminationRule,
    /// Abandon a job after this many failed ticks in a row. `None` polls
    /// until the job completes or the user cancels.
    pub max_consecutive_poll_failures: Option<u32>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            cap: 30,
            termination: TerminationRule::RequireConversion,
            max_consecutive_poll_failures: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveJob {
    pub handle: JobHandle,
    pub ticks: TickLedger,
    pub consecutive_failures: u32,
}

impl ActiveJob {
    fn new(handle: JobHandle) -> Self {
        Self {
            handle,
            ticks: TickLedger::default(),
            consecutive_failures: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    Submitting {
        job_id: JobId,
    },
    Running(ActiveJob),
}

/// The single owned orchestration context. Only [`crate::update`] mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrchestrationState {
    policy: Policy,
    channel: Option<ChannelRef>,
    range: RangeSelection,
    bound: BoundState,
    discovery_seq: u64,
    phase: JobPhase,
    pipeline: Pipeline,
    last_error: Option<OrchestrationError>,
    last_job_id: JobId,
    dirty: bool,
}

impl OrchestrationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: Policy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            channel: self.channel.as_ref().map(|channel| channel.to_string()),
            range: self.range,
            range_status: self.range_status(),
            policy_cap: self.policy.cap,
            bound: self.bound.clone(),
            validating: self.bound.is_pending(),
            loading: self.is_busy(),
            progress: self.pipeline.snapshot(),
            last_error: self.last_error.clone(),
            dirty: self.dirty,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn channel(&self) -> Option<&ChannelRef> {
        self.channel.as_ref()
    }

    pub fn range(&self) -> RangeSelection {
        self.range
    }

    pub fn range_status(&self) -> RangeStatus {
        validate_range(self.range, self.bound.resolved(), self.policy.cap)
    }

    pub fn bound(&self) -> &BoundState {
        &self.bound
    }

    pub fn phase(&self) -> &JobPhase {
        &self.phase
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn last_error(&self) -> Option<&OrchestrationError> {
        self.last_error.as_ref()
    }

    /// A submission is in flight or a job is being polled.
    pub fn is_busy(&self) -> bool {
        !matches!(self.phase, JobPhase::Idle)
    }

    pub fn active_job(&self) -> Option<&ActiveJob> {
        match &self.phase {
            JobPhase::Running(job) => Some(job),
            _ => None,
        }
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn change_channel(&mut self, raw: &str) -> Vec<Effect> {
        let next = ChannelRef::parse(raw);
        if next == self.channel {
            return Vec::new();
        }
        // Bumping the sequence also orphans any lookup still in flight.
        self.discovery_seq += 1;
        if matches!(self.last_error, Some(OrchestrationError::Discovery(_))) {
            self.last_error = None;
        }
        self.mark_dirty();

        match next {
            None => {
                self.channel = None;
                self.bound = BoundState::Unset;
                Vec::new()
            }
            Some(channel) => {
                self.bound = BoundState::Pending {
                    stale: self.bound.last_known(),
                };
                self.channel = Some(channel.clone());
                vec![Effect::DiscoverBound {
                    seq: self.discovery_seq,
                    channel,
                    range: self.range,
                }]
            }
        }
    }

    pub(crate) fn set_range(&mut self, range: RangeSelection) {
        if range == self.range {
            return;
        }
        self.range = range;
        if matches!(
            self.last_error,
            Some(OrchestrationError::PolicyViolation(_) | OrchestrationError::RangeRejected(_))
        ) {
            self.last_error = None;
        }
        self.mark_dirty();
    }

    /// Returns `false` when the result belongs to a superseded lookup.
    pub(crate) fn apply_discovery(&mut self, seq: u64, result: Result<u32, String>) -> bool {
        if seq != self.discovery_seq || !self.bound.is_pending() {
            return false;
        }
        match result {
            Ok(count) => {
                self.bound = BoundState::Resolved(count);
                if self.range.end > count {
                    self.range.end = count;
                }
            }
            Err(message) => {
                self.bound = BoundState::Failed {
                    stale: self.bound.stale(),
                    message: message.clone(),
                };
                self.last_error = Some(OrchestrationError::Discovery(message));
            }
        }
        self.mark_dirty();
        true
    }

    pub(crate) fn begin_submission(&mut self) -> Vec<Effect> {
        if self.is_busy() {
            return self.reject(OrchestrationError::JobActive);
        }
        if let Err(violation) = self.range.check_policy(self.policy.cap) {
            return self.reject(violation.into());
        }
        let Some(channel) = self.channel.clone() else {
            return self.reject(OrchestrationError::MissingChannel);
        };
        match self.range_status() {
            RangeStatus::Valid => {}
            status => return self.reject(OrchestrationError::RangeRejected(status)),
        }

        self.last_job_id += 1;
        let job_id = self.last_job_id;
        self.phase = JobPhase::Submitting { job_id };
        self.pipeline = Pipeline::Idle;
        self.last_error = None;
        self.mark_dirty();
        vec![Effect::SubmitJob {
            job_id,
            channel,
            range: self.range,
        }]
    }

    fn reject(&mut self, error: OrchestrationError) -> Vec<Effect> {
        self.last_error = Some(error);
        self.mark_dirty();
        Vec::new()
    }

    pub(crate) fn finish_submission(
        &mut self,
        job_id: JobId,
        result: Result<JobHandle, String>,
    ) -> Vec<Effect> {
        if self.phase != (JobPhase::Submitting { job_id }) {
            return Vec::new();
        }
        self.mark_dirty();
        match result {
            Ok(handle) => {
                self.phase = JobPhase::Running(ActiveJob::new(handle));
                vec![Effect::StartPolling { job_id }]
            }
            Err(message) => {
                self.phase = JobPhase::Idle;
                self.last_error = Some(OrchestrationError::Submission(message));
                Vec::new()
            }
        }
    }

    pub(crate) fn issue_tick(&mut self, job_id: JobId) -> Vec<Effect> {
        match &mut self.phase {
            JobPhase::Running(job) if job.handle.job_id == job_id => {
                let tick = job.ticks.issue();
                vec![Effect::FetchProgress { job_id, tick }]
            }
            _ => Vec::new(),
        }
    }

    pub(crate) fn apply_progress(
        &mut self,
        job_id: JobId,
        tick: u64,
        result: Result<ProgressReport, String>,
    ) -> Vec<Effect> {
        let JobPhase::Running(job) = &mut self.phase else {
            return Vec::new();
        };
        if job.handle.job_id != job_id || job.ticks.is_stale(tick) {
            return Vec::new();
        }

        let report = match result {
            Ok(report) => report,
            Err(_) => {
                job.consecutive_failures += 1;
                let failures = job.consecutive_failures;
                return match self.policy.max_consecutive_poll_failures {
                    Some(max) if failures >= max => {
                        self.phase = JobPhase::Idle;
                        self.last_error = Some(OrchestrationError::PollGaveUp { failures });
                        self.mark_dirty();
                        vec![Effect::StopPolling {
                            job_id,
                            reason: StopReason::Abandoned,
                        }]
                    }
                    _ => Vec::new(),
                };
            }
        };

        job.ticks.accept(tick);
        job.consecutive_failures = 0;
        let handle = job.handle.clone();

        let pipeline = std::mem::take(&mut self.pipeline);
        self.pipeline = pipeline.advance(report, self.policy.termination, &handle);
        self.mark_dirty();

        if self.pipeline.is_completed() {
            self.phase = JobPhase::Idle;
            vec![Effect::StopPolling {
                job_id,
                reason: StopReason::Completed,
            }]
        } else {
            Vec::new()
        }
    }

    pub(crate) fn cancel(&mut self) -> Vec<Effect> {
        let effects = match &self.phase {
            JobPhase::Idle => return Vec::new(),
            JobPhase::Submitting { .. } => Vec::new(),
            JobPhase::Running(job) => vec![Effect::StopPolling {
                job_id: job.handle.job_id,
                reason: StopReason::Cancelled,
            }],
        };
        self.phase = JobPhase::Idle;
        self.mark_dirty();
        effects
    }

    pub(crate) fn dismiss_error(&mut self) {
        if self.last_error.take().is_some() {
            self.mark_dirty();
        }
    }
}
