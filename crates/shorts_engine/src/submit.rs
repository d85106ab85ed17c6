use std::sync::Arc;

use shorts_core::{ChannelRef, JobHandle, JobId, PolicyViolation, RangeSelection};

use crate::{Backend, BackendError, FailureKind};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    PolicyViolation(#[from] PolicyViolation),
    #[error("{0}")]
    Submission(BackendError),
}

/// Guards the policy cap locally, then starts the job on the backend.
#[derive(Clone)]
pub struct JobSubmitter {
    backend: Arc<dyn Backend>,
    policy_cap: u32,
}

impl JobSubmitter {
    pub fn new(backend: Arc<dyn Backend>, policy_cap: u32) -> Self {
        Self {
            backend,
            policy_cap,
        }
    }

    pub async fn submit(
        &self,
        job_id: JobId,
        channel: &ChannelRef,
        range: RangeSelection,
    ) -> Result<JobHandle, SubmitError> {
        range.check_policy(self.policy_cap)?;

        let link = self
            .backend
            .submit_job(channel, range)
            .await
            .map_err(SubmitError::Submission)?;
        JobHandle::resolve(job_id, self.backend.base_url(), &link).map_err(|err| {
            SubmitError::Submission(BackendError::new(
                FailureKind::InvalidUrl,
                format!("download link {link:?}: {err}"),
            ))
        })
    }
}
