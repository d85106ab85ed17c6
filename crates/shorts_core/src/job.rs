use url::Url;

use crate::StageProgress;

pub type JobId = u64;

/// Accepted submission. The artifact URL is known up front but only
/// becomes downloadable once the job completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: JobId,
    pub download_link: String,
    pub artifact_url: Url,
}

impl JobHandle {
    /// Resolves the backend's relative `download_link` against its origin.
    pub fn resolve(job_id: JobId, base: &Url, download_link: &str) -> Result<Self, url::ParseError> {
        let artifact_url = base.join(download_link)?;
        Ok(Self {
            job_id,
            download_link: download_link.to_owned(),
            artifact_url,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub job_id: JobId,
    pub artifact_link: String,
    pub download: StageProgress,
    pub conversion: StageProgress,
}

/// Issuance bookkeeping for poll ticks. A response is applied only when it
/// belongs to a tick issued after the last applied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickLedger {
    issued: u64,
    applied: u64,
}

impl TickLedger {
    pub fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn is_stale(&self, tick: u64) -> bool {
        tick <= self.applied || tick > self.issued
    }

    pub fn accept(&mut self, tick: u64) -> bool {
        if self.is_stale(tick) {
            return false;
        }
        self.applied = tick;
        true
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn applied(&self) -> u64 {
        self.applied
    }
}
