use std::time::Duration;

use url::Url;

/// Paths of the backend endpoints, relative to `base_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub discover: String,
    pub submit: String,
    pub download_progress: String,
    pub conversion_progress: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            discover: "/get-shorts".to_string(),
            submit: "/download-shorts".to_string(),
            download_progress: "/download-progress".to_string(),
            // Spelling matches the deployed backend.
            conversion_progress: "/covertion-progress".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: Url,
    /// Static bearer token sent on every authenticated call.
    pub token: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Whole-transfer timeout for the artifact, which is much larger than
    /// any JSON reply.
    pub artifact_timeout: Duration,
    pub max_artifact_bytes: u64,
    pub endpoints: Endpoints,
}

impl BackendSettings {
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        Self {
            base_url,
            token: token.into(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            artifact_timeout: Duration::from_secs(600),
            max_artifact_bytes: 2 * 1024 * 1024 * 1024,
            endpoints: Endpoints::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub poll_interval: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1000),
        }
    }
}
