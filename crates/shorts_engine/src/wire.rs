//! JSON bodies exchanged with the backend.

use serde::{Deserialize, Serialize};
use shorts_core::{Stage, StageProgress};

#[derive(Debug, Serialize)]
pub(crate) struct ShortsRequest<'a> {
    pub channel_url: &'a str,
    pub start_index: u32,
    pub end_index: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShortsListResponse {
    pub shorts_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitResponse {
    pub download_link: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Progress feed body. The backend answers `{}` until a job has started,
/// so every field is optional.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProgressResponse {
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub completed: u32,
    #[serde(default)]
    pub total: u32,
}

impl From<ProgressResponse> for StageProgress {
    fn from(response: ProgressResponse) -> Self {
        let stage = response
            .stage
            .as_deref()
            .map(Stage::from_label)
            .unwrap_or_default();
        StageProgress::new(stage, response.completed, response.total)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

pub(crate) fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}
