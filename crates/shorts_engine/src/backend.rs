use futures_util::StreamExt;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shorts_core::{ChannelRef, RangeSelection, StageProgress};
use url::Url;

use crate::settings::BackendSettings;
use crate::wire::{ProgressResponse, ShortsListResponse, ShortsRequest, SubmitResponse};
use crate::{BackendError, FailureKind};

/// The remote job service. One call per method, no retries.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Origin that relative download links resolve against.
    fn base_url(&self) -> &Url;

    /// Number of eligible items in `channel`.
    async fn discover_bound(
        &self,
        channel: &ChannelRef,
        range: RangeSelection,
    ) -> Result<u32, BackendError>;

    /// Starts a job and returns its relative download link.
    async fn submit_job(
        &self,
        channel: &ChannelRef,
        range: RangeSelection,
    ) -> Result<String, BackendError>;

    async fn download_progress(&self) -> Result<StageProgress, BackendError>;

    async fn conversion_progress(&self) -> Result<StageProgress, BackendError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: BackendSettings,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.settings
            .base_url
            .join(path)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.settings.token)
    }

    async fn post_selection<T: DeserializeOwned>(
        &self,
        path: &str,
        channel: &ChannelRef,
        range: RangeSelection,
    ) -> Result<T, BackendError> {
        let url = self.endpoint(path)?;
        let body = ShortsRequest {
            channel_url: channel.as_str(),
            start_index: range.start,
            end_index: range.end,
        };
        let response = self
            .authorized(self.client.post(url))
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }

    async fn get_progress(&self, path: &str) -> Result<StageProgress, BackendError> {
        let url = self.endpoint(path)?;
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: ProgressResponse = read_json(response).await?;
        Ok(body.into())
    }

    /// Downloads the finished artifact. The download route is public, so no
    /// token is sent. Fails once the body grows past `max_artifact_bytes`.
    pub async fn fetch_artifact(&self, url: &Url) -> Result<Vec<u8>, BackendError> {
        let max_bytes = self.settings.max_artifact_bytes;
        let response = self
            .client
            .get(url.clone())
            .timeout(self.settings.artifact_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::from_status(status.as_u16(), &body));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }
        engine_logging::engine_debug!("fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    fn base_url(&self) -> &Url {
        &self.settings.base_url
    }

    async fn discover_bound(
        &self,
        channel: &ChannelRef,
        range: RangeSelection,
    ) -> Result<u32, BackendError> {
        let body: ShortsListResponse = self
            .post_selection(&self.settings.endpoints.discover, channel, range)
            .await?;
        u32::try_from(body.shorts_urls.len())
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))
    }

    async fn submit_job(
        &self,
        channel: &ChannelRef,
        range: RangeSelection,
    ) -> Result<String, BackendError> {
        let body: SubmitResponse = self
            .post_selection(&self.settings.endpoints.submit, channel, range)
            .await?;
        if let Some(message) = body.message.as_deref() {
            engine_logging::engine_info!("backend accepted job: {}", message);
        }
        Ok(body.download_link)
    }

    async fn download_progress(&self) -> Result<StageProgress, BackendError> {
        self.get_progress(&self.settings.endpoints.download_progress)
            .await
    }

    async fn conversion_progress(&self) -> Result<StageProgress, BackendError> {
        self.get_progress(&self.settings.endpoints.conversion_progress)
            .await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::from_status(status.as_u16(), &body));
    }
    response.json::<T>().await.map_err(map_reqwest_error)
}

fn too_large(max_bytes: u64, actual: u64) -> BackendError {
    BackendError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "artifact too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return BackendError::new(FailureKind::Decode, err.to_string());
    }
    BackendError::new(FailureKind::Network, err.to_string())
}
