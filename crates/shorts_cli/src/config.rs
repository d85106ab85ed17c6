//! On-disk configuration, stored as RON.
//!
//! Every field has a default, so a missing file or a partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use engine_logging::engine_info;
use serde::Deserialize;
use shorts_core::{Policy, TerminationRule};
use shorts_engine::{BackendSettings, EngineSettings, Endpoints};
use url::Url;

pub const DEFAULT_CONFIG_FILENAME: &str = "shorts.ron";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub base_url: String,
    pub token: String,
    pub policy_cap: u32,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub artifact_timeout_ms: u64,
    pub max_artifact_bytes: u64,
    pub max_consecutive_poll_failures: Option<u32>,
    /// Wait for the conversion feed to finish before reporting completion.
    pub expect_conversion: bool,
    pub output_dir: PathBuf,
    pub endpoints: EndpointPaths,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token: "mysecrettoken".to_string(),
            policy_cap: 30,
            poll_interval_ms: 1000,
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
            artifact_timeout_ms: 600_000,
            max_artifact_bytes: 2 * 1024 * 1024 * 1024,
            max_consecutive_poll_failures: None,
            expect_conversion: true,
            output_dir: PathBuf::from("downloads"),
            endpoints: EndpointPaths::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointPaths {
    pub discover: String,
    pub submit: String,
    pub download_progress: String,
    pub conversion_progress: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        let endpoints = Endpoints::default();
        Self {
            discover: endpoints.discover,
            submit: endpoints.submit,
            download_progress: endpoints.download_progress,
            conversion_progress: endpoints.conversion_progress,
        }
    }
}

impl From<EndpointPaths> for Endpoints {
    fn from(paths: EndpointPaths) -> Self {
        Endpoints {
            discover: paths.discover,
            submit: paths.submit,
            download_progress: paths.download_progress,
            conversion_progress: paths.conversion_progress,
        }
    }
}

impl AppConfig {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => {
                let config = Self::from_ron(&text)
                    .with_context(|| format!("invalid config file {}", path.display()))?;
                engine_info!("Loaded config from {:?}", path);
                Ok(config)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                engine_info!("No config at {:?}; using defaults", path);
                Ok(Self::default())
            }
            Err(err) => Err(err).with_context(|| format!("cannot read {}", path.display())),
        }
    }

    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    pub fn policy(&self) -> Policy {
        Policy {
            cap: self.policy_cap,
            termination: if self.expect_conversion {
                TerminationRule::RequireConversion
            } else {
                TerminationRule::DownloadOnly
            },
            max_consecutive_poll_failures: self.max_consecutive_poll_failures,
        }
    }

    pub fn backend_settings(&self) -> Result<BackendSettings> {
        let base_url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid base_url {:?}", self.base_url))?;
        let mut settings = BackendSettings::new(base_url, self.token.clone());
        settings.connect_timeout = Duration::from_millis(self.connect_timeout_ms);
        settings.request_timeout = Duration::from_millis(self.request_timeout_ms);
        settings.artifact_timeout = Duration::from_millis(self.artifact_timeout_ms);
        settings.max_artifact_bytes = self.max_artifact_bytes;
        settings.endpoints = self.endpoints.clone().into();
        Ok(settings)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}
