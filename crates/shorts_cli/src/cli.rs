use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use engine_logging::LogDestination;
use log::LevelFilter;

use crate::config::{AppConfig, DEFAULT_CONFIG_FILENAME};

const LOG_FILENAME: &str = "shorts.log";

/// Submit a Shorts batch job and follow it until the archive is ready.
#[derive(Debug, Parser)]
#[command(name = "shorts", version)]
#[command(about = "Submit a Shorts batch job and follow it to completion", long_about = None)]
pub struct Cli {
    /// Channel URL, e.g. https://www.youtube.com/@name/shorts
    #[arg(long)]
    pub channel: String,

    /// First item of the range (inclusive).
    #[arg(long, default_value_t = 0)]
    pub start: u32,

    /// End of the range (exclusive). Defaults to 10, clamped to the channel size.
    #[arg(long)]
    pub end: Option<u32>,

    /// RON config file. A missing file means defaults.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILENAME)]
    pub config: PathBuf,

    /// Backend base URL; overrides the config file.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Bearer token; overrides the config file.
    #[arg(long, env = "SHORTS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Directory for the downloaded archive; overrides the config file.
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Report the archive link without fetching it.
    #[arg(long)]
    pub no_download: bool,

    #[arg(long, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,

    #[arg(long, value_name = "LEVEL", default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    /// ./shorts.log only
    File,
    Terminal,
    Both,
}

impl LogTarget {
    pub fn destination(self) -> LogDestination {
        match self {
            LogTarget::File => LogDestination::File(PathBuf::from(LOG_FILENAME)),
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both(PathBuf::from(LOG_FILENAME)),
        }
    }
}

impl Cli {
    /// Flags given on the command line win over the file.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(token) = &self.token {
            config.token = token.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
    }
}
