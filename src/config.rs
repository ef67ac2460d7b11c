use std::collections::HashMap;
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_RUN_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_JUDGE_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

const ACCESS_TOKEN_ENV: &str = "JUDGE_ACCESS_TOKEN";

#[derive(Parser)]
#[command(name = "judge-relay", version = "0.1", about, long_about = None)]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(long = "config", short = 'c')]
    pub config_path: String,

    /// Whether to flush the stored solutions database
    #[arg(long = "flush-data", short = 'f', default_value_t = false)]
    pub flush_data: bool,
}

impl CliArgs {
    /// Load the configuration from the specified file
    pub fn to_config(&self) -> std::io::Result<Config> {
        let file = std::fs::File::open(&self.config_path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| e.into())
    }
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub judge: JudgeConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
    pub history_capacity: Option<usize>,
    /// Extra or overriding `name -> remote id` language entries
    #[serde(default)]
    pub languages: HashMap<String, u32>,
}

impl Config {
    pub fn history_capacity(&self) -> usize {
        self.history_capacity.unwrap_or(DEFAULT_HISTORY_CAPACITY)
    }
}

#[derive(Deserialize, Debug)]
pub struct ServerConfig {
    pub bind_address: Option<String>,
    pub bind_port: Option<u16>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct JudgeConfig {
    pub base_url: String,
    pub access_token: Option<String>,
    pub request_timeout_ms: Option<u64>,
}

impl JudgeConfig {
    /// Token from the file, falling back to the environment
    pub fn access_token(&self) -> Option<String> {
        self.access_token
            .clone()
            .or_else(|| std::env::var(ACCESS_TOKEN_ENV).ok())
            .filter(|t| !t.is_empty())
    }

    pub fn request_timeout_ms(&self) -> u64 {
        self.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS)
    }
}

#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub struct WatcherConfig {
    pub poll_interval_ms: Option<u64>,
    pub run_timeout_ms: Option<u64>,
    pub judge_timeout_ms: Option<u64>,
}

impl WatcherConfig {
    /// Never zero; a configured `0` polls every millisecond
    pub fn poll_interval(&self) -> Duration {
        let millis = self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        Duration::from_millis(millis.max(1))
    }

    /// Deadline of a single run
    pub fn run_timeout(&self) -> Duration {
        Duration::from_millis(self.run_timeout_ms.unwrap_or(DEFAULT_RUN_TIMEOUT_MS))
    }

    /// Deadline of a whole judged sweep
    pub fn judge_timeout(&self) -> Duration {
        Duration::from_millis(self.judge_timeout_ms.unwrap_or(DEFAULT_JUDGE_TIMEOUT_MS))
    }
}
