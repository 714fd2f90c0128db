use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::enrich::DEFAULT_BATCH_SIZE;
use crate::entrez::{DEFAULT_TOOL, EntrezContact};
use crate::error::KiraError;
use crate::filter::{DEFAULT_TOP, FilterThresholds};
use crate::pacing::DEFAULT_BATCH_DELAY;

pub const DEFAULT_CONFIG_FILE: &str = "kira-bt.json";
pub const DEFAULT_OUTPUT: &str = "top_matches.csv";

/// On-disk settings. Every field is optional; CLI flags take precedence.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub delay_ms: Option<u64>,
    #[serde(default)]
    pub top: Option<i64>,
    #[serde(default)]
    pub thresholds: Option<FilterThresholds>,
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub email: Option<String>,
    pub top: Option<i64>,
    pub output: Option<Utf8PathBuf>,
    pub batch_size: Option<usize>,
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub top: i64,
    pub thresholds: FilterThresholds,
    pub batch_size: usize,
    pub delay: Duration,
    pub contact: EntrezContact,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `kira-bt.json` from the working directory when it
    /// exists. A missing default file yields an empty config.
    pub fn load(path: Option<&str>) -> Result<Config, KiraError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| KiraError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| KiraError::ConfigParse(err.to_string()))
    }

    pub fn resolve_options(
        config: Config,
        input: Utf8PathBuf,
        overrides: CliOverrides,
        api_key: Option<String>,
    ) -> Result<RunOptions, KiraError> {
        let email = overrides
            .email
            .or(config.email)
            .filter(|email| !email.trim().is_empty())
            .ok_or(KiraError::MissingEmail)?;
        let contact = EntrezContact::new(&email)?
            .with_tool(config.tool.unwrap_or_else(|| DEFAULT_TOOL.to_string()))
            .with_api_key(api_key);

        let batch_size = overrides
            .batch_size
            .or(config.batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE);
        if batch_size == 0 {
            return Err(KiraError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }

        let delay = overrides
            .delay_ms
            .or(config.delay_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_BATCH_DELAY);

        Ok(RunOptions {
            input,
            output: overrides
                .output
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT)),
            top: overrides.top.or(config.top).unwrap_or(DEFAULT_TOP as i64),
            thresholds: config.thresholds.unwrap_or_default(),
            batch_size,
            delay,
            contact,
        })
    }
}

/// `NCBI_API_KEY` from the environment, ignoring blank values.
pub fn api_key_from_env() -> Option<String> {
    std::env::var("NCBI_API_KEY")
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}
