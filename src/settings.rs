use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::aggregator::HISTORY_LIMIT;
use crate::{AppError, Result};

pub const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub fetch: FetchSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportSettings {
    /// Destination for the posted report (name with `#` or channel id)
    #[serde(default = "default_report_channel")]
    pub channel: String,
    #[serde(default = "default_top_total", rename = "top-total")]
    pub top_total: usize,
    #[serde(default = "default_top_per_channel", rename = "top-per-channel")]
    pub top_per_channel: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchSettings {
    #[serde(default = "default_history_limit", rename = "history-limit")]
    pub history_limit: u16,
    #[serde(default = "default_exclude_archived", rename = "exclude-archived")]
    pub exclude_archived: bool,
    /// 0 means one task per channel with no cap
    #[serde(default, rename = "max-concurrent")]
    pub max_concurrent: usize,
    /// 0 disables the per-call timeout
    #[serde(default, rename = "timeout-secs")]
    pub timeout_secs: u64,
}

fn default_report_channel() -> String {
    "#general".to_string()
}

fn default_top_total() -> usize {
    20
}

fn default_top_per_channel() -> usize {
    5
}

fn default_history_limit() -> u16 {
    1000
}

fn default_exclude_archived() -> bool {
    true
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            channel: default_report_channel(),
            top_total: default_top_total(),
            top_per_channel: default_top_per_channel(),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            exclude_archived: default_exclude_archived(),
            max_concurrent: 0,
            timeout_secs: 0,
        }
    }
}

impl FetchSettings {
    /// Configured page size, kept within what one history call may request
    pub fn page_size(&self) -> u16 {
        self.history_limit.clamp(1, HISTORY_LIMIT)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn concurrency_limit(&self) -> Option<usize> {
        (self.max_concurrent > 0).then_some(self.max_concurrent)
    }
}

impl Settings {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| AppError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| AppError::TomlParse(e.to_string()))
    }
}
