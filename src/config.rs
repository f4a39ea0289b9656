use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_DATABASE_URL: &str = "sqlite://vitals.db";
const DEFAULT_ANALYTICS_WINDOW: usize = 10;
const DEFAULT_HISTORY_MAX_LIMIT: usize = 100;
const MAX_CONFIGURED_ROWS: usize = 1000;

fn overrides_path() -> Option<PathBuf> {
    env_optional_string("VITALS_CONFIG_PATH").map(PathBuf::from)
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigOverrides {
    #[serde(default)]
    database_url: Option<String>,
    #[serde(default)]
    analytics_window: Option<usize>,
    #[serde(default)]
    history_max_limit: Option<usize>,
    #[serde(default)]
    rate_limit_per_second: Option<u64>,
    #[serde(default)]
    rate_limit_burst: Option<u32>,
}

fn load_config_overrides() -> Option<ConfigOverrides> {
    let path = overrides_path()?;
    if !path.exists() {
        tracing::warn!(path = %path.display(), "config overrides file not found; using env values");
        return None;
    }
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to read config overrides; using env values"
            );
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to parse config overrides; using env values"
            );
            None
        }
    }
}

fn apply_overrides(config: &mut VitalsConfig, overrides: &ConfigOverrides) {
    if let Some(url) = overrides
        .database_url
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        config.database_url = url.to_string();
    }
    if let Some(window) = overrides.analytics_window.filter(|v| *v != 0) {
        config.analytics_window = window;
    }
    if let Some(limit) = overrides.history_max_limit.filter(|v| *v != 0) {
        config.history_max_limit = limit;
    }
    if let Some(value) = overrides.rate_limit_per_second.filter(|v| *v != 0) {
        config.rate_limit_per_second = value;
    }
    if let Some(value) = overrides.rate_limit_burst.filter(|v| *v != 0) {
        config.rate_limit_burst = value;
    }
}

#[derive(Debug, Clone)]
pub struct VitalsConfig {
    pub database_url: String,
    /// Most recent samples folded into the analytics summary.
    pub analytics_window: usize,
    /// Upper bound on history page size; also caps the analytics window.
    pub history_max_limit: usize,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            analytics_window: DEFAULT_ANALYTICS_WINDOW,
            history_max_limit: DEFAULT_HISTORY_MAX_LIMIT,
            rate_limit_per_second: 20,
            rate_limit_burst: 60,
        }
    }
}

impl VitalsConfig {
    pub fn from_env() -> Result<Self> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                return Err(err).context("failed to load .env");
            }
        }

        let defaults = Self::default();
        let mut config = Self {
            database_url: env_string("VITALS_DATABASE_URL", &defaults.database_url),
            analytics_window: env_usize("VITALS_ANALYTICS_WINDOW", defaults.analytics_window),
            history_max_limit: env_usize("VITALS_HISTORY_MAX_LIMIT", defaults.history_max_limit),
            rate_limit_per_second: env_u64(
                "VITALS_RATE_LIMIT_PER_SECOND",
                defaults.rate_limit_per_second,
            ),
            rate_limit_burst: env_u32("VITALS_RATE_LIMIT_BURST", defaults.rate_limit_burst),
        };

        if let Some(overrides) = load_config_overrides() {
            apply_overrides(&mut config, &overrides);
        }

        config.normalize()?;
        Ok(config)
    }

    fn normalize(&mut self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("VITALS_DATABASE_URL resolved to an empty value");
        }
        self.history_max_limit = self.history_max_limit.clamp(1, MAX_CONFIGURED_ROWS);
        self.analytics_window = self.analytics_window.clamp(1, self.history_max_limit);
        self.rate_limit_per_second = self.rate_limit_per_second.max(1);
        self.rate_limit_burst = self.rate_limit_burst.max(1);
        Ok(())
    }
}

fn env_string(key: &str, default: &str) -> String {
    env_optional_string(key).unwrap_or_else(|| default.to_string())
}

fn env_optional_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}
