//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::time::DurationMs;

/// Cadence interval used when the configured value is unset or zero.
pub const DEFAULT_CADENCE_INTERVAL_MS: DurationMs = 200;

/// Durations at or above this value are treated as "unknown" placeholders
/// reported by decoders that cannot determine an event's end time.
pub const DEFAULT_IMPLAUSIBLE_DURATION_MS: DurationMs = 29_000;

/// Delivery scheduling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    /// Re-emit the current event on every demand pulse while it is valid,
    /// sending empty filler frames otherwise.
    #[default]
    Repeat,

    /// Subdivide events into fixed-width slots, one per demand pulse.
    Scatter,

    /// Relay events unmodified once their timing corrections are final.
    Forward,
}

impl FromStr for FeedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "repeat" => Ok(Self::Repeat),
            "scatter" => Ok(Self::Scatter),
            "forward" => Ok(Self::Forward),
            other => Err(format!(
                "unknown feed mode '{other}' (expected repeat, scatter, or forward)"
            )),
        }
    }
}

impl std::fmt::Display for FeedMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Repeat => "repeat",
            Self::Scatter => "scatter",
            Self::Forward => "forward",
        };
        f.write_str(name)
    }
}

/// Configuration for the delivery engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Delivery scheduling mode.
    pub mode: FeedMode,

    /// Output cadence interval in milliseconds.
    /// Zero or negative means unset; the engine falls back to
    /// [`DEFAULT_CADENCE_INTERVAL_MS`].
    pub cadence_interval_ms: DurationMs,

    /// Infer missing durations from the start of the following event.
    pub fix_durations: bool,

    /// Drop stale out-of-order events and trim overlapping durations.
    pub fix_overlap: bool,

    /// Durations at or above this value are considered unknown placeholders.
    /// Zero or negative means unset; the engine falls back to
    /// [`DEFAULT_IMPLAUSIBLE_DURATION_MS`].
    pub implausible_duration_threshold_ms: DurationMs,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            mode: FeedMode::Repeat,
            cadence_interval_ms: DEFAULT_CADENCE_INTERVAL_MS,
            fix_durations: true,
            fix_overlap: false,
            implausible_duration_threshold_ms: DEFAULT_IMPLAUSIBLE_DURATION_MS,
        }
    }
}

impl FeedConfig {
    /// Effective cadence interval, with the unset/zero fallback applied.
    pub fn cadence_interval(&self) -> DurationMs {
        if self.cadence_interval_ms <= 0 {
            DEFAULT_CADENCE_INTERVAL_MS
        } else {
            self.cadence_interval_ms
        }
    }

    /// Effective implausibility threshold, with the unset/zero fallback applied.
    pub fn implausible_threshold(&self) -> DurationMs {
        if self.implausible_duration_threshold_ms <= 0 {
            DEFAULT_IMPLAUSIBLE_DURATION_MS
        } else {
            self.implausible_duration_threshold_ms
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "subfeed=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Delivery engine defaults.
    pub feed: FeedConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("subfeed").join("config.json")
}
