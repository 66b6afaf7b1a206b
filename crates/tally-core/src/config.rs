//! Runtime configuration: rate-limit presets, provider call settings, and
//! insight thresholds
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir (~/.local/share/tally/config.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Any key missing from an override keeps its built-in default.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::aggregate::DEFAULT_LOOKBACK_MONTHS;
use crate::error::{Error, Result};
use crate::rate_governor::{RateLimitConfig, DEFAULT_CLEANUP_INTERVAL, MAX_WINDOW_SECONDS};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/tally.toml");

/// Rate-limit presets per governed endpoint group
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimits {
    pub summary: RateLimitConfig,
    pub ai: RateLimitConfig,
    pub cleanup_interval: Duration,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            summary: RateLimitConfig::summary(),
            ai: RateLimitConfig::ai(),
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

/// Provider call settings
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    /// Upper bound on one provider call
    pub timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
        }
    }
}

/// Thresholds for insight fallbacks and reports
#[derive(Debug, Clone, PartialEq)]
pub struct InsightSettings {
    pub alert_threshold_pct: f64,
    pub stability_threshold_pct: f64,
    pub trend_lookback_months: u32,
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            alert_threshold_pct: 30.0,
            stability_threshold_pct: 10.0,
            trend_lookback_months: DEFAULT_LOOKBACK_MONTHS,
        }
    }
}

/// Full runtime configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TallyConfig {
    pub rate_limits: RateLimits,
    pub provider: ProviderSettings,
    pub insights: InsightSettings,
}

impl TallyConfig {
    /// Load from the default override location, else the embedded defaults
    pub fn load() -> Result<Self> {
        load_config(None)
    }

    /// Load from an explicit path; a missing file falls back to the embedded defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        load_config(Some(path))
    }

    /// The embedded defaults
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    /// Parse a TOML document layered over the built-in defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        parse_config(content)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("config.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<TallyConfig> {
    let path = override_path
        .map(Path::to_path_buf)
        .or_else(default_config_path);

    let content = match path {
        Some(p) if p.exists() => fs::read_to_string(&p)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", p.display(), e)))?,
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    rate_limits: Option<RawRateLimits>,
    provider: Option<RawProvider>,
    insights: Option<RawInsights>,
}

#[derive(Debug, Deserialize)]
struct RawRateLimits {
    cleanup_interval_secs: Option<u64>,
    summary: Option<RawLimit>,
    ai: Option<RawLimit>,
}

#[derive(Debug, Deserialize)]
struct RawLimit {
    max_requests: Option<u32>,
    window_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawProvider {
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawInsights {
    alert_threshold_pct: Option<f64>,
    stability_threshold_pct: Option<f64>,
    trend_lookback_months: Option<u32>,
}

fn apply_limit(
    name: &str,
    base: RateLimitConfig,
    raw: Option<RawLimit>,
) -> Result<RateLimitConfig> {
    let Some(raw) = raw else {
        return Ok(base);
    };
    let window_secs = raw.window_secs.unwrap_or(base.window_seconds);
    if window_secs > MAX_WINDOW_SECONDS {
        return Err(Error::Config(format!(
            "rate_limits.{}.window_secs must be at most {}",
            name, MAX_WINDOW_SECONDS
        )));
    }
    Ok(RateLimitConfig::new(
        raw.max_requests.unwrap_or(base.max_requests),
        window_secs,
    ))
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<TallyConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = TallyConfig::default();

    if let Some(limits) = raw.rate_limits {
        config.rate_limits.summary =
            apply_limit("summary", config.rate_limits.summary, limits.summary)?;
        config.rate_limits.ai = apply_limit("ai", config.rate_limits.ai, limits.ai)?;
        if let Some(secs) = limits.cleanup_interval_secs {
            config.rate_limits.cleanup_interval = Duration::from_secs(secs);
        }
    }

    if let Some(provider) = raw.provider {
        if let Some(secs) = provider.timeout_secs {
            if secs == 0 {
                return Err(Error::Config("provider.timeout_secs must be positive".into()));
            }
            config.provider.timeout = Duration::from_secs(secs);
        }
    }

    if let Some(insights) = raw.insights {
        if let Some(pct) = insights.alert_threshold_pct {
            config.insights.alert_threshold_pct = pct;
        }
        if let Some(pct) = insights.stability_threshold_pct {
            config.insights.stability_threshold_pct = pct;
        }
        if let Some(months) = insights.trend_lookback_months {
            config.insights.trend_lookback_months = months;
        }
    }

    Ok(config)
}
