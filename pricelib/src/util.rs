use std::path::Path;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;

use crate::models::AnalysisSettings;
use crate::series::Prices;
use crate::sources::objects::{MARKETS_API_URL, PRICE_API_URL, SENTIMENT_API_URL};

pub const MIN_REFRESH_SECS: u64 = 30;
pub const MAX_REFRESH_SECS: u64 = 300;
pub const MIN_TIMEOUT_SECS: u64 = 5;
pub const MAX_TIMEOUT_SECS: u64 = 10;
pub const MAX_JITTER_FRACTION: f64 = 0.1;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "refreshIntervalSecs")]
    pub refresh_interval_secs: u64,
    #[serde(rename = "autoRefresh")]
    pub auto_refresh: bool,
    #[serde(rename = "storePath")]
    pub store_path: String,
    #[serde(rename = "logPath")]
    pub log_path: String,
    #[serde(rename = "utcOffsetHours")]
    pub utc_offset_hours: i32,
    #[serde(rename = "requestTimeoutSecs")]
    pub request_timeout_secs: u64,
    #[serde(rename = "topAssets")]
    pub top_assets: usize,
    pub sources: SourceSettings,
    pub baselines: BaselineSettings,
    pub analysis: AnalysisSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    #[serde(rename = "priceUrl")]
    pub price_url: String,
    #[serde(rename = "sentimentUrl")]
    pub sentiment_url: String,
    #[serde(rename = "marketsUrl")]
    pub markets_url: String,
    pub currency: String,
}

// Seed prices used before any observation exists, and the simulated commodity's parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BaselineSettings {
    pub bitcoin: f64,
    pub ethereum: f64,
    pub gold: f64,
    #[serde(rename = "goldJitter")]
    pub gold_jitter: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            refresh_interval_secs: 60,
            auto_refresh: true,
            store_path: "data/asset_prices.csv".to_string(),
            log_path: "logs/price-tracker.log".to_string(),
            utc_offset_hours: 7,
            request_timeout_secs: MAX_TIMEOUT_SECS,
            top_assets: 10,
            sources: SourceSettings::default(),
            baselines: BaselineSettings::default(),
            analysis: AnalysisSettings::default(),
        }
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        SourceSettings {
            price_url: PRICE_API_URL.to_string(),
            sentiment_url: SENTIMENT_API_URL.to_string(),
            markets_url: MARKETS_API_URL.to_string(),
            currency: "usd".to_string(),
        }
    }
}

impl Default for BaselineSettings {
    fn default() -> Self {
        BaselineSettings {
            bitcoin: 95_000.0,
            ethereum: 3_500.0,
            gold: 2_650.0,
            gold_jitter: 5.0,
        }
    }
}

impl BaselineSettings {
    pub fn prices(&self) -> Prices {
        Prices::new(self.bitcoin, self.ethereum, self.gold)
    }

    // Simulated jitter bound, at most a tenth of the gold baseline; unusable values revert to the default
    pub fn jitter_bound(&self) -> f64 {
        let default = BaselineSettings::default().gold_jitter;
        if !self.gold_jitter.is_finite() || self.gold_jitter < 0.0 {
            log::warn!("Invalid gold jitter {}, using {}", self.gold_jitter, default);
            return default;
        }

        let ceiling = (self.gold.abs() * MAX_JITTER_FRACTION).max(default);
        if self.gold_jitter > ceiling {
            log::warn!("Gold jitter {} exceeds {}, clamping", self.gold_jitter, ceiling);
            return ceiling;
        }
        self.gold_jitter
    }
}

impl Settings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(
            self.refresh_interval_secs
                .clamp(MIN_REFRESH_SECS, MAX_REFRESH_SECS),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS),
        )
    }

    // Out-of-range hours fall back to UTC
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                log::warn!("Invalid UTC offset {}h, using UTC", self.utc_offset_hours);
                Utc.fix()
            })
    }
}

// Ok(None) when there is no file, so the caller can fall back to defaults once logging is up.
// A file that exists but does not parse is an error.
pub fn read_settings(path: impl AsRef<Path>) -> Result<Option<Settings>, Box<dyn std::error::Error>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    let settings = std::fs::read_to_string(path)?;
    let settings = serde_json::from_str(&settings)?;
    Ok(Some(settings))
}
