use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::sources::cache::{TtlCache, DEFAULT_TTL};
use crate::sources::errors::SourceError;
use crate::sources::http::get_json;
use crate::sources::objects::{SentimentResponse, SENTIMENT_ENDPOINT};
use crate::util::Settings;

pub const FALLBACK_SCORE: u8 = 50;
pub const DEGRADED_ADVISORY: &str = "degraded";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentBand {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl SentimentBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=25 => SentimentBand::ExtremeFear,
            26..=45 => SentimentBand::Fear,
            46..=55 => SentimentBand::Neutral,
            56..=75 => SentimentBand::Greed,
            _ => SentimentBand::ExtremeGreed,
        }
    }

    pub fn advisory(&self) -> &'static str {
        match self {
            SentimentBand::ExtremeFear => {
                "Extreme fear: sellers are capitulating, historically a contrarian buying zone"
            }
            SentimentBand::Fear => "Fear: the market is cautious and buyers are hesitant",
            SentimentBand::Neutral => "Neutral: no strong bias either way",
            SentimentBand::Greed => "Greed: momentum buyers are moving in",
            SentimentBand::ExtremeGreed => {
                "Extreme greed: euphoric buying, elevated risk of a pullback"
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentReading {
    pub score: u8,
    pub label: String,
    pub advisory: String,
    pub timestamp: DateTime<Utc>,
    pub degraded: bool,
}

impl SentimentReading {
    pub fn new(score: u8, classification: &str, timestamp: DateTime<Utc>) -> Self {
        SentimentReading {
            score,
            label: format!("{} ({})", classification, score),
            advisory: SentimentBand::from_score(score).advisory().to_string(),
            timestamp,
            degraded: false,
        }
    }

    pub fn fallback() -> Self {
        SentimentReading {
            score: FALLBACK_SCORE,
            label: format!("Neutral ({})", FALLBACK_SCORE),
            advisory: DEGRADED_ADVISORY.to_string(),
            timestamp: Utc::now(),
            degraded: true,
        }
    }

    pub fn band(&self) -> SentimentBand {
        SentimentBand::from_score(self.score)
    }
}

// Latest fear & greed style index reading, cached for ten minutes
pub struct SentimentFetcher {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    cache: TtlCache<SentimentReading>,
}

impl SentimentFetcher {
    pub fn new(client: reqwest::Client, settings: &Settings) -> Self {
        SentimentFetcher {
            client,
            url: format!(
                "{}{}",
                settings.sources.sentiment_url.trim_end_matches('/'),
                SENTIMENT_ENDPOINT
            ),
            timeout: settings.request_timeout(),
            cache: TtlCache::new(DEFAULT_TTL),
        }
    }

    async fn request(&self) -> Result<SentimentReading, SourceError> {
        let query = [("limit", "1".to_string())];
        let response: SentimentResponse =
            get_json(&self.client, &self.url, &query, self.timeout).await?;

        let entry = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::Malformed("empty sentiment data".to_string()))?;

        if entry.value > 100 {
            return Err(SourceError::Malformed(format!(
                "sentiment score {} outside 0-100",
                entry.value
            )));
        }

        Ok(SentimentReading::new(
            entry.value,
            &entry.value_classification,
            entry.timestamp.unwrap_or_else(Utc::now),
        ))
    }

    // Failures are not cached, so the next call retries the source
    pub async fn fetch_sentiment(&mut self) -> SentimentReading {
        if let Some(reading) = self.cache.get() {
            log::debug!("Using cached sentiment reading {}", reading.label);
            return reading.clone();
        }

        match self.request().await {
            Ok(reading) => {
                log::info!("Sentiment index: {}", reading.label);
                self.cache.insert(reading.clone());
                reading
            }
            Err(err) => {
                log::warn!("Sentiment source unavailable, using neutral fallback: {}", err);
                SentimentReading::fallback()
            }
        }
    }
}
