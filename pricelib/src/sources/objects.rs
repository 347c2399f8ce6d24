use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::series::Asset;
use crate::sources::helpers::{deserialize_optional_time_from_unix_string, deserialize_u8_from_number_or_string};

pub const PRICE_API_URL: &str = "https://api.coingecko.com/api/v3";
pub const MARKETS_API_URL: &str = "https://api.coingecko.com/api/v3";
pub const SENTIMENT_API_URL: &str = "https://api.alternative.me";

pub const QUOTE_ENDPOINT: &str = "/simple/price";
pub const MARKETS_ENDPOINT: &str = "/coins/markets";
pub const SENTIMENT_ENDPOINT: &str = "/fng/";

// Composite quote body: {"bitcoin": {"usd": 67012.5}, "ethereum": {"usd": 3501.2}}
// Values are kept loose so one malformed asset does not discard the others
pub type QuoteResponse = HashMap<String, serde_json::Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeQuote {
    prices: HashMap<Asset, f64>,
}

impl CompositeQuote {
    pub fn from_response(response: &QuoteResponse, currency: &str) -> Self {
        let mut prices = HashMap::new();
        for asset in Asset::ALL {
            let price = asset
                .quote_id()
                .and_then(|id| response.get(id))
                .and_then(|entry| entry.get(currency))
                .and_then(serde_json::Value::as_f64)
                .filter(|price| price.is_finite());

            match price {
                Some(price) => {
                    prices.insert(asset, price);
                }
                None if asset.quote_id().is_some() => {
                    log::warn!("Quote response has no usable {} price", asset.symbol());
                }
                None => {}
            }
        }
        CompositeQuote { prices }
    }

    pub fn price(&self, asset: Asset) -> Option<f64> {
        self.prices.get(&asset).copied()
    }
}

#[derive(Debug, Deserialize)]
pub struct SentimentResponse {
    pub data: Vec<SentimentEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SentimentEntry {
    #[serde(deserialize_with = "deserialize_u8_from_number_or_string")]
    pub value: u8,
    pub value_classification: String,
    #[serde(default, deserialize_with = "deserialize_optional_time_from_unix_string")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct MarketEntry {
    pub name: String,
    pub symbol: String,
    // Null while an asset is being delisted or its feed is stale
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    // Null for freshly listed assets
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
}
