use std::time::Duration;

use crate::models::MarketSignal;
use crate::sources::cache::{TtlCache, DEFAULT_TTL};
use crate::sources::errors::SourceError;
use crate::sources::http::get_json;
use crate::sources::objects::{MarketEntry, MARKETS_ENDPOINT};
use crate::util::Settings;

#[derive(Debug, Clone, PartialEq)]
pub struct AssetSummary {
    pub rank: u32,
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub market_cap: f64,
    pub change_24h: f64,
    pub signal: MarketSignal,
}

impl AssetSummary {
    pub fn new(
        rank: u32,
        name: &str,
        symbol: &str,
        price: f64,
        market_cap: f64,
        change_24h: f64,
    ) -> Self {
        AssetSummary {
            rank,
            name: name.to_string(),
            symbol: symbol.to_uppercase(),
            price,
            market_cap,
            change_24h,
            signal: MarketSignal::classify(change_24h),
        }
    }

    // None when the entry has no price or market cap to show
    fn from_entry(position: usize, entry: MarketEntry) -> Option<Self> {
        let (price, market_cap) = match (entry.current_price, entry.market_cap) {
            (Some(price), Some(market_cap)) if price.is_finite() && market_cap.is_finite() => {
                (price, market_cap)
            }
            _ => {
                log::debug!("Skipping {} without price or market cap", entry.symbol);
                return None;
            }
        };
        let rank = entry.market_cap_rank.unwrap_or(position as u32 + 1);
        Some(AssetSummary::new(
            rank,
            &entry.name,
            &entry.symbol,
            price,
            market_cap,
            entry.price_change_percentage_24h.unwrap_or(0.0),
        ))
    }
}

// Shown while the ranked-table source is unavailable
pub fn fallback_top_assets(n: usize) -> Vec<AssetSummary> {
    let entries: [(&str, &str, f64, f64, f64); 10] = [
        ("Bitcoin", "BTC", 95_000.0, 1.88e12, 1.2),
        ("Ethereum", "ETH", 3_500.0, 4.21e11, -0.8),
        ("Tether", "USDT", 1.0, 1.38e11, 0.01),
        ("XRP", "XRP", 2.2, 1.26e11, -1.9),
        ("BNB", "BNB", 690.0, 9.9e10, 0.5),
        ("Solana", "SOL", 190.0, 9.2e10, 3.4),
        ("USDC", "USDC", 1.0, 4.5e10, 0.0),
        ("Dogecoin", "DOGE", 0.32, 4.7e10, -3.6),
        ("Cardano", "ADA", 0.9, 3.2e10, 2.1),
        ("TRON", "TRX", 0.25, 2.2e10, -0.4),
    ];

    entries
        .iter()
        .take(n)
        .enumerate()
        .map(|(i, (name, symbol, price, market_cap, change))| {
            AssetSummary::new(i as u32 + 1, name, symbol, *price, *market_cap, *change)
        })
        .collect()
}

// Top assets by market capitalization, cached for ten minutes per requested size
pub struct MarketTableFetcher {
    client: reqwest::Client,
    url: String,
    currency: String,
    timeout: Duration,
    cache: TtlCache<(usize, Vec<AssetSummary>)>,
}

impl MarketTableFetcher {
    pub fn new(client: reqwest::Client, settings: &Settings) -> Self {
        MarketTableFetcher {
            client,
            url: format!(
                "{}{}",
                settings.sources.markets_url.trim_end_matches('/'),
                MARKETS_ENDPOINT
            ),
            currency: settings.sources.currency.clone(),
            timeout: settings.request_timeout(),
            cache: TtlCache::new(DEFAULT_TTL),
        }
    }

    async fn request(&self, n: usize) -> Result<Vec<AssetSummary>, SourceError> {
        let query = [
            ("vs_currency", self.currency.clone()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", n.to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
        ];
        let entries: Vec<MarketEntry> = get_json(&self.client, &self.url, &query, self.timeout).await?;

        let summaries: Vec<AssetSummary> = entries
            .into_iter()
            .take(n)
            .enumerate()
            .filter_map(|(position, entry)| AssetSummary::from_entry(position, entry))
            .collect();

        if summaries.is_empty() {
            return Err(SourceError::Malformed("empty market list".to_string()));
        }
        Ok(summaries)
    }

    pub async fn fetch_top_assets(&mut self, n: usize) -> Vec<AssetSummary> {
        if n == 0 {
            return Vec::new();
        }

        if let Some((cached_n, summaries)) = self.cache.get() {
            if *cached_n == n {
                log::debug!("Using cached market table of {} assets", n);
                return summaries.clone();
            }
        }

        match self.request(n).await {
            Ok(summaries) => {
                log::info!("Fetched market table of {} assets", summaries.len());
                self.cache.insert((n, summaries.clone()));
                summaries
            }
            Err(err) => {
                log::warn!("Market table source unavailable, using fallback list: {}", err);
                fallback_top_assets(n)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::http::build_client;
    use crate::sources::test_server::{closed_url, serve_once};

    fn fetcher(url: String) -> MarketTableFetcher {
        let mut settings = Settings::default();
        settings.sources.markets_url = url;
        settings.request_timeout_secs = 5;
        let client = build_client(settings.request_timeout()).unwrap();
        MarketTableFetcher::new(client, &settings)
    }

    #[test]
    fn fallback_list_is_ranked_and_classified() {
        let table = fallback_top_assets(10);
        assert_eq!(table.len(), 10);
        assert_eq!(table[0].symbol, "BTC");
        assert!(table.iter().enumerate().all(|(i, s)| s.rank == i as u32 + 1));

        let solana = table.iter().find(|s| s.symbol == "SOL").unwrap();
        assert_eq!(solana.signal, MarketSignal::Momentum);
        let dogecoin = table.iter().find(|s| s.symbol == "DOGE").unwrap();
        assert_eq!(dogecoin.signal, MarketSignal::PanicSell);

        assert_eq!(fallback_top_assets(3).len(), 3);
        assert_eq!(fallback_top_assets(25).len(), 10);
    }

    #[tokio::test]
    async fn maps_entries_to_summaries() {
        let url = serve_once(
            "200 OK",
            r#"[
                {"name": "Bitcoin", "symbol": "btc", "current_price": 67000.0, "market_cap": 1.3e12,
                 "price_change_percentage_24h": 3.0, "market_cap_rank": 1},
                {"name": "Ethereum", "symbol": "eth", "current_price": 3500.0, "market_cap": 4.2e11,
                 "price_change_percentage_24h": -3.1, "market_cap_rank": 2},
                {"name": "Newcoin", "symbol": "new", "current_price": 1.5, "market_cap": 2.0e9,
                 "price_change_percentage_24h": null}
            ]"#,
        )
        .await;

        let table = fetcher(url).fetch_top_assets(3).await;
        assert_eq!(table.len(), 3);
        assert_eq!(table[0].symbol, "BTC");
        assert_eq!(table[0].signal, MarketSignal::Momentum);
        assert_eq!(table[1].signal, MarketSignal::PanicSell);
        assert_eq!(table[2].rank, 3);
        assert_eq!(table[2].change_24h, 0.0);
        assert_eq!(table[2].signal, MarketSignal::Accumulate);
    }

    #[tokio::test]
    async fn entries_without_price_are_skipped() {
        let url = serve_once(
            "200 OK",
            r#"[
                {"name": "Bitcoin", "symbol": "btc", "current_price": 67000.0, "market_cap": 1.3e12,
                 "price_change_percentage_24h": 1.0, "market_cap_rank": 1},
                {"name": "Oldcoin", "symbol": "old", "current_price": null, "market_cap": null,
                 "price_change_percentage_24h": null, "market_cap_rank": 2},
                {"name": "Ethereum", "symbol": "eth", "current_price": 3500.0, "market_cap": 4.2e11,
                 "price_change_percentage_24h": -1.0, "market_cap_rank": 3}
            ]"#,
        )
        .await;

        let table = fetcher(url).fetch_top_assets(3).await;
        let symbols: Vec<&str> = table.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC", "ETH"]);
        assert_eq!(table[1].rank, 3);
    }

    #[tokio::test]
    async fn cached_table_is_reused_for_same_size() {
        let url = serve_once(
            "200 OK",
            r#"[{"name": "Bitcoin", "symbol": "btc", "current_price": 67000.0,
                 "market_cap": 1.3e12, "price_change_percentage_24h": -1.0, "market_cap_rank": 1}]"#,
        )
        .await;
        let mut fetcher = fetcher(url);

        let first = fetcher.fetch_top_assets(1).await;
        assert_eq!(first[0].price, 67000.0);
        assert_eq!(fetcher.fetch_top_assets(1).await, first);

        // A different size misses the cache; the server is gone, so it falls back
        let other = fetcher.fetch_top_assets(2).await;
        assert_eq!(other, fallback_top_assets(2));
    }

    #[tokio::test]
    async fn unreachable_or_malformed_source_falls_back() {
        assert_eq!(
            fetcher(closed_url()).fetch_top_assets(10).await,
            fallback_top_assets(10)
        );

        let url = serve_once("200 OK", r#"{"error": "rate limited"}"#).await;
        assert_eq!(fetcher(url).fetch_top_assets(5).await, fallback_top_assets(5));
    }
}
