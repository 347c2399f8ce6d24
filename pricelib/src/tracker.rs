use chrono::{DateTime, FixedOffset};

use crate::models::{analyze, AnalysisSettings, AssetAnalysis};
use crate::series::{Asset, Observation, RetentionPolicy, SeriesStore, StoreBackend, TIMESTAMP_FORMAT};
use crate::sources::http::build_client;
use crate::sources::{
    AssetSummary, MarketTableFetcher, SentimentFetcher, SentimentReading, SnapshotFetcher,
    SourceError,
};
use crate::util::Settings;

// Everything one tick produced, in the order it was derived
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub observation: Observation,
    pub appended: bool,
    pub series_len: usize,
    pub oldest: Option<DateTime<FixedOffset>>,
    pub newest: Option<DateTime<FixedOffset>>,
    pub analyses: Vec<AssetAnalysis>,
    pub sentiment: SentimentReading,
    pub top_assets: Vec<AssetSummary>,
    pub degraded_assets: Vec<Asset>,
    pub store_reset: bool,
}

impl RefreshReport {
    pub fn analysis(&self, asset: Asset) -> Option<&AssetAnalysis> {
        self.analyses.iter().find(|a| a.asset == asset)
    }

    pub fn log_summary(&self) {
        log::info!(
            "Tick at {}: {} observation(s) stored{}",
            self.observation.timestamp.format(TIMESTAMP_FORMAT),
            self.series_len,
            if self.store_reset { ", history was reset" } else { "" }
        );

        for analysis in &self.analyses {
            log::info!(
                "[{}] {:.2} MA {:.2} RSI {:.1} ({}) {:+.2}% -> {}",
                analysis.asset.symbol(),
                analysis.price,
                analysis.indicators.moving_average,
                analysis.indicators.rsi,
                analysis.rsi_zone,
                analysis.indicators.percent_change,
                analysis.signal
            );
        }

        if !self.degraded_assets.is_empty() {
            let symbols: Vec<&str> = self.degraded_assets.iter().map(|a| a.symbol()).collect();
            log::warn!("Prices estimated from last known values for {}", symbols.join(", "));
        }

        log::info!("Sentiment: {} - {}", self.sentiment.label, self.sentiment.advisory);

        for summary in &self.top_assets {
            log::info!(
                "#{:<2} {:<6} {:>14.4} {:+.2}% {}",
                summary.rank,
                summary.symbol,
                summary.price,
                summary.change_24h,
                summary.signal
            );
        }
    }
}

/// One refresh cycle end to end: load, fetch, append, persist, derive.
///
/// Every stage degrades instead of failing, so [`Tracker::refresh`] always produces a report.
pub struct Tracker<B: StoreBackend> {
    store: SeriesStore<B>,
    snapshots: SnapshotFetcher,
    sentiment: SentimentFetcher,
    markets: MarketTableFetcher,
    analysis: AnalysisSettings,
    top_assets: usize,
}

impl<B: StoreBackend> Tracker<B> {
    pub fn new(settings: &Settings, backend: B) -> Result<Self, SourceError> {
        let client = build_client(settings.request_timeout())?;
        let store = SeriesStore::open(backend, RetentionPolicy::default(), settings.utc_offset());

        Ok(Tracker {
            store,
            snapshots: SnapshotFetcher::new(client.clone(), settings),
            sentiment: SentimentFetcher::new(client.clone(), settings),
            markets: MarketTableFetcher::new(client, settings),
            analysis: settings.analysis,
            top_assets: settings.top_assets,
        })
    }

    pub fn store(&self) -> &SeriesStore<B> {
        &self.store
    }

    pub async fn refresh(&mut self) -> RefreshReport {
        let resets_before = self.store.resets();
        let last_known = self.store.load().last().map(|obs| obs.prices);

        let snapshot = self.snapshots.fetch_snapshot(last_known.as_ref()).await;
        let observation = Observation::new(self.store.now(), snapshot.prices);

        let series = self.store.append(observation.clone());
        let appended = series.last() == Some(&observation);
        let series_len = series.len();
        let oldest = series.first().map(|obs| obs.timestamp);
        let newest = series.newest_timestamp();
        let analyses = analyze(series, &self.analysis);

        let sentiment = self.sentiment.fetch_sentiment().await;
        let top_assets = self.markets.fetch_top_assets(self.top_assets).await;

        RefreshReport {
            observation,
            appended,
            series_len,
            oldest,
            newest,
            analyses,
            sentiment,
            top_assets,
            degraded_assets: snapshot.degraded_assets(),
            store_reset: self.store.resets() > resets_before,
        }
    }
}
