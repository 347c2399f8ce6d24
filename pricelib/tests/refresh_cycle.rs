use pricelib::series::{Asset, MemoryBackend};
use pricelib::sources::fallback_top_assets;
use pricelib::util::Settings;
use pricelib::Tracker;

// Every source points at a port nothing listens on
fn offline_settings() -> Settings {
    let mut settings = Settings::default();
    settings.sources.price_url = "http://127.0.0.1:1".to_string();
    settings.sources.sentiment_url = "http://127.0.0.1:1".to_string();
    settings.sources.markets_url = "http://127.0.0.1:1".to_string();
    settings.request_timeout_secs = 5;
    settings
}

fn within(price: f64, reference: f64, fraction: f64) -> bool {
    (price - reference).abs() <= reference * fraction + 1e-6
}

#[tokio::test]
async fn offline_ticks_degrade_but_keep_the_series_growing() {
    let settings = offline_settings();
    let baselines = settings.baselines.prices();
    let mut tracker = Tracker::new(&settings, MemoryBackend::new()).unwrap();

    let first = tracker.refresh().await;
    assert!(first.appended);
    assert!(!first.store_reset);
    assert_eq!(first.series_len, 1);
    assert!(within(first.observation.prices.bitcoin, baselines.bitcoin, 0.005));
    assert!(within(first.observation.prices.ethereum, baselines.ethereum, 0.005));
    assert!((2645.0..=2655.0).contains(&first.observation.prices.gold));
    assert_eq!(first.degraded_assets, vec![Asset::Bitcoin, Asset::Ethereum]);

    assert!(first.sentiment.degraded);
    assert_eq!(first.sentiment.label, "Neutral (50)");
    assert_eq!(first.sentiment.advisory, "degraded");
    assert_eq!(first.top_assets, fallback_top_assets(10));

    // A single observation has no history to derive from, so indicators are neutral
    let bitcoin = first.analysis(Asset::Bitcoin).unwrap();
    assert_eq!(bitcoin.indicators.rsi, 50.0);
    assert_eq!(bitcoin.indicators.percent_change, 0.0);
    assert_eq!(bitcoin.indicators.moving_average, bitcoin.price);

    let second = tracker.refresh().await;
    assert_eq!(second.series_len, 2);
    assert!(second.newest >= first.newest);
    for asset in [Asset::Bitcoin, Asset::Ethereum] {
        assert!(within(
            second.observation.prices.get(asset),
            first.observation.prices.get(asset),
            0.005
        ));
    }

    let persisted = String::from_utf8(tracker.store().backend().contents().unwrap().to_vec()).unwrap();
    let mut lines = persisted.lines();
    assert_eq!(lines.next(), Some("Timestamp,BTC Price,ETH Price,Gold Price"));
    assert_eq!(lines.count(), 2);
}

#[tokio::test]
async fn stale_history_is_reset_before_the_tick() {
    let backend = MemoryBackend::with_contents(
        "Timestamp,BTC Price,ETH Price,Gold Price\n2020-01-01 00:00:00,30000,1200,1800\n",
    );
    let settings = offline_settings();
    let mut tracker = Tracker::new(&settings, backend).unwrap();

    let report = tracker.refresh().await;
    assert!(report.store_reset);
    assert_eq!(report.series_len, 1);

    // Seeded from baselines, not from the discarded 2020 row
    assert!(within(report.observation.prices.bitcoin, 95_000.0, 0.005));
}

#[tokio::test]
async fn zero_top_assets_skips_the_table() {
    let mut settings = offline_settings();
    settings.top_assets = 0;
    let mut tracker = Tracker::new(&settings, MemoryBackend::new()).unwrap();

    let report = tracker.refresh().await;
    assert!(report.top_assets.is_empty());
}
