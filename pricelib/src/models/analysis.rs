use serde::Deserialize;

use crate::models::indicators::{self, PriceStatistics, NEUTRAL_RSI};
use crate::models::trading_signal::{RsiZone, TrendSignal};
use crate::series::{Asset, Series};

pub const MOVING_AVERAGE_WINDOW: usize = 10;
pub const RSI_PERIOD: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    #[serde(rename = "movingAverageWindow")]
    pub moving_average_window: usize,
    #[serde(rename = "rsiPeriod")]
    pub rsi_period: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        AnalysisSettings {
            moving_average_window: MOVING_AVERAGE_WINDOW,
            rsi_period: RSI_PERIOD,
        }
    }
}

// Indicator values with the neutral substitutions applied, ready for classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorState {
    pub moving_average: f64,
    pub rsi: f64,
    pub percent_change: f64,
}

impl IndicatorState {
    // Undefined indicators fall back to the current price, RSI 50 and 0% change.
    // An empty series therefore yields {0, 50, 0}.
    pub fn compute(prices: &[f64], settings: &AnalysisSettings) -> Self {
        let current = prices.last().copied().unwrap_or(0.0);
        IndicatorState {
            moving_average: indicators::moving_average(prices, settings.moving_average_window)
                .unwrap_or(current),
            rsi: indicators::rsi(prices, settings.rsi_period).unwrap_or(NEUTRAL_RSI),
            percent_change: indicators::percent_change(prices).unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssetAnalysis {
    pub asset: Asset,
    pub price: f64,
    pub indicators: IndicatorState,
    pub signal: TrendSignal,
    pub rsi_zone: RsiZone,
    pub statistics: PriceStatistics,
}

impl AssetAnalysis {
    pub fn from_prices(asset: Asset, prices: &[f64], settings: &AnalysisSettings) -> Option<Self> {
        let price = *prices.last()?;
        let statistics = PriceStatistics::from_prices(prices)?;
        let indicators = IndicatorState::compute(prices, settings);

        Some(AssetAnalysis {
            asset,
            price,
            indicators,
            signal: TrendSignal::classify(price, indicators.moving_average, indicators.rsi),
            rsi_zone: RsiZone::classify(indicators.rsi),
            statistics,
        })
    }
}

// Derives the analytic state of every tracked asset; empty when the series is empty
pub fn analyze(series: &Series, settings: &AnalysisSettings) -> Vec<AssetAnalysis> {
    Asset::ALL
        .iter()
        .filter_map(|asset| AssetAnalysis::from_prices(*asset, &series.prices(*asset), settings))
        .collect()
}
