use chrono::{DateTime, FixedOffset, Timelike};

pub const MAX_OBSERVATIONS: usize = 1000;
pub const PRICE_FLOOR: f64 = 100.0;
pub const STALENESS_MINUTES: i64 = 60;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Asset {
    Bitcoin,
    Ethereum,
    Gold,
}

impl Asset {
    pub const ALL: [Asset; 3] = [Asset::Bitcoin, Asset::Ethereum, Asset::Gold];

    // Primary asset, the one the sanity floor is checked against
    pub const PRIMARY: Asset = Asset::Bitcoin;

    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Bitcoin => "BTC",
            Asset::Ethereum => "ETH",
            Asset::Gold => "GC=F",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Asset::Bitcoin => "Bitcoin",
            Asset::Ethereum => "Ethereum",
            Asset::Gold => "Gold",
        }
    }

    // Column header used in the persisted CSV
    pub fn column(&self) -> &'static str {
        match self {
            Asset::Bitcoin => "BTC Price",
            Asset::Ethereum => "ETH Price",
            Asset::Gold => "Gold Price",
        }
    }

    // Identifier on the live quote endpoint; Gold has no live source
    pub fn quote_id(&self) -> Option<&'static str> {
        match self {
            Asset::Bitcoin => Some("bitcoin"),
            Asset::Ethereum => Some("ethereum"),
            Asset::Gold => None,
        }
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Prices {
    pub bitcoin: f64,
    pub ethereum: f64,
    pub gold: f64,
}

impl Prices {
    pub fn new(bitcoin: f64, ethereum: f64, gold: f64) -> Self {
        Prices {
            bitcoin,
            ethereum,
            gold,
        }
    }

    pub fn get(&self, asset: Asset) -> f64 {
        match asset {
            Asset::Bitcoin => self.bitcoin,
            Asset::Ethereum => self.ethereum,
            Asset::Gold => self.gold,
        }
    }

    pub fn set(&mut self, asset: Asset, price: f64) {
        match asset {
            Asset::Bitcoin => self.bitcoin = price,
            Asset::Ethereum => self.ethereum = price,
            Asset::Gold => self.gold = price,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime<FixedOffset>,
    pub prices: Prices,
}

impl Observation {
    // Timestamps are kept at whole-second resolution, the resolution of the persisted format
    pub fn new(timestamp: DateTime<FixedOffset>, prices: Prices) -> Self {
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        Observation { timestamp, prices }
    }

    pub fn primary_price(&self) -> f64 {
        self.prices.get(Asset::PRIMARY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionPolicy {
    pub max_observations: usize,
    pub price_floor: f64,
    pub staleness: chrono::Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        RetentionPolicy {
            max_observations: MAX_OBSERVATIONS,
            price_floor: PRICE_FLOOR,
            staleness: chrono::Duration::minutes(STALENESS_MINUTES),
        }
    }
}

impl RetentionPolicy {
    // NaN prices fail the comparison and are treated as below the floor
    pub fn accepts(&self, observation: &Observation) -> bool {
        observation.primary_price() >= self.price_floor
    }

    pub fn is_stale(&self, newest: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> bool {
        now.signed_duration_since(newest) > self.staleness
    }
}

/// Ordered, bounded history of observations for one run of the tracker.
///
/// Only grows through [`Series::push`], which keeps timestamps non-decreasing and then
/// applies the floor and retention rules of the [`RetentionPolicy`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    observations: Vec<Observation>,
}

impl Series {
    pub fn new() -> Self {
        Series {
            observations: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn first(&self) -> Option<&Observation> {
        self.observations.first()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.observations.last()
    }

    pub fn newest_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        self.last().map(|observation| observation.timestamp)
    }

    pub fn prices(&self, asset: Asset) -> Vec<f64> {
        self.observations
            .iter()
            .map(|observation| observation.prices.get(asset))
            .collect()
    }

    /// Appends one observation and re-establishes the series invariants.
    ///
    /// Returns `false` when the observation was rejected, either because it is older than
    /// the newest retained observation or because its primary price is under the floor.
    pub fn push(&mut self, observation: Observation, policy: &RetentionPolicy) -> bool {
        if let Some(newest) = self.newest_timestamp() {
            if observation.timestamp < newest {
                log::warn!(
                    "Rejecting observation at {} older than newest {}",
                    observation.timestamp,
                    newest
                );
                return false;
            }
        }

        // Retention never evicts the newest entry, so only the floor can reject it
        let accepted = policy.accepts(&observation);
        self.observations.push(observation);
        self.enforce(policy);
        accepted
    }

    // Floor first, then retention
    pub(crate) fn enforce(&mut self, policy: &RetentionPolicy) {
        let before = self.observations.len();
        self.observations.retain(|observation| policy.accepts(observation));
        let dropped = before - self.observations.len();
        if dropped > 0 {
            log::warn!(
                "Dropped {} observation(s) with {} below the floor of {}",
                dropped,
                Asset::PRIMARY.symbol(),
                policy.price_floor
            );
        }

        if self.observations.len() > policy.max_observations {
            let excess = self.observations.len() - policy.max_observations;
            self.observations.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn observation(minute: u32, bitcoin: f64) -> Observation {
        let timestamp = offset()
            .with_ymd_and_hms(2024, 3, 1, 10, minute, 0)
            .unwrap();
        Observation::new(timestamp, Prices::new(bitcoin, 3500.0, 2650.0))
    }

    #[test]
    fn sub_floor_observation_leaves_length_unchanged() {
        let policy = RetentionPolicy::default();
        let mut series = Series::new();
        assert!(series.push(observation(0, 65000.0), &policy));
        assert!(series.push(observation(1, 65100.0), &policy));

        assert!(!series.push(observation(2, 42.0), &policy));
        assert_eq!(series.len(), 2);
        assert_eq!(series.last().unwrap().primary_price(), 65100.0);
    }

    #[test]
    fn nan_primary_price_is_dropped() {
        let policy = RetentionPolicy::default();
        let mut series = Series::new();
        assert!(!series.push(observation(0, f64::NAN), &policy));
        assert!(series.is_empty());
    }

    #[test]
    fn full_series_drops_exactly_the_oldest() {
        let policy = RetentionPolicy::default();
        let start = offset().with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let mut series = Series::new();
        for i in 0..MAX_OBSERVATIONS {
            let timestamp = start + chrono::Duration::seconds(i as i64);
            series.push(
                Observation::new(timestamp, Prices::new(1000.0 + i as f64, 1.0, 1.0)),
                &policy,
            );
        }
        assert_eq!(series.len(), MAX_OBSERVATIONS);

        let timestamp = start + chrono::Duration::seconds(MAX_OBSERVATIONS as i64);
        assert!(series.push(
            Observation::new(timestamp, Prices::new(5000.0, 1.0, 1.0)),
            &policy
        ));

        assert_eq!(series.len(), MAX_OBSERVATIONS);
        assert_eq!(series.first().unwrap().primary_price(), 1001.0);
        assert_eq!(series.last().unwrap().primary_price(), 5000.0);
    }

    #[test]
    fn older_observation_is_rejected_but_ties_are_kept() {
        let policy = RetentionPolicy::default();
        let mut series = Series::new();
        series.push(observation(5, 65000.0), &policy);

        assert!(!series.push(observation(4, 65000.0), &policy));
        assert!(series.push(observation(5, 65010.0), &policy));
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn staleness_is_strictly_greater_than_threshold() {
        let policy = RetentionPolicy::default();
        let newest = offset().with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();

        assert!(!policy.is_stale(newest, newest + chrono::Duration::minutes(60)));
        assert!(policy.is_stale(newest, newest + chrono::Duration::minutes(61)));
    }

    #[test]
    fn observation_truncates_subsecond_precision() {
        let timestamp = offset()
            .with_ymd_and_hms(2024, 3, 1, 10, 0, 0)
            .unwrap()
            + chrono::Duration::milliseconds(750);
        let observation = Observation::new(timestamp, Prices::default());
        assert_eq!(observation.timestamp.nanosecond(), 0);
    }
}
