use std::time::Duration;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::series::{Asset, Prices};
use crate::sources::errors::SourceError;
use crate::sources::http::get_json;
use crate::sources::objects::{CompositeQuote, QuoteResponse, QUOTE_ENDPOINT};
use crate::sources::providers::{
    JitterProvider, LiveProvider, PriceRequest, ProviderChain, SimulatedProvider,
};
use crate::util::Settings;

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub prices: Prices,
    // Which provider answered for each asset
    pub providers: Vec<(Asset, &'static str)>,
}

impl Snapshot {
    pub fn degraded_assets(&self) -> Vec<Asset> {
        self.providers
            .iter()
            .filter(|(_, provider)| *provider == "degraded" || *provider == "carried")
            .map(|(asset, _)| *asset)
            .collect()
    }
}

/// Acquires one complete set of per-asset prices per tick.
///
/// Bitcoin and Ethereum come from the composite quote endpoint and degrade to a jittered
/// last known price; Gold is always simulated. Never fails.
pub struct SnapshotFetcher {
    client: reqwest::Client,
    url: String,
    currency: String,
    timeout: Duration,
    baselines: Prices,
    chains: Vec<(Asset, ProviderChain)>,
    rng: SmallRng,
}

impl SnapshotFetcher {
    pub fn new(client: reqwest::Client, settings: &Settings) -> Self {
        Self::with_rng(client, settings, SmallRng::from_entropy())
    }

    pub fn with_rng(client: reqwest::Client, settings: &Settings, rng: SmallRng) -> Self {
        let baselines = settings.baselines.prices();
        let chains = Asset::ALL
            .iter()
            .map(|asset| {
                let chain = match asset.quote_id() {
                    Some(_) => ProviderChain::new()
                        .with(LiveProvider)
                        .with(JitterProvider::default()),
                    None => ProviderChain::new().with(SimulatedProvider {
                        baseline: baselines.get(*asset),
                        bound: settings.baselines.jitter_bound(),
                    }),
                };
                (*asset, chain)
            })
            .collect();

        SnapshotFetcher {
            client,
            url: format!(
                "{}{}",
                settings.sources.price_url.trim_end_matches('/'),
                QUOTE_ENDPOINT
            ),
            currency: settings.sources.currency.clone(),
            timeout: settings.request_timeout(),
            baselines,
            chains,
            rng,
        }
    }

    async fn fetch_quote(&self) -> Result<CompositeQuote, SourceError> {
        let ids: Vec<&str> = Asset::ALL.iter().filter_map(|a| a.quote_id()).collect();
        let query = [
            ("ids", ids.join(",")),
            ("vs_currencies", self.currency.clone()),
        ];
        let response: QuoteResponse = get_json(&self.client, &self.url, &query, self.timeout).await?;
        let quote = CompositeQuote::from_response(&response, &self.currency);

        // A 200 carrying none of the requested assets is an error body, e.g. a rate-limit notice
        if !Asset::ALL
            .iter()
            .any(|asset| asset.quote_id().is_some() && quote.price(*asset).is_some())
        {
            return Err(SourceError::Malformed(format!(
                "no {} price for any of {}",
                self.currency,
                ids.join(",")
            )));
        }
        Ok(quote)
    }

    pub async fn fetch_snapshot(&mut self, last_known: Option<&Prices>) -> Snapshot {
        let last_known = match last_known {
            Some(prices) => *prices,
            None => {
                log::info!("No prior observation, seeding from baseline prices");
                self.baselines
            }
        };

        let quote = match self.fetch_quote().await {
            Ok(quote) => Some(quote),
            Err(err) => {
                log::warn!("Live price source unavailable, using degraded prices: {}", err);
                None
            }
        };

        let mut prices = last_known;
        let mut providers = Vec::with_capacity(self.chains.len());
        for (asset, chain) in &self.chains {
            let request = PriceRequest {
                asset: *asset,
                last_known: last_known.get(*asset),
                live: quote.as_ref(),
            };
            let resolved = chain.resolve(&request, &mut self.rng);
            log::debug!(
                "{} priced at {:.2} by {} provider",
                asset.symbol(),
                resolved.price,
                resolved.provider
            );
            prices.set(*asset, resolved.price);
            providers.push((*asset, resolved.provider));
        }

        Snapshot { prices, providers }
    }
}
