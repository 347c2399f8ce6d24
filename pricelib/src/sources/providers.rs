use rand::rngs::SmallRng;
use rand::Rng;

use crate::series::Asset;
use crate::sources::objects::CompositeQuote;

pub const JITTER_SPREAD: f64 = 0.005;

// Everything a provider may draw on to price one asset for one tick
#[derive(Debug, Clone, Copy)]
pub struct PriceRequest<'a> {
    pub asset: Asset,
    pub last_known: f64,
    // None when the live quote could not be fetched this tick
    pub live: Option<&'a CompositeQuote>,
}

/// One link of a resilient source. Returning `None` passes the request to the next provider.
pub trait PriceProvider: Send {
    fn name(&self) -> &'static str;
    fn provide(&self, request: &PriceRequest<'_>, rng: &mut SmallRng) -> Option<f64>;
}

// Live quote; an asset missing from an otherwise good response keeps its last known price
pub struct LiveProvider;

impl PriceProvider for LiveProvider {
    fn name(&self) -> &'static str {
        "live"
    }

    fn provide(&self, request: &PriceRequest<'_>, _rng: &mut SmallRng) -> Option<f64> {
        request
            .live
            .map(|quote| quote.price(request.asset).unwrap_or(request.last_known))
    }
}

// Last known price perturbed by U(-spread, spread), keeps charts continuous during outages
pub struct JitterProvider {
    pub spread: f64,
}

impl Default for JitterProvider {
    fn default() -> Self {
        JitterProvider {
            spread: JITTER_SPREAD,
        }
    }
}

impl PriceProvider for JitterProvider {
    fn name(&self) -> &'static str {
        "degraded"
    }

    fn provide(&self, request: &PriceRequest<'_>, rng: &mut SmallRng) -> Option<f64> {
        let factor = 1.0 + rng.gen_range(-self.spread..=self.spread);
        Some(request.last_known * factor)
    }
}

// Fixed baseline plus U(-bound, bound); the commodity proxy has no live source
pub struct SimulatedProvider {
    pub baseline: f64,
    pub bound: f64,
}

impl PriceProvider for SimulatedProvider {
    fn name(&self) -> &'static str {
        "simulated"
    }

    // Scaling a unit draw keeps the range finite for any bound; a non-finite bound yields the baseline
    fn provide(&self, _request: &PriceRequest<'_>, rng: &mut SmallRng) -> Option<f64> {
        let bound = if self.bound.is_finite() { self.bound.abs() } else { 0.0 };
        Some(self.baseline + rng.gen_range(-1.0..=1.0) * bound)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub price: f64,
    pub provider: &'static str,
}

/// Ordered providers for one asset; the first one that answers wins.
///
/// When every provider declines, the last known price is carried forward so the caller
/// always receives a number.
#[derive(Default)]
pub struct ProviderChain {
    providers: Vec<Box<dyn PriceProvider>>,
}

impl ProviderChain {
    pub fn new() -> Self {
        ProviderChain {
            providers: Vec::new(),
        }
    }

    pub fn with(mut self, provider: impl PriceProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn resolve(&self, request: &PriceRequest<'_>, rng: &mut SmallRng) -> Resolved {
        for provider in &self.providers {
            if let Some(price) = provider.provide(request, rng) {
                return Resolved {
                    price,
                    provider: provider.name(),
                };
            }
            log::debug!(
                "Provider {} declined {}, trying next",
                provider.name(),
                request.asset.symbol()
            );
        }

        Resolved {
            price: request.last_known,
            provider: "carried",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::objects::QuoteResponse;
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(7)
    }

    fn quote(body: &str) -> CompositeQuote {
        let response: QuoteResponse = serde_json::from_str(body).unwrap();
        CompositeQuote::from_response(&response, "usd")
    }

    fn api_chain() -> ProviderChain {
        ProviderChain::new()
            .with(LiveProvider)
            .with(JitterProvider::default())
    }

    #[test]
    fn live_quote_wins_when_available() {
        let quote = quote(r#"{"bitcoin": {"usd": 67000.0}}"#);
        let request = PriceRequest {
            asset: Asset::Bitcoin,
            last_known: 65000.0,
            live: Some(&quote),
        };
        let resolved = api_chain().resolve(&request, &mut rng());
        assert_eq!(resolved, Resolved { price: 67000.0, provider: "live" });
    }

    #[test]
    fn asset_missing_from_good_quote_keeps_last_known() {
        let quote = quote(r#"{"bitcoin": {"usd": 67000.0}}"#);
        let request = PriceRequest {
            asset: Asset::Ethereum,
            last_known: 3450.0,
            live: Some(&quote),
        };
        let resolved = api_chain().resolve(&request, &mut rng());
        assert_eq!(resolved, Resolved { price: 3450.0, provider: "live" });
    }

    #[test]
    fn failed_quote_degrades_within_half_a_percent() {
        let chain = api_chain();
        let mut rng = rng();
        let request = PriceRequest {
            asset: Asset::Bitcoin,
            last_known: 65000.0,
            live: None,
        };
        for _ in 0..500 {
            let resolved = chain.resolve(&request, &mut rng);
            assert_eq!(resolved.provider, "degraded");
            assert!((resolved.price - 65000.0).abs() <= 65000.0 * JITTER_SPREAD + 1e-6);
        }
    }

    #[test]
    fn simulated_provider_stays_near_baseline() {
        let chain = ProviderChain::new().with(SimulatedProvider {
            baseline: 2650.0,
            bound: 5.0,
        });
        let mut rng = rng();
        let request = PriceRequest {
            asset: Asset::Gold,
            last_known: 1.0,
            live: None,
        };
        for _ in 0..500 {
            let resolved = chain.resolve(&request, &mut rng);
            assert_eq!(resolved.provider, "simulated");
            assert!((2645.0..=2655.0).contains(&resolved.price));
        }
    }

    #[test]
    fn extreme_bounds_do_not_panic() {
        let mut rng = rng();
        let request = PriceRequest {
            asset: Asset::Gold,
            last_known: 1.0,
            live: None,
        };

        let huge = SimulatedProvider {
            baseline: 2650.0,
            bound: 1e308,
        };
        assert!(huge.provide(&request, &mut rng).unwrap().is_finite());

        for bound in [f64::NAN, f64::INFINITY] {
            let provider = SimulatedProvider {
                baseline: 2650.0,
                bound,
            };
            assert_eq!(provider.provide(&request, &mut rng), Some(2650.0));
        }
    }

    #[test]
    fn empty_chain_carries_last_known() {
        let request = PriceRequest {
            asset: Asset::Ethereum,
            last_known: 3333.0,
            live: None,
        };
        let resolved = ProviderChain::new().resolve(&request, &mut rng());
        assert_eq!(resolved, Resolved { price: 3333.0, provider: "carried" });
    }
}
