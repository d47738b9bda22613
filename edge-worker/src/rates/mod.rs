//! BCV rate aggregation.
//!
//! Fetches EUR and USD from bcvapi.tech and USDT from DolarAPI, then
//! combines them into a single document for the calculator widget.
//!
//! ## Flow
//!
//! ```text
//! RateSources → fetch (EUR ∥ USD ∥ USDT, settle-all) → compose_rates() → AggregatedRates
//! ```

pub mod fetch;
pub mod normalize;
pub mod types;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::Config;

pub use fetch::{fetch_payload, SourceOutcome, UpstreamError};
pub use normalize::{coerce_rate, normalize_bcv, normalize_parallel};
pub use types::{AggregatedRates, BcvRatePayload, Currency, ParallelRatePayload, RateQuote};

/// Shared caches may serve a response for 5 minutes.
pub const CACHE_MAX_AGE_SECS: u64 = 300;

/// Grace period during which a stale response is served while revalidating.
pub const STALE_WHILE_REVALIDATE_SECS: u64 = 60;

/// Errors that abort aggregation before any upstream is contacted.
#[derive(Debug, Error)]
pub enum RatesError {
    #[error("invalid {currency} source URL '{url}': {message}")]
    InvalidSourceUrl {
        currency: &'static str,
        url: String,
        message: String,
    },
}

/// Upstream endpoints, one per currency.
#[derive(Debug, Clone)]
pub struct RateSources {
    pub eur: String,
    pub usd: String,
    pub usdt: String,
}

impl RateSources {
    pub fn from_config(config: &Config) -> Self {
        Self {
            eur: config.eur_api_url.clone(),
            usd: config.usd_api_url.clone(),
            usdt: config.usdt_api_url.clone(),
        }
    }
}

/// Fetch all three sources concurrently and compose the combined document.
///
/// Upstream failures never fail the call; the affected field is `None`.
/// The only error is a source URL that cannot be parsed.
pub async fn get_aggregated_rates(
    client: &Client,
    sources: &RateSources,
) -> Result<AggregatedRates, RatesError> {
    let eur_url = parse_source(Currency::Eur, &sources.eur)?;
    let usd_url = parse_source(Currency::Usd, &sources.usd)?;
    let usdt_url = parse_source(Currency::Usdt, &sources.usdt)?;

    let (eur, usd, usdt) = futures::join!(
        fetch_payload::<BcvRatePayload>(client, Currency::Eur.code(), &eur_url),
        fetch_payload::<BcvRatePayload>(client, Currency::Usd.code(), &usd_url),
        fetch_payload::<ParallelRatePayload>(client, Currency::Usdt.code(), &usdt_url),
    );

    info!(
        eur_ok = !eur.is_failed(),
        usd_ok = !usd.is_failed(),
        usdt_ok = !usdt.is_failed(),
        "rates_fetch_settled"
    );

    Ok(compose_rates(Utc::now(), eur, usd, usdt))
}

/// Build the response document from settled outcomes.
///
/// A failed outcome becomes `None`; a fetched one always yields a quote,
/// even if its fields had to fall back to defaults.
pub fn compose_rates(
    now: DateTime<Utc>,
    eur: SourceOutcome<BcvRatePayload>,
    usd: SourceOutcome<BcvRatePayload>,
    usdt: SourceOutcome<ParallelRatePayload>,
) -> AggregatedRates {
    let today = now.date_naive().format("%Y-%m-%d").to_string();

    AggregatedRates {
        last_updated: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        eur: eur
            .fetched()
            .map(|p| normalize_bcv(Currency::Eur, &p, &today)),
        usd: usd
            .fetched()
            .map(|p| normalize_bcv(Currency::Usd, &p, &today)),
        usdt: usdt.fetched().map(|p| normalize_parallel(&p, &today)),
    }
}

/// `Cache-Control` value for the rates endpoint.
pub fn cache_control_header() -> String {
    format!(
        "public, max-age={max}, s-maxage={max}, stale-while-revalidate={swr}",
        max = CACHE_MAX_AGE_SECS,
        swr = STALE_WHILE_REVALIDATE_SECS
    )
}

fn parse_source(currency: Currency, raw: &str) -> Result<Url, RatesError> {
    Url::parse(raw).map_err(|e| RatesError::InvalidSourceUrl {
        currency: currency.code(),
        url: raw.to_string(),
        message: e.to_string(),
    })
}
