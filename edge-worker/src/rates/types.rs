//! Rate types shared by the aggregator and the `/api/bcv` endpoint.
//!
//! This module defines:
//! - Upstream payloads as returned by bcvapi.tech and DolarAPI
//! - The normalized `RateQuote` and the combined `AggregatedRates` document

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Currencies reported by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Eur,
    Usd,
    Usdt,
}

impl Currency {
    /// Lowercase code, matching the field name in the response document.
    pub fn code(self) -> &'static str {
        match self {
            Currency::Eur => "eur",
            Currency::Usd => "usd",
            Currency::Usdt => "usdt",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Eur => "€",
            Currency::Usd => "$",
            Currency::Usdt => "₮",
        }
    }
}

// =============================================================================
// Upstream Payloads
// =============================================================================

/// Official BCV rate payload (bcvapi.tech).
///
/// `tasa` arrives as a number or a numeric string, so both fields are kept
/// as raw JSON and coerced during normalization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BcvRatePayload {
    #[serde(default)]
    pub tasa: Value,
    #[serde(default)]
    pub fecha: Value,
}

/// Parallel market payload (DolarAPI).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParallelRatePayload {
    #[serde(default)]
    pub promedio: Value,
    #[serde(default, rename = "fechaActualizacion")]
    pub fecha_actualizacion: Value,
}

// =============================================================================
// Response Document
// =============================================================================

/// A single normalized quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateQuote {
    #[serde(skip)]
    pub currency: Currency,
    /// Bolívares per unit
    pub rate: f64,
    /// Calendar date (`YYYY-MM-DD`) the rate applies to
    pub date: String,
    pub symbol: &'static str,
    /// Only present (and `true`) for sources fetched live on every request
    #[serde(skip_serializing_if = "is_false")]
    pub live: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Combined document served by `/api/bcv`.
///
/// A `None` field serializes as `null` and means its upstream failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRates {
    pub last_updated: String,
    pub eur: Option<RateQuote>,
    pub usd: Option<RateQuote>,
    pub usdt: Option<RateQuote>,
}
