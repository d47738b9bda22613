//! Normalization of upstream payloads into `RateQuote`s.
//!
//! Upstreams are loose about types: rates arrive as numbers or strings and
//! dates may be missing. A payload that parsed as JSON always produces a
//! quote; malformed fields degrade to a zero rate or today's date.

use serde_json::Value;

use crate::rates::types::{BcvRatePayload, Currency, ParallelRatePayload, RateQuote};

/// Normalize an official BCV payload (EUR or USD).
pub fn normalize_bcv(currency: Currency, payload: &BcvRatePayload, today: &str) -> RateQuote {
    RateQuote {
        currency,
        rate: coerce_rate(&payload.tasa),
        date: calendar_date(&payload.fecha, today),
        symbol: currency.symbol(),
        live: false,
    }
}

/// Normalize the parallel market payload used for USDT.
///
/// Always marked live: this source has no stored snapshot behind it.
pub fn normalize_parallel(payload: &ParallelRatePayload, today: &str) -> RateQuote {
    let date = match &payload.fecha_actualizacion {
        Value::String(timestamp) if !timestamp.is_empty() => date_part(timestamp).to_string(),
        _ => today.to_string(),
    };

    RateQuote {
        currency: Currency::Usdt,
        rate: coerce_rate(&payload.promedio),
        date,
        symbol: Currency::Usdt.symbol(),
        live: true,
    }
}

/// Coerce a raw rate into a float, falling back to 0.
///
/// Strings are read up to the end of their leading decimal literal, so
/// `"108.5 Bs"` yields 108.5.
pub fn coerce_rate(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_float(s),
        _ => None,
    };

    parsed.filter(|rate| rate.is_finite()).unwrap_or(0.0)
}

/// Use a non-empty date string as-is, otherwise `today`.
///
/// Non-string dates (e.g. `20250110`) also fall back, keeping `date` a
/// `YYYY-MM-DD` string for the calculator.
fn calendar_date(value: &Value, today: &str) -> String {
    match value {
        Value::String(date) if !date.is_empty() => date.clone(),
        _ => today.to_string(),
    }
}

/// Calendar-date portion of an ISO 8601 timestamp.
fn date_part(timestamp: &str) -> &str {
    timestamp.split('T').next().unwrap_or(timestamp)
}

/// Parse the longest decimal literal at the start of `raw`.
fn leading_float(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let int_digits = digits_from(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        if frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = digits_from(exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse().ok()
}
