//! Edge endpoints for carlosjardim.com.
//!
//! This library backs the `edge-web` binary, which serves:
//! - `/api/bcv`: BCV exchange rates (EUR, USD, USDT) aggregated from three upstreams
//! - `/webhooks/hevy`: Hevy workout webhook relayed to GitHub repository dispatch
//! - `/api/admin/login`: credential check for the admin panel
//!
//! ## Architecture
//!
//! ```text
//! GET  /api/bcv       → rates  → bcvapi.tech (EUR, USD) ∥ DolarAPI (USDT)
//! POST /webhooks/hevy → relay  → api.github.com/repos/{repo}/dispatches
//! ```

pub mod config;
pub mod rates;
pub mod relay;
pub mod util;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use rates::{get_aggregated_rates, AggregatedRates, RateQuote, RateSources};
pub use relay::{DispatchError, Dispatcher, GitHubDispatcher};
pub use web::{router, AppState};
