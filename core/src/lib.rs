//! pmhealth-core: payment method health analytics.
//!
//! Analyses pull pre-aggregated rows through an `AggregateProvider` and
//! turn them into metrics, insights, ROI, trends and market gaps. The
//! bundled provider reads a SQLite `PaymentStore`.

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod insight;
pub mod market_gap;
pub mod metrics;
pub mod numeric;
pub mod provider;
pub mod rng;
pub mod roi;
pub mod seed;
pub mod store;
pub mod trend;
pub mod types;
