//! Aggregate row shapes supplied by an `AggregateProvider`.
//!
//! Rows are read-only inputs: one per payment method × country, already
//! restricted to the caller's country / date / type selectors. Counts are
//! non-negative; rates are percentages (approved / total × 100, or 0 when
//! the total is 0).

use crate::types::{CountryCode, PaymentMethodCode};
use serde::{Deserialize, Serialize};

/// Input to the Metrics Calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub payment_method_code: PaymentMethodCode,
    pub payment_method_name: String,
    pub payment_method_type: String,
    pub country_code: CountryCode,
    pub transaction_count: i64,
    pub approved_count: i64,
    pub declined_count: i64,
    pub tpv_usd: f64,
    pub approval_rate: f64,
    pub avg_transaction_value: f64,
    pub monthly_cost_usd: f64,
    /// Transactions inside the trailing window ending at the as-of time.
    pub txn_count_trailing: i64,
}

/// Input to the zombie classifier. Only instruments with an active
/// integration cost are candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZombieCandidate {
    pub payment_method_code: PaymentMethodCode,
    pub payment_method_name: String,
    pub payment_method_type: String,
    pub country_code: CountryCode,
    pub txn_count_90d: i64,
    pub historical_monthly_avg: f64,
    pub months_active: i64,
    pub monthly_cost_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiddenGemCandidate {
    pub payment_method_code: PaymentMethodCode,
    pub payment_method_name: String,
    pub country_code: CountryCode,
    pub approval_rate: f64,
    pub revenue_contribution_pct: f64,
    pub volume_share_pct: f64,
    pub tpv_usd: f64,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAlertCandidate {
    pub payment_method_code: PaymentMethodCode,
    pub payment_method_name: String,
    pub payment_method_type: String,
    pub country_code: CountryCode,
    pub approval_rate: f64,
    /// Mean approval rate of all methods of the same type in the country.
    pub country_type_avg_approval: f64,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiRow {
    pub payment_method_code: PaymentMethodCode,
    pub payment_method_name: String,
    pub country_code: CountryCode,
    pub approved_tpv: f64,
    pub approved_count: i64,
    pub total_count: i64,
    pub monthly_fixed_cost: f64,
    pub per_transaction_cost: f64,
    /// Fraction of approved TPV, e.g. 0.025 for 2.5%.
    pub percentage_fee: f64,
    pub months_in_range: f64,
}

/// One (period, payment method, country) bucket of a time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendBucket {
    /// First day of the bucket, `YYYY-MM-DD`.
    pub period: String,
    pub payment_method_code: PaymentMethodCode,
    pub payment_method_name: String,
    pub country_code: CountryCode,
    pub transaction_count: i64,
    pub tpv_usd: f64,
    pub approval_rate: f64,
    pub avg_transaction_value: f64,
}

/// A catalog entry with no transactions inside the trailing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogGap {
    pub country_code: CountryCode,
    pub payment_method_code: PaymentMethodCode,
    pub market_share_pct: f64,
    pub is_essential: bool,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRow {
    pub country_code: CountryCode,
    pub total_catalog_methods: i64,
    pub active_methods: i64,
}
