//! Metrics Calculator: per-instrument health metrics and the portfolio
//! summary.
//!
//! RULE: contribution is always measured against the TPV of every row the
//! provider supplied, even when the caller narrows the output to one
//! payment-method type.

use crate::{
    aggregate::MetricRow,
    config::ActivityConfig,
    numeric::{pct, pct_of_counts, round2},
    types::{ActivityStatus, CountryCode, PaymentMethodCode},
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
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
    pub revenue_contribution_pct: f64,
    pub monthly_cost_usd: f64,
    pub cost_efficiency_ratio: f64,
    pub activity_status: ActivityStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_payment_methods: usize,
    pub total_transactions: i64,
    pub total_approved: i64,
    pub total_tpv_usd: f64,
    pub overall_approval_rate: f64,
    pub active_count: usize,
    pub low_activity_count: usize,
    pub inactive_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub metrics: Vec<MetricRecord>,
    pub summary: MetricsSummary,
}

// ── Sorting ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    TpvUsd,
    TransactionCount,
    ApprovalRate,
    RevenueContribution,
    PaymentMethodCode,
}

impl SortKey {
    /// Unrecognized keys fall back to `tpv_usd`.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "transaction_count"    => Self::TransactionCount,
            "approval_rate"        => Self::ApprovalRate,
            "revenue_contribution" => Self::RevenueContribution,
            "payment_method_code"  => Self::PaymentMethodCode,
            "tpv_usd"              => Self::TpvUsd,
            other => {
                if !other.is_empty() {
                    log::warn!("Unknown metric sort key '{other}', using tpv_usd");
                }
                Self::TpvUsd
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Desc,
    Asc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSort {
    pub key: SortKey,
    pub order: SortOrder,
}

impl MetricSort {
    fn compare(&self, a: &MetricRecord, b: &MetricRecord) -> Ordering {
        let primary = match self.key {
            SortKey::TpvUsd => a.tpv_usd.total_cmp(&b.tpv_usd),
            SortKey::TransactionCount => a.transaction_count.cmp(&b.transaction_count),
            SortKey::ApprovalRate => a.approval_rate.total_cmp(&b.approval_rate),
            SortKey::RevenueContribution => {
                a.revenue_contribution_pct.total_cmp(&b.revenue_contribution_pct)
            }
            SortKey::PaymentMethodCode => a.payment_method_code.cmp(&b.payment_method_code),
        };
        let primary = match self.order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        // Ties always resolve ascending by identity.
        primary
            .then_with(|| a.payment_method_code.cmp(&b.payment_method_code))
            .then_with(|| a.country_code.cmp(&b.country_code))
    }
}

// ── Computation ──────────────────────────────────────────────────────────────

pub fn activity_status(trailing_count: i64, cfg: &ActivityConfig) -> ActivityStatus {
    if trailing_count >= cfg.active_min_txns {
        ActivityStatus::Active
    } else if trailing_count >= cfg.low_activity_min_txns {
        ActivityStatus::LowActivity
    } else {
        ActivityStatus::Inactive
    }
}

fn to_record(row: &MetricRow, total_tpv: f64, cfg: &ActivityConfig) -> MetricRecord {
    MetricRecord {
        payment_method_code: row.payment_method_code.clone(),
        payment_method_name: row.payment_method_name.clone(),
        payment_method_type: row.payment_method_type.clone(),
        country_code: row.country_code.clone(),
        transaction_count: row.transaction_count,
        approved_count: row.approved_count,
        declined_count: row.declined_count,
        tpv_usd: row.tpv_usd,
        approval_rate: row.approval_rate,
        avg_transaction_value: row.avg_transaction_value,
        revenue_contribution_pct: round2(pct(row.tpv_usd, total_tpv)),
        monthly_cost_usd: row.monthly_cost_usd,
        cost_efficiency_ratio: round2(pct(row.monthly_cost_usd, row.tpv_usd)),
        activity_status: activity_status(row.txn_count_trailing, cfg),
    }
}

/// Derive metric records and their summary.
///
/// `pm_type` narrows the returned records (and the summary) to one
/// payment-method type; `total_tpv` still spans every supplied row.
pub fn compute_metrics(
    rows: &[MetricRow],
    pm_type: Option<&str>,
    sort: MetricSort,
    cfg: &ActivityConfig,
) -> MetricsResult {
    let total_tpv: f64 = rows.iter().map(|r| r.tpv_usd).sum();

    let mut metrics: Vec<MetricRecord> = rows
        .iter()
        .filter(|r| pm_type.map_or(true, |t| r.payment_method_type == t))
        .map(|r| to_record(r, total_tpv, cfg))
        .collect();
    metrics.sort_by(|a, b| sort.compare(a, b));

    let summary = summarize(&metrics);
    MetricsResult { metrics, summary }
}

pub fn summarize(metrics: &[MetricRecord]) -> MetricsSummary {
    let mut s = MetricsSummary {
        total_payment_methods: metrics.len(),
        ..MetricsSummary::default()
    };
    for m in metrics {
        s.total_transactions += m.transaction_count;
        s.total_approved += m.approved_count;
        s.total_tpv_usd += m.tpv_usd;
        match m.activity_status {
            ActivityStatus::Active      => s.active_count += 1,
            ActivityStatus::LowActivity => s.low_activity_count += 1,
            ActivityStatus::Inactive    => s.inactive_count += 1,
        }
    }
    s.total_tpv_usd = round2(s.total_tpv_usd);
    s.overall_approval_rate = round2(pct_of_counts(s.total_approved, s.total_transactions));
    s
}
