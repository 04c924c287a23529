//! ROI Calculator: return on integration cost per instrument.

use crate::{
    aggregate::RoiRow,
    config::RoiConfig,
    numeric::round2,
    types::{CountryCode, PaymentMethodCode, Recommendation},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiResult {
    pub payment_method_code: PaymentMethodCode,
    pub payment_method_name: String,
    pub country_code: CountryCode,
    pub approved_tpv_usd: f64,
    pub total_cost_usd: f64,
    /// `None` exactly when `total_cost_usd` is zero.
    pub roi_pct: Option<f64>,
    pub cost_per_approved_txn: f64,
    pub revenue_per_cost_dollar: f64,
    pub break_even_txn_count: u64,
    pub recommendation: Recommendation,
}

pub fn total_cost(row: &RoiRow) -> f64 {
    round2(
        row.months_in_range * row.monthly_fixed_cost
            + row.total_count as f64 * row.per_transaction_cost
            + row.approved_tpv * row.percentage_fee,
    )
}

/// Approved transactions needed for per-transaction margin to cover the
/// fixed cost of the period. 0 when there is no positive margin.
pub fn break_even_txn_count(row: &RoiRow) -> u64 {
    let avg_revenue = if row.approved_count > 0 {
        row.approved_tpv / row.approved_count as f64
    } else {
        0.0
    };
    let variable_cost = row.per_transaction_cost + avg_revenue * row.percentage_fee;
    let margin = avg_revenue - variable_cost;
    if margin > 0.0 {
        let n = (row.months_in_range * row.monthly_fixed_cost / margin).ceil();
        if n > 0.0 { n as u64 } else { 0 }
    } else {
        0
    }
}

pub fn recommend(roi_pct: Option<f64>, cfg: &RoiConfig) -> Recommendation {
    match roi_pct {
        None => Recommendation::Unprofitable,
        Some(r) if r > cfg.highly_profitable_pct => Recommendation::HighlyProfitable,
        Some(r) if r > cfg.profitable_pct => Recommendation::Profitable,
        Some(r) if r > cfg.marginal_pct => Recommendation::Marginal,
        Some(_) => Recommendation::Unprofitable,
    }
}

pub fn compute_roi(row: &RoiRow, cfg: &RoiConfig) -> RoiResult {
    let cost = total_cost(row);
    let roi_pct = (cost > 0.0).then(|| round2((row.approved_tpv - cost) / cost * 100.0));
    let cost_per_approved_txn = if row.approved_count > 0 {
        round2(cost / row.approved_count as f64)
    } else {
        0.0
    };
    let revenue_per_cost_dollar = if cost > 0.0 {
        round2(row.approved_tpv / cost)
    } else {
        0.0
    };

    RoiResult {
        payment_method_code: row.payment_method_code.clone(),
        payment_method_name: row.payment_method_name.clone(),
        country_code: row.country_code.clone(),
        approved_tpv_usd: round2(row.approved_tpv),
        total_cost_usd: cost,
        roi_pct,
        cost_per_approved_txn,
        revenue_per_cost_dollar,
        break_even_txn_count: break_even_txn_count(row),
        recommendation: recommend(roi_pct, cfg),
    }
}

pub fn compute_all(rows: &[RoiRow], cfg: &RoiConfig) -> Vec<RoiResult> {
    rows.iter().map(|r| compute_roi(r, cfg)).collect()
}
