//! Market Gap Scorer: catalog methods a country uses widely that the
//! portfolio has not processed recently.

use crate::{
    aggregate::{CatalogGap, CoverageRow},
    config::MarketGapConfig,
    numeric::{pct_of_counts, round2},
    types::{CountryCode, PaymentMethodCode},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketGap {
    pub country_code: CountryCode,
    pub payment_method_code: PaymentMethodCode,
    pub market_share_pct: f64,
    pub is_essential: bool,
    pub source: String,
    pub opportunity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryCoverage {
    pub country_code: CountryCode,
    pub total_catalog_methods: i64,
    pub active_methods: i64,
    pub coverage_pct: f64,
    pub gap_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketGapReport {
    pub gaps: Vec<MarketGap>,
    pub coverage: Vec<CountryCoverage>,
}

/// Score in [0, max_score], rounded to 2 decimals.
///
/// The estimated-TPV term scales share up by `tpv_scale` and back down
/// again; it stands in for a per-country TPV estimate that is not wired in.
pub fn opportunity_score(market_share_pct: f64, is_essential: bool, cfg: &MarketGapConfig) -> f64 {
    let mut score = market_share_pct * cfg.share_weight;
    if is_essential {
        score += cfg.essential_bonus;
    }
    let estimated_tpv = market_share_pct * cfg.tpv_scale;
    if cfg.tpv_scale != 0.0 {
        score += estimated_tpv / cfg.tpv_scale * cfg.estimated_tpv_weight;
    }
    round2(score.clamp(0.0, cfg.max_score))
}

pub fn score_gaps(gaps: &[CatalogGap], cfg: &MarketGapConfig) -> Vec<MarketGap> {
    gaps.iter()
        .map(|g| MarketGap {
            country_code: g.country_code.clone(),
            payment_method_code: g.payment_method_code.clone(),
            market_share_pct: g.market_share_pct,
            is_essential: g.is_essential,
            source: g.source.clone(),
            opportunity_score: opportunity_score(g.market_share_pct, g.is_essential, cfg),
        })
        .collect()
}

pub fn country_coverage(rows: &[CoverageRow]) -> Vec<CountryCoverage> {
    rows.iter()
        .map(|r| CountryCoverage {
            country_code: r.country_code.clone(),
            total_catalog_methods: r.total_catalog_methods,
            active_methods: r.active_methods,
            coverage_pct: round2(pct_of_counts(r.active_methods, r.total_catalog_methods)),
            gap_count: r.total_catalog_methods - r.active_methods,
        })
        .collect()
}
