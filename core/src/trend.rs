//! Trend Analyzer: period-over-period deltas and a least-squares fit per
//! instrument.
//!
//! RULE: direction labels come from the unrounded fit. Reported slope is
//! rounded to 2 decimals and R² to 4 only after classification.

use crate::{
    aggregate::TrendBucket,
    config::TrendConfig,
    numeric::{round2, round4},
    types::{CountryCode, Direction, OverallTrend, PaymentMethodCode, TrendMetric},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: String,
    pub value: f64,
    /// Absent for the first point of a series.
    pub previous_value: Option<f64>,
    pub absolute_change: f64,
    pub percentage_change: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub payment_method_code: PaymentMethodCode,
    pub payment_method_name: String,
    pub country_code: CountryCode,
    pub metric: TrendMetric,
    pub points: Vec<TrendPoint>,
    pub slope: f64,
    pub r_squared: f64,
    pub overall_trend: OverallTrend,
}

/// Ordinary least squares of `values` against their index 0..n-1.
/// Returns `(slope, r_squared)`; `(0, 0)` with fewer than two points.
pub fn linear_regression(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n < 2 {
        return (0.0, 0.0);
    }
    let nf = n as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0, 0.0, 0.0, 0.0);
    for (i, &y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
    }

    let denom = nf * sum_x2 - sum_x * sum_x;
    if denom == 0.0 {
        return (0.0, 0.0);
    }
    let slope = (nf * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / nf;

    let mean_y = sum_y / nf;
    let (mut ss_res, mut ss_tot) = (0.0, 0.0);
    for (i, &y) in values.iter().enumerate() {
        let predicted = slope * i as f64 + intercept;
        ss_res += (y - predicted).powi(2);
        ss_tot += (y - mean_y).powi(2);
    }
    let r_squared = if ss_tot == 0.0 { 1.0 } else { 1.0 - ss_res / ss_tot };
    (slope, r_squared)
}

pub fn classify(n: usize, slope: f64, r_squared: f64, cfg: &TrendConfig) -> OverallTrend {
    if n >= 2 && r_squared >= cfg.min_r_squared {
        if slope > 0.0 {
            OverallTrend::Growing
        } else {
            OverallTrend::Declining
        }
    } else {
        OverallTrend::Volatile
    }
}

pub fn metric_value(bucket: &TrendBucket, metric: TrendMetric) -> f64 {
    match metric {
        TrendMetric::TpvUsd              => bucket.tpv_usd,
        TrendMetric::TransactionCount    => bucket.transaction_count as f64,
        TrendMetric::ApprovalRate        => bucket.approval_rate,
        TrendMetric::AvgTransactionValue => bucket.avg_transaction_value,
    }
}

/// Build points from an ordered series of `(period, value)`.
pub fn build_points(series: &[(String, f64)], cfg: &TrendConfig) -> Vec<TrendPoint> {
    let mut points = Vec::with_capacity(series.len());
    let mut previous: Option<f64> = None;
    for (period, value) in series {
        let point = match previous {
            None => TrendPoint {
                period: period.clone(),
                value: *value,
                previous_value: None,
                absolute_change: 0.0,
                percentage_change: 0.0,
                direction: Direction::Flat,
            },
            Some(prev) => {
                let absolute_change = value - prev;
                let percentage_change = if prev != 0.0 {
                    round2(absolute_change / prev * 100.0)
                } else {
                    0.0
                };
                let direction = if percentage_change.abs() < cfg.flat_band_pct {
                    Direction::Flat
                } else if absolute_change > 0.0 {
                    Direction::Up
                } else {
                    Direction::Down
                };
                TrendPoint {
                    period: period.clone(),
                    value: *value,
                    previous_value: Some(prev),
                    absolute_change,
                    percentage_change,
                    direction,
                }
            }
        };
        previous = Some(*value);
        points.push(point);
    }
    points
}

/// Group buckets by instrument and summarize each series.
/// Output is ordered by (payment method, country); points by period.
pub fn analyze_trends(
    buckets: &[TrendBucket],
    metric: TrendMetric,
    cfg: &TrendConfig,
) -> Vec<TrendSummary> {
    let mut groups: BTreeMap<(&str, &str), Vec<&TrendBucket>> = BTreeMap::new();
    for b in buckets {
        groups
            .entry((b.payment_method_code.as_str(), b.country_code.as_str()))
            .or_default()
            .push(b);
    }

    groups
        .into_iter()
        .map(|((pm, country), mut group)| {
            group.sort_by(|a, b| a.period.cmp(&b.period));
            let series: Vec<(String, f64)> = group
                .iter()
                .map(|b| (b.period.clone(), metric_value(b, metric)))
                .collect();
            let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
            let (slope, r_squared) = linear_regression(&values);

            TrendSummary {
                payment_method_code: pm.to_string(),
                payment_method_name: group
                    .first()
                    .map(|b| b.payment_method_name.clone())
                    .unwrap_or_default(),
                country_code: country.to_string(),
                metric,
                points: build_points(&series, cfg),
                slope: round2(slope),
                r_squared: round4(r_squared),
                overall_trend: classify(values.len(), slope, r_squared, cfg),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_line_has_unit_r_squared() {
        let (slope, r2) = linear_regression(&[1.0, 3.0, 5.0, 7.0]);
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((r2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_series_is_fully_explained() {
        assert_eq!(linear_regression(&[4.0, 4.0, 4.0]), (0.0, 1.0));
    }

    #[test]
    fn single_point_has_no_fit() {
        assert_eq!(linear_regression(&[42.0]), (0.0, 0.0));
        assert_eq!(linear_regression(&[]), (0.0, 0.0));
    }
}
