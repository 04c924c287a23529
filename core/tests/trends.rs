//! Trend Analyzer: point deltas, least-squares fit and classification.

use pmhealth_core::{
    aggregate::TrendBucket,
    config::{EngineConfig, TrendConfig},
    engine::AnalyticsEngine,
    provider::{AggregateSet, AnalysisFilter, MemoryProvider, TrendQuery},
    trend::{analyze_trends, build_points, classify, linear_regression},
    types::{Direction, OverallTrend, TrendMetric, TrendPeriod},
};

fn bucket(period: &str, pm: &str, country: &str, tpv: f64) -> TrendBucket {
    TrendBucket {
        period: period.to_string(),
        payment_method_code: pm.to_string(),
        payment_method_name: format!("{pm} name"),
        country_code: country.to_string(),
        transaction_count: (tpv / 10.0) as i64,
        tpv_usd: tpv,
        approval_rate: 90.0,
        avg_transaction_value: 10.0,
    }
}

fn series(values: &[f64]) -> Vec<(String, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("2025-{:02}-01", i + 1), *v))
        .collect()
}

fn trend_of(values: &[f64]) -> OverallTrend {
    let (slope, r2) = linear_regression(values);
    classify(values.len(), slope, r2, &TrendConfig::default())
}

#[test]
fn increasing_series_is_growing() {
    let values = [100.0, 112.0, 119.0, 133.0, 141.0, 150.0];
    let (slope, r2) = linear_regression(&values);
    assert!(slope > 0.0, "slope {slope}");
    assert!(r2 > 0.5, "r² {r2}");
    assert_eq!(trend_of(&values), OverallTrend::Growing);
}

#[test]
fn decreasing_series_is_declining() {
    assert_eq!(trend_of(&[90.0, 70.0, 52.0, 31.0]), OverallTrend::Declining);
}

#[test]
fn alternating_series_is_volatile() {
    let values = [10.0, 0.0, 10.0, 0.0];
    let (_, r2) = linear_regression(&values);
    assert!(r2 < 0.5, "r² {r2}");
    assert_eq!(trend_of(&values), OverallTrend::Volatile);
}

#[test]
fn too_few_points_is_volatile() {
    assert_eq!(trend_of(&[]), OverallTrend::Volatile);
    assert_eq!(trend_of(&[500.0]), OverallTrend::Volatile);
}

#[test]
fn first_point_has_no_previous() {
    let points = build_points(&series(&[100.0, 150.0]), &TrendConfig::default());
    assert_eq!(points[0].previous_value, None);
    assert_eq!(points[0].absolute_change, 0.0);
    assert_eq!(points[0].percentage_change, 0.0);
    assert_eq!(points[0].direction, Direction::Flat);

    assert_eq!(points[1].previous_value, Some(100.0));
    assert_eq!(points[1].absolute_change, 50.0);
    assert_eq!(points[1].percentage_change, 50.0);
    assert_eq!(points[1].direction, Direction::Up);
}

#[test]
fn direction_uses_flat_band() {
    let points = build_points(&series(&[1000.0, 1009.0, 990.0, 0.0, 40.0]), &TrendConfig::default());
    // +0.9%
    assert_eq!(points[1].direction, Direction::Flat);
    // −1.88%
    assert_eq!(points[2].percentage_change, -1.88);
    assert_eq!(points[2].direction, Direction::Down);
    assert_eq!(points[3].direction, Direction::Down);
    // previous value of zero: no percentage, so FLAT despite the rise
    assert_eq!(points[4].percentage_change, 0.0);
    assert_eq!(points[4].direction, Direction::Flat);
}

#[test]
fn sub_cent_change_is_kept() {
    let points = build_points(&series(&[1.0, 1.004]), &TrendConfig::default());
    assert!((points[1].absolute_change - 0.004).abs() < 1e-12);
    assert_eq!(points[1].percentage_change, 0.4);
    assert_eq!(points[1].direction, Direction::Flat);
}

#[test]
fn groups_sorted_by_instrument_and_period() {
    let buckets = vec![
        bucket("2025-03-01", "YAPE", "PE", 300.0),
        bucket("2025-02-01", "PIX", "BR", 200.0),
        bucket("2025-01-01", "YAPE", "PE", 100.0),
        bucket("2025-01-01", "PIX", "BR", 100.0),
        bucket("2025-02-01", "YAPE", "PE", 200.0),
        bucket("2025-03-01", "PIX", "BR", 300.0),
    ];
    let summaries = analyze_trends(&buckets, TrendMetric::TpvUsd, &TrendConfig::default());
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].payment_method_code, "PIX");
    assert_eq!(summaries[1].payment_method_code, "YAPE");

    for s in &summaries {
        let periods: Vec<&str> = s.points.iter().map(|p| p.period.as_str()).collect();
        assert_eq!(periods, vec!["2025-01-01", "2025-02-01", "2025-03-01"]);
        assert_eq!(s.slope, 100.0);
        assert_eq!(s.r_squared, 1.0);
        assert_eq!(s.overall_trend, OverallTrend::Growing);
    }
}

#[test]
fn metric_selection() {
    let buckets = vec![
        bucket("2025-01-01", "PIX", "BR", 100.0),
        bucket("2025-02-01", "PIX", "BR", 300.0),
    ];
    let by_count = analyze_trends(&buckets, TrendMetric::TransactionCount, &TrendConfig::default());
    let values: Vec<f64> = by_count[0].points.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![10.0, 30.0]);
    assert_eq!(by_count[0].metric, TrendMetric::TransactionCount);

    let by_rate = analyze_trends(&buckets, TrendMetric::ApprovalRate, &TrendConfig::default());
    // constant series: fully explained, slope 0
    assert_eq!(by_rate[0].slope, 0.0);
    assert_eq!(by_rate[0].r_squared, 1.0);
}

#[test]
fn selector_fallbacks() {
    assert_eq!(TrendMetric::parse_or_default("approval_rate"), TrendMetric::ApprovalRate);
    assert_eq!(TrendMetric::parse_or_default("revenue"), TrendMetric::TpvUsd);
    assert_eq!(TrendPeriod::parse_or_default("wow"), TrendPeriod::Wow);
    assert_eq!(TrendPeriod::parse_or_default("quarterly"), TrendPeriod::Mom);
}

#[tokio::test]
async fn engine_resolves_default_periods_back() {
    let provider = MemoryProvider::new(AggregateSet {
        trend_buckets: vec![
            bucket("2025-01-01", "PIX", "BR", 100.0),
            bucket("2025-02-01", "PIX", "BR", 120.0),
            bucket("2025-03-01", "PIX", "BR", 145.0),
        ],
        ..AggregateSet::default()
    });
    let engine = AnalyticsEngine::new(provider, EngineConfig::default());
    let query = TrendQuery::new(AnalysisFilter::now(), TrendMetric::TpvUsd, TrendPeriod::Mom);
    assert_eq!(query.periods_back, 0);

    let summaries = engine.trends(&query).await.expect("trends");
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].points.len(), 3);
    assert_eq!(summaries[0].overall_trend, OverallTrend::Growing);
}
