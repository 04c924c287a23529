//! SQLite store end to end: hand-built rows through StoreProvider.

use chrono::{NaiveDate, NaiveDateTime};
use pmhealth_core::{
    config::EngineConfig,
    engine::AnalyticsEngine,
    insight::InsightRequest,
    metrics::MetricSort,
    provider::{AggregateProvider, AnalysisFilter, StoreProvider, TrendQuery},
    store::{
        CatalogEntry, CountryRecord, IntegrationCostRecord, PaymentMethodRecord, PaymentStore,
        TransactionRecord, TransactionStatus,
    },
    types::{InsightType, OverallTrend, Severity, TrendMetric, TrendPeriod},
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn ts(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, 0, 0).expect("valid time")
}

fn as_of() -> NaiveDateTime {
    ts(2026, 3, 1, 0)
}

fn txn(id: &str, pm: &str, status: TransactionStatus, usd: f64, at: NaiveDateTime) -> TransactionRecord {
    TransactionRecord {
        id: id.to_string(),
        payment_method_code: pm.to_string(),
        country_code: "BR".to_string(),
        currency: "BRL".to_string(),
        amount: usd / 0.196,
        amount_usd: usd,
        status,
        merchant_id: Some("merchant_001".to_string()),
        customer_id: None,
        transaction_date: at,
    }
}

fn cost(pm: &str, monthly: f64, per_txn: f64, pct_fee: f64) -> IntegrationCostRecord {
    IntegrationCostRecord {
        payment_method_code: pm.to_string(),
        country_code: "BR".to_string(),
        monthly_fixed_cost_usd: monthly,
        per_transaction_cost_usd: per_txn,
        percentage_fee: pct_fee,
        effective_from: date(2025, 1, 1),
        effective_to: None,
    }
}

fn catalog(pm: &str, share: f64, essential: bool) -> CatalogEntry {
    CatalogEntry {
        country_code: "BR".to_string(),
        payment_method_code: pm.to_string(),
        market_share_pct: share,
        is_essential: essential,
        source: "test".to_string(),
    }
}

/// Store and engine `debug!` output shows under `RUST_LOG`.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// PIX: 20 transactions in February 2026 (19 approved, $100 each).
/// BOLETO: 4 approved $50 transactions, June to September 2025.
/// Catalog: PIX, BOLETO and ELO (never integrated).
fn build_store() -> PaymentStore {
    init_logging();
    let store = PaymentStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
        .write_batch(|s| {
            s.insert_country(&CountryRecord {
                code: "BR".into(),
                name: "Brazil".into(),
                currency: "BRL".into(),
                fx_rate_to_usd: 0.196,
            })?;
            for (code, name, pm_type) in [
                ("PIX", "PIX Instant Payment", "BANK_TRANSFER"),
                ("BOLETO", "Boleto Bancário", "CASH"),
            ] {
                s.insert_payment_method(&PaymentMethodRecord {
                    code: code.into(),
                    name: name.into(),
                    pm_type: pm_type.into(),
                    provider: None,
                })?;
                s.link_payment_method_country(code, "BR")?;
            }

            for day in 1..=20u32 {
                let status = if day == 20 {
                    TransactionStatus::Declined
                } else {
                    TransactionStatus::Approved
                };
                s.insert_transaction(&txn(&format!("pix-{day}"), "PIX", status, 100.0, ts(2026, 2, day, 10)))?;
            }
            for month in 6..=9u32 {
                s.insert_transaction(&txn(
                    &format!("boleto-{month}"),
                    "BOLETO",
                    TransactionStatus::Approved,
                    50.0,
                    ts(2025, month, 1, 10),
                ))?;
            }
            // after as_of: invisible to every window
            s.insert_transaction(&txn("pix-late", "PIX", TransactionStatus::Approved, 100.0, ts(2026, 3, 5, 9)))?;

            s.insert_integration_cost(&cost("PIX", 50.0, 0.02, 0.001))?;
            s.insert_integration_cost(&cost("BOLETO", 60.0, 0.08, 0.0015))?;

            s.insert_catalog_entry(&catalog("PIX", 41.0, true))?;
            s.insert_catalog_entry(&catalog("BOLETO", 9.0, true))?;
            s.insert_catalog_entry(&catalog("ELO", 5.0, false))?;
            Ok(())
        })
        .expect("fixture");
    store
}

fn through_march() -> AnalysisFilter {
    AnalysisFilter::as_of(as_of()).with_date_range(None, Some(date(2026, 2, 28)))
}

#[test]
fn migration_is_repeatable() {
    let store = build_store();
    store.migrate().expect("second migration");
    assert_eq!(store.country_count().expect("count"), 1);
    assert_eq!(store.transaction_count().expect("count"), 25);
}

#[test]
fn failed_batch_rolls_back() {
    let store = build_store();
    let result = store.write_batch(|s| {
        s.insert_transaction(&txn("extra", "PIX", TransactionStatus::Approved, 10.0, ts(2026, 2, 21, 8)))?;
        // duplicate primary key
        s.insert_transaction(&txn("pix-1", "PIX", TransactionStatus::Approved, 10.0, ts(2026, 2, 21, 9)))
    });
    assert!(result.is_err());
    assert_eq!(store.transaction_count().expect("count"), 25);
}

#[test]
fn metric_rows_aggregate_per_instrument() {
    let store = build_store();
    let rows = store.metric_rows(&through_march()).expect("metric rows");
    assert_eq!(rows.len(), 2);

    let boleto = &rows[0];
    assert_eq!(boleto.payment_method_code, "BOLETO");
    assert_eq!(boleto.transaction_count, 4);
    assert_eq!(boleto.tpv_usd, 200.0);
    assert_eq!(boleto.txn_count_trailing, 0);
    assert_eq!(boleto.monthly_cost_usd, 60.0);

    let pix = &rows[1];
    assert_eq!(pix.payment_method_code, "PIX");
    assert_eq!(pix.transaction_count, 20);
    assert_eq!(pix.approved_count, 19);
    assert_eq!(pix.declined_count, 1);
    assert_eq!(pix.tpv_usd, 1900.0);
    assert_eq!(pix.approval_rate, 95.0);
    assert_eq!(pix.avg_transaction_value, 100.0);
    assert_eq!(pix.txn_count_trailing, 20);
}

#[test]
fn date_to_includes_the_whole_day() {
    let store = build_store();
    let filter = AnalysisFilter::as_of(as_of())
        .with_date_range(Some(date(2026, 2, 20)), Some(date(2026, 2, 20)));
    let rows = store.metric_rows(&filter).expect("metric rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].transaction_count, 1);
    assert_eq!(rows[0].declined_count, 1);
}

#[test]
fn zombie_candidates_measure_history() {
    let store = build_store();
    let rows = store.zombie_candidates(&AnalysisFilter::as_of(as_of())).expect("candidates");
    assert_eq!(rows.len(), 2);

    let boleto = &rows[0];
    assert_eq!(boleto.payment_method_code, "BOLETO");
    assert_eq!(boleto.txn_count_90d, 0);
    // June 1 to September 1 is 92 days ≈ 3.07 months
    assert_eq!(boleto.months_active, 3);
    assert!((boleto.historical_monthly_avg - 4.0 / (92.0 / 30.0)).abs() < 1e-9);

    let pix = &rows[1];
    assert_eq!(pix.txn_count_90d, 20);
    assert_eq!(pix.months_active, 1);
    // span under a month is floored at one
    assert!((pix.historical_monthly_avg - 20.0).abs() < 1e-9);
}

#[test]
fn hidden_gem_and_alert_candidates() {
    let store = build_store();
    let filter = AnalysisFilter::as_of(as_of());

    let gems = store.hidden_gem_candidates(&filter).expect("gems");
    let pix = gems.iter().find(|g| g.payment_method_code == "PIX").expect("PIX");
    assert!((pix.revenue_contribution_pct - 1900.0 / 2100.0 * 100.0).abs() < 1e-9);
    assert!((pix.volume_share_pct - 20.0 / 24.0 * 100.0).abs() < 1e-9);
    assert_eq!(pix.approval_rate, 95.0);

    let alerts = store.performance_alert_candidates(&filter).expect("alerts");
    assert_eq!(alerts.len(), 2);
    for a in &alerts {
        // each method is alone in its type, so it is its own average
        assert_eq!(a.approval_rate, a.country_type_avg_approval);
    }
}

#[test]
fn roi_rows_use_active_costs() {
    let store = build_store();
    let rows = store.roi_rows(&through_march()).expect("roi rows");
    let pix = rows.iter().find(|r| r.payment_method_code == "PIX").expect("PIX");
    assert_eq!(pix.approved_tpv, 1900.0);
    assert_eq!(pix.approved_count, 19);
    assert_eq!(pix.total_count, 20);
    assert_eq!(pix.monthly_fixed_cost, 50.0);
    assert_eq!(pix.per_transaction_cost, 0.02);
    assert_eq!(pix.percentage_fee, 0.001);
    assert_eq!(pix.months_in_range, 1.0);
}

#[test]
fn trend_buckets_by_month_and_week() {
    let store = build_store();
    let monthly = TrendQuery {
        periods_back: 6,
        ..TrendQuery::new(AnalysisFilter::as_of(as_of()), TrendMetric::TpvUsd, TrendPeriod::Mom)
    };
    let buckets = store.trend_buckets(&monthly).expect("monthly");
    let labels: Vec<(&str, &str)> = buckets
        .iter()
        .map(|b| (b.period.as_str(), b.payment_method_code.as_str()))
        .collect();
    // window opens 2025-09-01: June to August BOLETO rows fall outside
    assert_eq!(labels, vec![("2025-09-01", "BOLETO"), ("2026-02-01", "PIX")]);
    assert_eq!(buckets[1].transaction_count, 20);
    assert_eq!(buckets[1].approval_rate, 95.0);

    let mut weekly = TrendQuery::new(AnalysisFilter::as_of(as_of()), TrendMetric::TransactionCount, TrendPeriod::Wow);
    weekly.periods_back = 5;
    weekly.payment_method = Some("PIX".to_string());
    let buckets = store.trend_buckets(&weekly).expect("weekly");
    let weeks: Vec<&str> = buckets.iter().map(|b| b.period.as_str()).collect();
    // Feb 1 2026 is a Sunday, so it belongs to the week of Jan 26
    assert_eq!(weeks, vec!["2026-01-26", "2026-02-02", "2026-02-09", "2026-02-16"]);
    let counts: Vec<i64> = buckets.iter().map(|b| b.transaction_count).collect();
    assert_eq!(counts, vec![1, 7, 7, 5]);
}

#[test]
fn gaps_and_coverage() {
    let store = build_store();
    let filter = AnalysisFilter::as_of(as_of());

    let gaps = store.market_gaps(&filter, false).expect("gaps");
    let codes: Vec<&str> = gaps.iter().map(|g| g.payment_method_code.as_str()).collect();
    assert_eq!(codes, vec!["BOLETO", "ELO"]);

    let essential = store.market_gaps(&filter, true).expect("essential gaps");
    assert_eq!(essential.len(), 1);
    assert_eq!(essential[0].payment_method_code, "BOLETO");

    let coverage = store.coverage(&filter).expect("coverage");
    assert_eq!(coverage.len(), 1);
    assert_eq!(coverage[0].total_catalog_methods, 3);
    assert_eq!(coverage[0].active_methods, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn engine_over_sqlite() {
    let provider = StoreProvider::new(build_store());
    assert_eq!(provider.metric_rows(&through_march()).await.expect("rows").len(), 2);

    let engine = AnalyticsEngine::new(provider, EngineConfig::default());
    let filter = AnalysisFilter::as_of(as_of());

    let insights = engine.insights(&filter, &InsightRequest::all()).await.expect("insights");
    let zombies: Vec<_> = insights
        .iter()
        .filter(|i| i.insight_type == InsightType::Zombie)
        .collect();
    assert_eq!(zombies.len(), 1);
    assert_eq!(zombies[0].payment_method_code, "BOLETO");
    assert_eq!(zombies[0].severity, Severity::High);
    assert_eq!(zombies[0].threshold, 10.0);

    let metrics = engine.metrics(&through_march(), MetricSort::default()).await.expect("metrics");
    assert_eq!(metrics.metrics[0].payment_method_code, "PIX");
    assert_eq!(metrics.summary.total_transactions, 24);

    let query = TrendQuery::new(filter.clone(), TrendMetric::TpvUsd, TrendPeriod::Mom);
    let trends = engine.trends(&query).await.expect("trends");
    assert_eq!(trends.len(), 2);
    assert!(trends.iter().all(|t| t.overall_trend == OverallTrend::Volatile));

    let gaps = engine.market_gaps(&filter, false).await.expect("gaps");
    assert_eq!(gaps.coverage[0].coverage_pct, 33.33);
    // 9 × 0.5 + 30 + 9 × 0.2
    assert_eq!(gaps.gaps[0].opportunity_score, 36.3);

    let report = engine.report(&filter).await.expect("report");
    assert_eq!(report.metrics.len(), 2);
    assert_eq!(report.insights.len(), insights.len());
}
