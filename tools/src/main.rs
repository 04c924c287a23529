//! pmhealth-runner: headless runner for the payment method health engine.
//!
//! Usage:
//!   pmhealth-runner --seed 42 --as-of 2026-02-28 --analysis report
//!   pmhealth-runner --db health.db --analysis insights --severity HIGH
//!   pmhealth-runner --analysis trends --metric approval_rate --period WOW
//!   pmhealth-runner --analysis roi --date-from 2025-09-01 --date-to 2025-12-31

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use pmhealth_core::{
    clock,
    config::EngineConfig,
    engine::AnalyticsEngine,
    insight::InsightRequest,
    metrics::{MetricSort, SortKey, SortOrder},
    provider::{AnalysisFilter, StoreProvider, TrendQuery},
    seed,
    store::PaymentStore,
    types::{InsightType, Severity, TrendMetric, TrendPeriod},
};
use serde::Serialize;
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let periods_back = parse_arg(&args, "--periods-back", 0u32);
    let essential_only = args.iter().any(|a| a == "--essential-only");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data");
    let analysis = flag_value(&args, "--analysis").unwrap_or("report");

    let as_of = date_flag(&args, "--as-of")?
        .map(clock::day_start)
        .unwrap_or_else(clock::now);

    let config = match EngineConfig::load(data_dir) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("{e}; using built-in thresholds");
            EngineConfig::default()
        }
    };

    let store = PaymentStore::open(db)?;
    store.migrate()?;
    seed::seed_demo_data(&store, as_of, seed)?;
    log::info!("{} transactions in store", store.transaction_count()?);

    let mut filter = AnalysisFilter::as_of(as_of);
    if let Some(country) = flag_value(&args, "--country") {
        filter = filter.with_country(country.to_ascii_uppercase());
    }
    if let Some(pm_type) = flag_value(&args, "--type") {
        filter = filter.with_payment_method_type(pm_type.to_ascii_uppercase());
    }
    filter = filter.with_date_range(
        date_flag(&args, "--date-from")?,
        date_flag(&args, "--date-to")?,
    );

    let engine = AnalyticsEngine::new(StoreProvider::new(store), config);

    match analysis {
        "report" => print_json(&engine.report(&filter).await?),
        "metrics" => {
            let sort = MetricSort {
                key: SortKey::parse_or_default(flag_value(&args, "--sort").unwrap_or("")),
                order: match flag_value(&args, "--order") {
                    Some("asc") => SortOrder::Asc,
                    _ => SortOrder::Desc,
                },
            };
            print_json(&engine.metrics(&filter, sort).await?)
        }
        "insights" => {
            let mut request = InsightRequest::all();
            if let Some(t) = flag_value(&args, "--insight-type") {
                let t = InsightType::parse(t).ok_or_else(|| anyhow!("Unknown insight type '{t}'"))?;
                request = request.with_types(&[t]);
            }
            if let Some(s) = flag_value(&args, "--severity") {
                let s = Severity::parse(s).ok_or_else(|| anyhow!("Unknown severity '{s}'"))?;
                request = request.with_severity(s);
            }
            print_json(&engine.insights(&filter, &request).await?)
        }
        "roi" => print_json(&engine.roi(&filter).await?),
        "trends" => {
            let mut query = TrendQuery::new(
                filter,
                TrendMetric::parse_or_default(flag_value(&args, "--metric").unwrap_or("")),
                TrendPeriod::parse_or_default(flag_value(&args, "--period").unwrap_or("")),
            );
            query.payment_method = flag_value(&args, "--payment-method").map(str::to_string);
            query.periods_back = periods_back;
            print_json(&engine.trends(&query).await?)
        }
        "gaps" => print_json(&engine.market_gaps(&filter, essential_only).await?),
        other => Err(anyhow!(
            "Unknown analysis '{other}' (expected report, metrics, insights, roi, trends or gaps)"
        )),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// `YYYY-MM-DD` flag. A malformed date is an error, not a silent default.
fn date_flag(args: &[String], flag: &str) -> Result<Option<NaiveDate>> {
    flag_value(args, flag)
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|e| anyhow!("Invalid {flag} '{s}': {e}"))
        })
        .transpose()
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    flag_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
