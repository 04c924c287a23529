//! Aggregate Provider: the boundary between the engine and its data.
//!
//! RULE: the engine never executes SQL. Every analysis pulls its rows
//! through an `AggregateProvider`; these calls are the only suspension
//! points in the engine.
//!
//! Two providers ship with the crate:
//!   - `StoreProvider` runs the queries in `store/` against SQLite on
//!     tokio's blocking pool.
//!   - `MemoryProvider` hands back a fixed, pre-aggregated row set.

use crate::{
    aggregate::{
        CatalogGap, CoverageRow, HiddenGemCandidate, MetricRow, PerformanceAlertCandidate,
        RoiRow, TrendBucket, ZombieCandidate,
    },
    clock::{self, TRAILING_WINDOW_DAYS},
    error::{EngineError, EngineResult},
    store::PaymentStore,
    types::{TrendMetric, TrendPeriod},
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::{Arc, Mutex};

// ── Query shapes ─────────────────────────────────────────────────────────────

/// Selectors shared by every analysis. `None` means "all".
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisFilter {
    pub country: Option<String>,
    pub payment_method_type: Option<String>,
    pub date_from: Option<NaiveDate>,
    /// Inclusive: the whole day is part of the range.
    pub date_to: Option<NaiveDate>,
    /// Trailing windows end here.
    pub as_of: NaiveDateTime,
    pub trailing_window_days: i64,
}

impl AnalysisFilter {
    pub fn as_of(as_of: NaiveDateTime) -> Self {
        Self {
            country: None,
            payment_method_type: None,
            date_from: None,
            date_to: None,
            as_of,
            trailing_window_days: TRAILING_WINDOW_DAYS,
        }
    }

    pub fn now() -> Self {
        Self::as_of(clock::now())
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_payment_method_type(mut self, pm_type: impl Into<String>) -> Self {
        self.payment_method_type = Some(pm_type.into());
        self
    }

    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn trailing_start(&self) -> NaiveDateTime {
        clock::trailing_window_start(self.as_of, self.trailing_window_days)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendQuery {
    pub filter: AnalysisFilter,
    pub payment_method: Option<String>,
    pub period: TrendPeriod,
    pub metric: TrendMetric,
    /// 0 means "use the configured default".
    pub periods_back: u32,
}

impl TrendQuery {
    pub fn new(filter: AnalysisFilter, metric: TrendMetric, period: TrendPeriod) -> Self {
        Self {
            filter,
            payment_method: None,
            period,
            metric,
            periods_back: 0,
        }
    }
}

// ── Provider contract ────────────────────────────────────────────────────────

#[async_trait]
pub trait AggregateProvider: Send + Sync {
    async fn metric_rows(&self, filter: &AnalysisFilter) -> EngineResult<Vec<MetricRow>>;

    async fn zombie_candidates(&self, filter: &AnalysisFilter) -> EngineResult<Vec<ZombieCandidate>>;

    async fn hidden_gem_candidates(
        &self,
        filter: &AnalysisFilter,
    ) -> EngineResult<Vec<HiddenGemCandidate>>;

    async fn performance_alert_candidates(
        &self,
        filter: &AnalysisFilter,
    ) -> EngineResult<Vec<PerformanceAlertCandidate>>;

    async fn roi_rows(&self, filter: &AnalysisFilter) -> EngineResult<Vec<RoiRow>>;

    async fn trend_buckets(&self, query: &TrendQuery) -> EngineResult<Vec<TrendBucket>>;

    async fn market_gaps(
        &self,
        filter: &AnalysisFilter,
        only_essential: bool,
    ) -> EngineResult<Vec<CatalogGap>>;

    async fn coverage(&self, filter: &AnalysisFilter) -> EngineResult<Vec<CoverageRow>>;
}

// ── SQLite-backed provider ───────────────────────────────────────────────────

/// Runs store queries on the blocking pool. The store sits behind a mutex,
/// so concurrent classifiers queue on the connection rather than share it.
#[derive(Clone)]
pub struct StoreProvider {
    store: Arc<Mutex<PaymentStore>>,
}

impl StoreProvider {
    pub fn new(store: PaymentStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Run `f` against the store on the blocking pool.
    pub async fn with_store<T, F>(&self, f: F) -> EngineResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&PaymentStore) -> EngineResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let guard = store.lock().map_err(|_| EngineError::StoreUnavailable)?;
            f(&guard)
        })
        .await?
    }
}

#[async_trait]
impl AggregateProvider for StoreProvider {
    async fn metric_rows(&self, filter: &AnalysisFilter) -> EngineResult<Vec<MetricRow>> {
        let filter = filter.clone();
        self.with_store(move |s| s.metric_rows(&filter)).await
    }

    async fn zombie_candidates(&self, filter: &AnalysisFilter) -> EngineResult<Vec<ZombieCandidate>> {
        let filter = filter.clone();
        self.with_store(move |s| s.zombie_candidates(&filter)).await
    }

    async fn hidden_gem_candidates(
        &self,
        filter: &AnalysisFilter,
    ) -> EngineResult<Vec<HiddenGemCandidate>> {
        let filter = filter.clone();
        self.with_store(move |s| s.hidden_gem_candidates(&filter)).await
    }

    async fn performance_alert_candidates(
        &self,
        filter: &AnalysisFilter,
    ) -> EngineResult<Vec<PerformanceAlertCandidate>> {
        let filter = filter.clone();
        self.with_store(move |s| s.performance_alert_candidates(&filter)).await
    }

    async fn roi_rows(&self, filter: &AnalysisFilter) -> EngineResult<Vec<RoiRow>> {
        let filter = filter.clone();
        self.with_store(move |s| s.roi_rows(&filter)).await
    }

    async fn trend_buckets(&self, query: &TrendQuery) -> EngineResult<Vec<TrendBucket>> {
        let query = query.clone();
        self.with_store(move |s| s.trend_buckets(&query)).await
    }

    async fn market_gaps(
        &self,
        filter: &AnalysisFilter,
        only_essential: bool,
    ) -> EngineResult<Vec<CatalogGap>> {
        let filter = filter.clone();
        self.with_store(move |s| s.market_gaps(&filter, only_essential)).await
    }

    async fn coverage(&self, filter: &AnalysisFilter) -> EngineResult<Vec<CoverageRow>> {
        let filter = filter.clone();
        self.with_store(move |s| s.coverage(&filter)).await
    }
}

// ── Fixed row set ────────────────────────────────────────────────────────────

/// Pre-aggregated rows for every query shape.
#[derive(Debug, Clone, Default)]
pub struct AggregateSet {
    pub metric_rows: Vec<MetricRow>,
    pub zombie_candidates: Vec<ZombieCandidate>,
    pub hidden_gem_candidates: Vec<HiddenGemCandidate>,
    pub performance_alert_candidates: Vec<PerformanceAlertCandidate>,
    pub roi_rows: Vec<RoiRow>,
    pub trend_buckets: Vec<TrendBucket>,
    pub market_gaps: Vec<CatalogGap>,
    pub coverage: Vec<CoverageRow>,
}

/// Returns its rows verbatim. The rows are assumed to be already filtered,
/// so selectors are ignored except `only_essential`.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    rows: AggregateSet,
}

impl MemoryProvider {
    pub fn new(rows: AggregateSet) -> Self {
        Self { rows }
    }
}

#[async_trait]
impl AggregateProvider for MemoryProvider {
    async fn metric_rows(&self, _filter: &AnalysisFilter) -> EngineResult<Vec<MetricRow>> {
        Ok(self.rows.metric_rows.clone())
    }

    async fn zombie_candidates(&self, _filter: &AnalysisFilter) -> EngineResult<Vec<ZombieCandidate>> {
        Ok(self.rows.zombie_candidates.clone())
    }

    async fn hidden_gem_candidates(
        &self,
        _filter: &AnalysisFilter,
    ) -> EngineResult<Vec<HiddenGemCandidate>> {
        Ok(self.rows.hidden_gem_candidates.clone())
    }

    async fn performance_alert_candidates(
        &self,
        _filter: &AnalysisFilter,
    ) -> EngineResult<Vec<PerformanceAlertCandidate>> {
        Ok(self.rows.performance_alert_candidates.clone())
    }

    async fn roi_rows(&self, _filter: &AnalysisFilter) -> EngineResult<Vec<RoiRow>> {
        Ok(self.rows.roi_rows.clone())
    }

    async fn trend_buckets(&self, _query: &TrendQuery) -> EngineResult<Vec<TrendBucket>> {
        Ok(self.rows.trend_buckets.clone())
    }

    async fn market_gaps(
        &self,
        _filter: &AnalysisFilter,
        only_essential: bool,
    ) -> EngineResult<Vec<CatalogGap>> {
        Ok(self
            .rows
            .market_gaps
            .iter()
            .filter(|g| !only_essential || g.is_essential)
            .cloned()
            .collect())
    }

    async fn coverage(&self, _filter: &AnalysisFilter) -> EngineResult<Vec<CoverageRow>> {
        Ok(self.rows.coverage.clone())
    }
}
