//! The analytics engine: one entry point per analysis.
//!
//! RULES:
//!   - Every call re-reads the provider. Nothing is cached between calls.
//!   - Only `insights` (and `report`, through it) runs work concurrently.
//!   - The engine never writes: results are built fresh and handed back.

use crate::{
    clock,
    config::EngineConfig,
    error::EngineResult,
    insight::{self, Insight, InsightRequest},
    market_gap::{self, MarketGapReport},
    metrics::{self, MetricRecord, MetricSort, MetricsResult, MetricsSummary},
    provider::{AggregateProvider, AnalysisFilter, TrendQuery},
    roi::{self, RoiResult},
    trend::{self, TrendSummary},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Metrics and insights for one filter, stamped once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub generated_at: NaiveDateTime,
    pub summary: MetricsSummary,
    pub metrics: Vec<MetricRecord>,
    pub insights: Vec<Insight>,
}

pub struct AnalyticsEngine<P: AggregateProvider> {
    provider: Arc<P>,
    config: EngineConfig,
}

impl<P: AggregateProvider> Clone for AnalyticsEngine<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            config: self.config.clone(),
        }
    }
}

impl<P: AggregateProvider> AnalyticsEngine<P> {
    pub fn new(provider: P, config: EngineConfig) -> Self {
        Self::with_shared(Arc::new(provider), config)
    }

    pub fn with_shared(provider: Arc<P>, config: EngineConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn metrics(&self, filter: &AnalysisFilter, sort: MetricSort) -> EngineResult<MetricsResult> {
        let rows = self.provider.metric_rows(filter).await?;
        log::debug!("metrics: {} rows", rows.len());
        Ok(metrics::compute_metrics(
            &rows,
            filter.payment_method_type.as_deref(),
            sort,
            &self.config.activity,
        ))
    }

    pub async fn insights(
        &self,
        filter: &AnalysisFilter,
        request: &InsightRequest,
    ) -> EngineResult<Vec<Insight>> {
        insight::detect_insights(self.provider.as_ref(), filter, request, &self.config).await
    }

    pub async fn roi(&self, filter: &AnalysisFilter) -> EngineResult<Vec<RoiResult>> {
        let rows = self.provider.roi_rows(filter).await?;
        log::debug!("roi: {} rows", rows.len());
        Ok(roi::compute_all(&rows, &self.config.roi))
    }

    /// `periods_back` of 0 resolves to the configured default before the
    /// provider sees the query.
    pub async fn trends(&self, query: &TrendQuery) -> EngineResult<Vec<TrendSummary>> {
        let mut query = query.clone();
        if query.periods_back < 1 {
            query.periods_back = self.config.trend.default_periods_back;
        }
        let buckets = self.provider.trend_buckets(&query).await?;
        log::debug!(
            "trends: {} buckets ({} over {} periods)",
            buckets.len(),
            query.metric.as_str(),
            query.periods_back
        );
        Ok(trend::analyze_trends(&buckets, query.metric, &self.config.trend))
    }

    pub async fn market_gaps(
        &self,
        filter: &AnalysisFilter,
        only_essential: bool,
    ) -> EngineResult<MarketGapReport> {
        let gaps = self.provider.market_gaps(filter, only_essential).await?;
        let coverage = self.provider.coverage(filter).await?;
        log::debug!("market gaps: {} gaps across {} countries", gaps.len(), coverage.len());
        Ok(MarketGapReport {
            gaps: market_gap::score_gaps(&gaps, &self.config.market_gap),
            coverage: market_gap::country_coverage(&coverage),
        })
    }

    /// Every metric plus every insight for `filter`.
    pub async fn report(&self, filter: &AnalysisFilter) -> EngineResult<HealthReport> {
        let generated_at = clock::now();
        let MetricsResult { metrics, summary } = self.metrics(filter, MetricSort::default()).await?;
        let insights = self.insights(filter, &InsightRequest::all()).await?;
        Ok(HealthReport {
            generated_at,
            summary,
            metrics,
            insights,
        })
    }
}
