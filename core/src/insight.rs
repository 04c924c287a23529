//! Insight Detector: zombie, hidden-gem and performance-alert classifiers.
//!
//! RULES:
//!   - The three classifiers share no state; each pulls its own candidate
//!     rows from the provider.
//!   - They run concurrently inside one task and join fail-fast: the first
//!     error drops the sibling futures and no partial list is returned.
//!   - Merge order is fixed: zombie, hidden_gem, performance_alert, each
//!     slice in provider row order. Severity filtering happens after the
//!     merge.
//!   - Every insight of one call carries the same `generated_at`.

use crate::{
    aggregate::{HiddenGemCandidate, PerformanceAlertCandidate, ZombieCandidate},
    clock,
    config::{EngineConfig, HiddenGemConfig, PerformanceAlertConfig, ZombieConfig},
    error::EngineResult,
    numeric::round2,
    provider::{AggregateProvider, AnalysisFilter},
    types::{CountryCode, InsightType, PaymentMethodCode, Severity},
};
use chrono::NaiveDateTime;
use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};
use sha2::{Digest, Sha256};
use std::fmt;

// ── Supporting data ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SupportValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<f64> for SupportValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for SupportValue {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for SupportValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SupportValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for SupportValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

/// Ordered key/value bag. Serializes as a JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupportingData(Vec<(String, SupportValue)>);

impl SupportingData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<SupportValue>) -> Self {
        self.0.push((key.to_string(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&SupportValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SupportingData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SupportingData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = SupportingData;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of supporting values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((k, v)) = access.next_entry::<String, SupportValue>()? {
                    entries.push((k, v));
                }
                Ok(SupportingData(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

// ── Insight ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub insight_id: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub severity: Severity,
    pub payment_method_code: PaymentMethodCode,
    pub payment_method_name: String,
    pub country_code: CountryCode,
    pub triggering_metric: String,
    pub metric_value: f64,
    pub threshold: f64,
    pub description: String,
    pub recommended_action: String,
    pub supporting_data: SupportingData,
    pub generated_at: NaiveDateTime,
}

/// First 16 hex chars of SHA-256 over `"{type}|{pm}|{country}"`.
pub fn insight_id(insight_type: InsightType, pm_code: &str, country_code: &str) -> String {
    let digest = Sha256::digest(format!("{}|{pm_code}|{country_code}", insight_type.as_str()));
    let mut id = hex::encode(digest);
    id.truncate(16);
    id
}

// ── Classifiers ──────────────────────────────────────────────────────────────

/// Flag instruments whose trailing volume fell below their baseline while
/// they still carry an integration cost.
pub fn classify_zombie(
    c: &ZombieCandidate,
    cfg: &ZombieConfig,
    generated_at: NaiveDateTime,
) -> Option<Insight> {
    let count = c.txn_count_90d as f64;
    let threshold = if c.months_active < cfg.new_instrument_months {
        cfg.new_instrument_floor
    } else {
        cfg.baseline_floor
            .max(c.historical_monthly_avg * cfg.window_months * cfg.expected_fraction)
    };
    if count >= threshold {
        return None;
    }

    // Ratio tiers need a baseline; without history only zero volume is HIGH.
    let expected = c.historical_monthly_avg * cfg.window_months;
    let ratio = (expected > 0.0).then(|| count / expected);
    let severity = match ratio {
        _ if c.txn_count_90d == 0 => Severity::High,
        Some(r) if r < cfg.high_ratio => Severity::High,
        Some(r) if r < cfg.medium_ratio => Severity::Medium,
        _ => Severity::Low,
    };

    Some(Insight {
        insight_id: insight_id(InsightType::Zombie, &c.payment_method_code, &c.country_code),
        insight_type: InsightType::Zombie,
        severity,
        payment_method_code: c.payment_method_code.clone(),
        payment_method_name: c.payment_method_name.clone(),
        country_code: c.country_code.clone(),
        triggering_metric: "txn_count_90d".to_string(),
        metric_value: count,
        threshold: round2(threshold),
        description: format!(
            "{} in {} processed {} transactions in the last 90 days against a baseline of {:.0}, \
             while costing ${:.2}/month.",
            c.payment_method_name, c.country_code, c.txn_count_90d, threshold, c.monthly_cost_usd
        ),
        recommended_action: format!(
            "Review whether {} is still needed in {}. Consider deprecating it or promoting it \
             to merchants.",
            c.payment_method_name, c.country_code
        ),
        supporting_data: SupportingData::new()
            .with("monthly_cost_usd", c.monthly_cost_usd)
            .with("historical_monthly_avg", round2(c.historical_monthly_avg))
            .with("months_active", c.months_active)
            .with("payment_method_type", c.payment_method_type.as_str()),
        generated_at,
    })
}

/// Flag instruments earning far more than their share of volume suggests.
pub fn classify_hidden_gem(
    c: &HiddenGemCandidate,
    cfg: &HiddenGemConfig,
    generated_at: NaiveDateTime,
) -> Option<Insight> {
    let contribution = c.revenue_contribution_pct;
    let flagged = c.approval_rate >= cfg.min_approval_rate
        && contribution >= cfg.min_revenue_contribution_pct
        && c.volume_share_pct < contribution * cfg.volume_share_factor;
    if !flagged {
        return None;
    }

    let severity = if contribution > cfg.high_contribution_pct {
        Severity::High
    } else if contribution > cfg.medium_contribution_pct {
        Severity::Medium
    } else {
        Severity::Low
    };

    Some(Insight {
        insight_id: insight_id(InsightType::HiddenGem, &c.payment_method_code, &c.country_code),
        insight_type: InsightType::HiddenGem,
        severity,
        payment_method_code: c.payment_method_code.clone(),
        payment_method_name: c.payment_method_name.clone(),
        country_code: c.country_code.clone(),
        triggering_metric: "revenue_contribution_pct".to_string(),
        metric_value: round2(contribution),
        threshold: cfg.min_revenue_contribution_pct,
        description: format!(
            "{} in {} approves {:.1}% of transactions and contributes {:.1}% of revenue on only \
             {:.1}% of volume.",
            c.payment_method_name, c.country_code, c.approval_rate, contribution, c.volume_share_pct
        ),
        recommended_action: format!(
            "Promote {} in {}: feature it at checkout and raise its visibility with merchants.",
            c.payment_method_name, c.country_code
        ),
        supporting_data: SupportingData::new()
            .with("approval_rate", round2(c.approval_rate))
            .with("volume_share_pct", round2(c.volume_share_pct))
            .with("tpv_usd", round2(c.tpv_usd))
            .with("transaction_count", c.transaction_count),
        generated_at,
    })
}

/// Flag instruments approving well below peers of the same type in the
/// same country.
pub fn classify_performance_alert(
    c: &PerformanceAlertCandidate,
    cfg: &PerformanceAlertConfig,
    generated_at: NaiveDateTime,
) -> Option<Insight> {
    if c.transaction_count < cfg.min_transactions {
        return None;
    }
    let gap = c.country_type_avg_approval - c.approval_rate;
    if gap <= cfg.alert_gap_pp {
        return None;
    }
    let severity = if gap > cfg.high_gap_pp { Severity::High } else { Severity::Medium };

    Some(Insight {
        insight_id: insight_id(
            InsightType::PerformanceAlert,
            &c.payment_method_code,
            &c.country_code,
        ),
        insight_type: InsightType::PerformanceAlert,
        severity,
        payment_method_code: c.payment_method_code.clone(),
        payment_method_name: c.payment_method_name.clone(),
        country_code: c.country_code.clone(),
        triggering_metric: "approval_rate".to_string(),
        metric_value: round2(c.approval_rate),
        threshold: round2(c.country_type_avg_approval - cfg.alert_gap_pp),
        description: format!(
            "{} in {} approves {:.1}% of transactions, {:.1}pp below the {:.1}% average for {} \
             methods in the country.",
            c.payment_method_name,
            c.country_code,
            c.approval_rate,
            gap,
            c.country_type_avg_approval,
            c.payment_method_type
        ),
        recommended_action: format!(
            "Investigate decline reasons for {} in {} with the provider.",
            c.payment_method_name, c.country_code
        ),
        supporting_data: SupportingData::new()
            .with("country_type_avg_approval", round2(c.country_type_avg_approval))
            .with("gap_pp", round2(gap))
            .with("payment_method_type", c.payment_method_type.as_str())
            .with("transaction_count", c.transaction_count),
        generated_at,
    })
}

// ── Detection ────────────────────────────────────────────────────────────────

/// Which classifiers to run and which severity to keep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsightRequest {
    /// Empty selects every classifier.
    pub types: Vec<InsightType>,
    pub severity: Option<Severity>,
}

impl InsightRequest {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_types(mut self, types: &[InsightType]) -> Self {
        self.types = types.to_vec();
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn selects(&self, t: InsightType) -> bool {
        self.types.is_empty() || self.types.contains(&t)
    }
}

async fn zombie_insights<P: AggregateProvider + ?Sized>(
    provider: &P,
    filter: &AnalysisFilter,
    cfg: &ZombieConfig,
    generated_at: NaiveDateTime,
) -> EngineResult<Vec<Insight>> {
    let rows = provider.zombie_candidates(filter).await?;
    log::debug!("zombie classifier: {} candidates", rows.len());
    Ok(rows
        .iter()
        .filter_map(|c| classify_zombie(c, cfg, generated_at))
        .collect())
}

async fn hidden_gem_insights<P: AggregateProvider + ?Sized>(
    provider: &P,
    filter: &AnalysisFilter,
    cfg: &HiddenGemConfig,
    generated_at: NaiveDateTime,
) -> EngineResult<Vec<Insight>> {
    let rows = provider.hidden_gem_candidates(filter).await?;
    log::debug!("hidden_gem classifier: {} candidates", rows.len());
    Ok(rows
        .iter()
        .filter_map(|c| classify_hidden_gem(c, cfg, generated_at))
        .collect())
}

async fn performance_alert_insights<P: AggregateProvider + ?Sized>(
    provider: &P,
    filter: &AnalysisFilter,
    cfg: &PerformanceAlertConfig,
    generated_at: NaiveDateTime,
) -> EngineResult<Vec<Insight>> {
    let rows = provider.performance_alert_candidates(filter).await?;
    log::debug!("performance_alert classifier: {} candidates", rows.len());
    Ok(rows
        .iter()
        .filter_map(|c| classify_performance_alert(c, cfg, generated_at))
        .collect())
}

/// Run the selected classifiers concurrently and merge their output.
pub async fn detect_insights<P: AggregateProvider + ?Sized>(
    provider: &P,
    filter: &AnalysisFilter,
    request: &InsightRequest,
    config: &EngineConfig,
) -> EngineResult<Vec<Insight>> {
    let generated_at = clock::now();

    let zombies = async {
        if request.selects(InsightType::Zombie) {
            zombie_insights(provider, filter, &config.zombie, generated_at).await
        } else {
            Ok(Vec::new())
        }
    };
    let gems = async {
        if request.selects(InsightType::HiddenGem) {
            hidden_gem_insights(provider, filter, &config.hidden_gem, generated_at).await
        } else {
            Ok(Vec::new())
        }
    };
    let alerts = async {
        if request.selects(InsightType::PerformanceAlert) {
            performance_alert_insights(provider, filter, &config.performance_alert, generated_at)
                .await
        } else {
            Ok(Vec::new())
        }
    };

    let (zombies, gems, alerts) = tokio::try_join!(zombies, gems, alerts)?;

    let insights: Vec<Insight> = zombies
        .into_iter()
        .chain(gems)
        .chain(alerts)
        .filter(|i| request.severity.map_or(true, |s| i.severity == s))
        .collect();
    log::debug!("insight detection produced {} insights", insights.len());
    Ok(insights)
}
