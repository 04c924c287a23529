//! Shared primitive types and enumerations used across the engine.
//!
//! Every enum here serializes to the exact label downstream consumers
//! see, and parses from that same label.

use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO-3166 alpha-2 country code, e.g. "BR".
pub type CountryCode = String;

/// Stable payment method code, e.g. "PIX".
pub type PaymentMethodCode = String;

// ── Insights ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low    => "LOW",
            Self::Medium => "MEDIUM",
            Self::High   => "HIGH",
        }
    }

    /// Parse a caller-supplied severity. Empty or unknown input is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW"    => Some(Self::Low),
            "MEDIUM" => Some(Self::Medium),
            "HIGH"   => Some(Self::High),
            _        => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier categories. Declaration order is the merge order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    Zombie,
    HiddenGem,
    PerformanceAlert,
}

impl InsightType {
    pub const ALL: [InsightType; 3] = [Self::Zombie, Self::HiddenGem, Self::PerformanceAlert];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zombie           => "zombie",
            Self::HiddenGem        => "hidden_gem",
            Self::PerformanceAlert => "performance_alert",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zombie"            => Some(Self::Zombie),
            "hidden_gem"        => Some(Self::HiddenGem),
            "performance_alert" => Some(Self::PerformanceAlert),
            _                   => None,
        }
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Metrics ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityStatus {
    Active,
    LowActivity,
    Inactive,
}

// ── ROI ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Unprofitable,
    Marginal,
    Profitable,
    HighlyProfitable,
}

// ── Trends ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
    #[default]
    TpvUsd,
    TransactionCount,
    ApprovalRate,
    AvgTransactionValue,
}

impl TrendMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TpvUsd              => "tpv_usd",
            Self::TransactionCount    => "transaction_count",
            Self::ApprovalRate        => "approval_rate",
            Self::AvgTransactionValue => "avg_transaction_value",
        }
    }

    /// Unrecognized metric names fall back to `tpv_usd`.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "tpv_usd"               => Self::TpvUsd,
            "transaction_count"     => Self::TransactionCount,
            "approval_rate"         => Self::ApprovalRate,
            "avg_transaction_value" => Self::AvgTransactionValue,
            other => {
                if !other.is_empty() {
                    log::warn!("Unknown trend metric '{other}', using tpv_usd");
                }
                Self::TpvUsd
            }
        }
    }
}

/// Bucketing period: week over week or month over month.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrendPeriod {
    Wow,
    #[default]
    Mom,
}

impl TrendPeriod {
    /// Unrecognized periods fall back to `MOM`.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "WOW" => Self::Wow,
            "MOM" => Self::Mom,
            other => {
                if !other.is_empty() {
                    log::warn!("Unknown trend period '{other}', using MOM");
                }
                Self::Mom
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallTrend {
    Growing,
    Declining,
    Volatile,
}
