//! Engine configuration: every tunable threshold the classifiers use.
//!
//! The built-in defaults are the hand-tuned values the operations team
//! reviews against; `EngineConfig::load` lets a deployment override them
//! from `{data_dir}/engine_config.json`. Every section may be omitted from
//! the file, in which case its defaults apply.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ActivityConfig {
    /// Trailing-window transactions needed for ACTIVE.
    pub active_min_txns: i64,
    /// Trailing-window transactions needed for LOW_ACTIVITY.
    pub low_activity_min_txns: i64,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            active_min_txns: 10,
            low_activity_min_txns: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ZombieConfig {
    /// Instruments younger than this (in months) use the absolute floor.
    pub new_instrument_months: i64,
    pub new_instrument_floor: f64,
    /// Lower bound on the baseline for established instruments.
    pub baseline_floor: f64,
    /// Months in the trailing window (h × window_months = expected volume).
    pub window_months: f64,
    /// Share of expected volume below which an instrument is a zombie.
    pub expected_fraction: f64,
    pub high_ratio: f64,
    pub medium_ratio: f64,
}

impl Default for ZombieConfig {
    fn default() -> Self {
        Self {
            new_instrument_months: 3,
            new_instrument_floor: 5.0,
            baseline_floor: 10.0,
            window_months: 3.0,
            expected_fraction: 0.1,
            high_ratio: 0.1,
            medium_ratio: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HiddenGemConfig {
    pub min_approval_rate: f64,
    pub min_revenue_contribution_pct: f64,
    /// Volume share must stay below contribution × this factor.
    pub volume_share_factor: f64,
    pub high_contribution_pct: f64,
    pub medium_contribution_pct: f64,
}

impl Default for HiddenGemConfig {
    fn default() -> Self {
        Self {
            min_approval_rate: 90.0,
            min_revenue_contribution_pct: 2.0,
            volume_share_factor: 0.75,
            high_contribution_pct: 8.0,
            medium_contribution_pct: 4.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerformanceAlertConfig {
    pub min_transactions: i64,
    pub alert_gap_pp: f64,
    pub high_gap_pp: f64,
}

impl Default for PerformanceAlertConfig {
    fn default() -> Self {
        Self {
            min_transactions: 20,
            alert_gap_pp: 10.0,
            high_gap_pp: 15.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoiConfig {
    pub highly_profitable_pct: f64,
    pub profitable_pct: f64,
    pub marginal_pct: f64,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            highly_profitable_pct: 500.0,
            profitable_pct: 100.0,
            marginal_pct: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrendConfig {
    /// |percentage change| below this is FLAT.
    pub flat_band_pct: f64,
    /// Minimum fit quality for a GROWING/DECLINING call.
    pub min_r_squared: f64,
    pub default_periods_back: u32,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            flat_band_pct: 1.0,
            min_r_squared: 0.5,
            default_periods_back: 6,
        }
    }
}

/// Opportunity score coefficients. The estimated-TPV term
/// (share × tpv_scale / tpv_scale × estimated_tpv_weight) is a placeholder
/// for a real TPV estimate; these weights are not calibrated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MarketGapConfig {
    pub share_weight: f64,
    pub essential_bonus: f64,
    pub tpv_scale: f64,
    pub estimated_tpv_weight: f64,
    pub max_score: f64,
}

impl Default for MarketGapConfig {
    fn default() -> Self {
        Self {
            share_weight: 0.5,
            essential_bonus: 30.0,
            tpv_scale: 1000.0,
            estimated_tpv_weight: 0.2,
            max_score: 100.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub activity: ActivityConfig,
    pub zombie: ZombieConfig,
    pub hidden_gem: HiddenGemConfig,
    pub performance_alert: PerformanceAlertConfig,
    pub roi: RoiConfig,
    pub trend: TrendConfig,
    pub market_gap: MarketGapConfig,
}

impl EngineConfig {
    /// Load from the data/ directory.
    /// In tests, use EngineConfig::default().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/engine_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        log::info!("Loaded engine config from {path}");
        Ok(config)
    }
}
