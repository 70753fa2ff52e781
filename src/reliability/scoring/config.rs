use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Thresholds and weights driving every CRI signal.
///
/// The defaults are calibrated guesses; operators override them through a JSON
/// file (see `AppConfig::load`) once labeled outcome data is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub overlap_grace_days: i64,
    pub severe_overlap_excess_days: i64,
    pub overlap_cluster_window_months: u32,
    pub long_gap_threshold_months: f64,
    pub short_contract_threshold_months: f64,
    pub short_ratio_cutoff: f64,
    pub min_contracts_for_churn: usize,
    pub company_window_years: u32,
    pub distinct_company_cutoff: u32,
    pub max_rank_drop: u8,
    pub max_rank_jump: u8,
    pub rank_reentry_gap_years: u32,
    pub stale_history_years: u32,
    pub high_confidence_min_contracts: usize,
    pub high_confidence_verified_ratio: f64,
    pub high_confidence_recency_years: u32,
    pub baseline_score: u8,
    pub signal_floor: u8,
    pub overlap_penalty_per_overlap: u8,
    pub overlap_penalty_cap: u8,
    pub gap_penalty_per_month: f64,
    pub gap_penalty_cap: u8,
    pub short_ratio_penalty_threshold: f64,
    pub short_ratio_penalty_cap: u8,
    pub rank_anomaly_penalty: u8,
    pub frequent_switch_penalty: u8,
    pub low_confidence_ceiling: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            overlap_grace_days: 14,
            severe_overlap_excess_days: 30,
            overlap_cluster_window_months: 12,
            long_gap_threshold_months: 6.0,
            short_contract_threshold_months: 3.0,
            short_ratio_cutoff: 0.5,
            min_contracts_for_churn: 4,
            company_window_years: 3,
            distinct_company_cutoff: 4,
            max_rank_drop: 1,
            max_rank_jump: 2,
            rank_reentry_gap_years: 2,
            stale_history_years: 3,
            high_confidence_min_contracts: 3,
            high_confidence_verified_ratio: 0.6,
            high_confidence_recency_years: 1,
            baseline_score: 100,
            signal_floor: 20,
            overlap_penalty_per_overlap: 8,
            overlap_penalty_cap: 25,
            gap_penalty_per_month: 2.0,
            gap_penalty_cap: 20,
            short_ratio_penalty_threshold: 0.25,
            short_ratio_penalty_cap: 20,
            rank_anomaly_penalty: 20,
            frequent_switch_penalty: 15,
            low_confidence_ceiling: 75,
        }
    }
}

impl ScoringConfig {
    /// Reject settings that would break the score bounds or floor guarantees.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baseline_score > 100 {
            return Err(ConfigError::InvalidScoring(format!(
                "baseline_score {} exceeds 100",
                self.baseline_score
            )));
        }
        if self.signal_floor >= self.baseline_score {
            return Err(ConfigError::InvalidScoring(format!(
                "signal_floor {} must sit below baseline_score {}",
                self.signal_floor, self.baseline_score
            )));
        }

        let headroom = self.baseline_score - self.signal_floor;
        let caps = [
            ("overlap_penalty_cap", self.overlap_penalty_cap),
            ("gap_penalty_cap", self.gap_penalty_cap),
            ("short_ratio_penalty_cap", self.short_ratio_penalty_cap),
            ("rank_anomaly_penalty", self.rank_anomaly_penalty),
            ("frequent_switch_penalty", self.frequent_switch_penalty),
        ];
        for (name, cap) in caps {
            if cap > headroom {
                return Err(ConfigError::InvalidScoring(format!(
                    "{name} {cap} would push a single signal below the floor {}",
                    self.signal_floor
                )));
            }
        }

        let ratios = [
            ("short_ratio_cutoff", self.short_ratio_cutoff),
            ("short_ratio_penalty_threshold", self.short_ratio_penalty_threshold),
            (
                "high_confidence_verified_ratio",
                self.high_confidence_verified_ratio,
            ),
        ];
        for (name, ratio) in ratios {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(ConfigError::InvalidScoring(format!(
                    "{name} {ratio} must be within [0, 1]"
                )));
            }
        }
        if self.short_ratio_penalty_threshold >= 1.0 {
            return Err(ConfigError::InvalidScoring(
                "short_ratio_penalty_threshold must be below 1".to_string(),
            ));
        }

        if self.overlap_grace_days < 0 || self.severe_overlap_excess_days < 0 {
            return Err(ConfigError::InvalidScoring(
                "overlap windows must be non-negative".to_string(),
            ));
        }
        if self.long_gap_threshold_months < 0.0
            || self.short_contract_threshold_months < 0.0
            || self.gap_penalty_per_month < 0.0
        {
            return Err(ConfigError::InvalidScoring(
                "month thresholds must be non-negative".to_string(),
            ));
        }
        if self.low_confidence_ceiling > 100 {
            return Err(ConfigError::InvalidScoring(format!(
                "low_confidence_ceiling {} exceeds 100",
                self.low_confidence_ceiling
            )));
        }

        Ok(())
    }
}
