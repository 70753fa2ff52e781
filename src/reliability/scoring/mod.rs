mod config;
mod notes;
mod rules;

pub use config::ScoringConfig;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::confidence::{estimate_confidence, ConfidenceReport};
use super::domain::{
    CandidateId, ConfidenceLevel, CriOutcome, EmploymentContract, TrustProfile,
    TrustProfileDetail, UncomputableProfile, UncomputableReason,
};
use super::rank::RANK_VOCABULARY_VERSION;
use super::signals::{extract_signals, SignalSet};
use super::timeline::{normalize, DataQualityNote, NormalizedTimeline, NoContractsError};

/// Signal category a deduction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Overlap,
    Gap,
    ShortContracts,
    RankAnomaly,
    FrequentSwitch,
}

/// Points removed from the baseline for one signal, kept for audits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDeduction {
    pub signal: SignalKind,
    pub points: u8,
    pub detail: String,
}

/// Stateless engine running normalize, extract, estimate and aggregate.
#[derive(Debug, Clone)]
pub struct CriEngine {
    config: ScoringConfig,
}

impl CriEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a contract set as of `reference_date`.
    ///
    /// Never fails: an empty or fully unusable contract set produces
    /// [`CriOutcome::Uncomputable`].
    pub fn evaluate(
        &self,
        candidate_id: &CandidateId,
        contracts: &[EmploymentContract],
        reference_date: NaiveDate,
        computed_at: DateTime<Utc>,
    ) -> CriOutcome {
        let timeline = match normalize(contracts, reference_date) {
            Ok(timeline) => timeline,
            Err(NoContractsError) => {
                return CriOutcome::Uncomputable(UncomputableProfile {
                    candidate_id: candidate_id.clone(),
                    reason: UncomputableReason::NoContracts,
                    data_quality: Vec::new(),
                    computed_at,
                });
            }
        };

        if timeline.is_empty() {
            return CriOutcome::Uncomputable(UncomputableProfile {
                candidate_id: candidate_id.clone(),
                reason: UncomputableReason::NoUsableContracts,
                data_quality: timeline.data_quality,
                computed_at,
            });
        }

        let signals = extract_signals(&timeline, &self.config);
        let confidence = estimate_confidence(&timeline, &self.config);
        debug!(
            candidate = %candidate_id,
            overlaps = signals.overlaps.count(),
            gap_months = signals.gaps.total_gap_months,
            short_ratio = signals.churn.short_contract_ratio,
            rank_anomalies = signals.rank_progression.anomalies.len(),
            confidence = confidence.level.label(),
            "extracted reliability signals"
        );

        CriOutcome::Scored(aggregate(
            candidate_id,
            &timeline,
            signals,
            confidence,
            &self.config,
            computed_at,
        ))
    }
}

/// Combine signals and confidence into a bounded profile.
pub fn aggregate(
    candidate_id: &CandidateId,
    timeline: &NormalizedTimeline,
    signals: SignalSet,
    confidence: ConfidenceReport,
    config: &ScoringConfig,
    computed_at: DateTime<Utc>,
) -> TrustProfile {
    let deductions = rules::score_signals(&signals, config);
    let deducted: u32 = deductions
        .iter()
        .map(|deduction| u32::from(deduction.points))
        .sum();
    let raw_score = u32::from(config.baseline_score).saturating_sub(deducted).min(100) as u8;

    let low_confidence_cap_applied =
        confidence.level == ConfidenceLevel::Low && raw_score > config.low_confidence_ceiling;
    let cri_score = if confidence.level == ConfidenceLevel::Low {
        raw_score.min(config.low_confidence_ceiling)
    } else {
        raw_score
    };

    let mut data_quality = timeline.data_quality.clone();
    data_quality.extend(signals.rank_progression.unranked.iter().map(|unranked| {
        DataQualityNote::UnknownRank {
            contract_id: unranked.contract_id.clone(),
            rank_code: unranked.rank_code.clone(),
        }
    }));

    let risk_notes = notes::risk_notes(
        &signals,
        &confidence,
        &data_quality,
        low_confidence_cap_applied,
        config,
    );

    TrustProfile {
        candidate_id: candidate_id.clone(),
        cri_score,
        confidence_level: confidence.level,
        short_contract_ratio: signals.churn.short_contract_ratio,
        overlap_count: signals.overlaps.count(),
        gap_months_total: round_hundredths(signals.gaps.total_gap_months),
        distinct_companies_3y: signals.churn.distinct_company_count,
        rank_anomaly_flag: signals.rank_progression.rank_anomaly,
        frequent_switch_flag: signals.churn.frequent_switch,
        timeline_inconsistency_flag: signals.overlaps.timeline_inconsistency,
        risk_notes,
        detail: TrustProfileDetail {
            reference_date: timeline.reference_date,
            rank_vocabulary_version: RANK_VOCABULARY_VERSION,
            contracts_considered: timeline.len(),
            contracts_excluded: timeline.excluded(),
            overlaps: signals.overlaps,
            gaps: signals.gaps,
            churn: signals.churn,
            rank_progression: signals.rank_progression,
            confidence,
            deductions,
            low_confidence_cap_applied,
            data_quality,
        },
        computed_at,
    }
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
