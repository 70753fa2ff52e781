use crate::reliability::confidence::{ConfidenceBasis, ConfidenceReport};
use crate::reliability::domain::ConfidenceLevel;
use crate::reliability::signals::{SignalSet, SwitchTrigger, TransitionKind};
use crate::reliability::timeline::DataQualityNote;

use super::config::ScoringConfig;

/// Human-readable notes, one per triggered rule, always in the order
/// overlaps, gaps, churn, rank, data quality.
pub(crate) fn risk_notes(
    signals: &SignalSet,
    confidence: &ConfidenceReport,
    data_quality: &[DataQualityNote],
    low_confidence_cap_applied: bool,
    config: &ScoringConfig,
) -> Vec<String> {
    let mut notes = Vec::new();

    let overlaps = &signals.overlaps;
    if let Some(longest) = overlaps.longest() {
        notes.push(format!(
            "{} contract overlap(s) beyond the {}-day handover grace window (longest {} days: {} / {})",
            overlaps.count(),
            overlaps.grace_days,
            longest.overlap_days,
            longest.earlier,
            longest.later
        ));
    }
    if overlaps.severe_count() > 0 {
        notes.push(format!(
            "{} overlap(s) exceed the grace window by more than {} days",
            overlaps.severe_count(),
            config.severe_overlap_excess_days
        ));
    }
    if overlaps.clustered {
        notes.push(format!(
            "multiple overlaps within a {}-month span",
            config.overlap_cluster_window_months
        ));
    }

    let gaps = &signals.gaps;
    if gaps.total_gap_days > 0 {
        notes.push(format!(
            "{:.1} months without employment between contracts",
            gaps.total_gap_months
        ));
    }
    if gaps.long_gap_count > 0 {
        let longest = gaps.long_gaps().max_by_key(|gap| gap.days);
        if let Some(gap) = longest {
            notes.push(format!(
                "{} gap(s) longer than {:.0} months (longest {:.1} months, {} to {})",
                gaps.long_gap_count,
                gaps.threshold_months,
                gap.months,
                gap.gap_start,
                gap.gap_end
            ));
        }
    }

    let churn = &signals.churn;
    if churn.short_contract_ratio > config.short_ratio_penalty_threshold {
        notes.push(format!(
            "{} of {} contracts shorter than {:.0} months ({:.0}%)",
            churn.short_contracts.len(),
            churn.qualifying_contracts,
            churn.short_threshold_months,
            churn.short_contract_ratio * 100.0
        ));
    }
    for trigger in &churn.triggers {
        match trigger {
            SwitchTrigger::ShortContractRatio => notes.push(format!(
                "frequent switching: short-contract ratio above {:.0}%",
                config.short_ratio_cutoff * 100.0
            )),
            SwitchTrigger::DistinctCompanies => notes.push(format!(
                "frequent switching: {} employers since {}",
                churn.distinct_company_count, churn.company_window_start
            )),
        }
    }

    for anomaly in &signals.rank_progression.anomalies {
        let label = match anomaly.kind {
            TransitionKind::Demotion => "rank drop",
            TransitionKind::PromotionJump => "rank jump",
        };
        notes.push(format!(
            "{label} of {} level(s) from {} ({}) to {} ({})",
            anomaly.level_change.unsigned_abs(),
            anomaly.from_rank.code(),
            anomaly.from_contract,
            anomaly.to_rank.code(),
            anomaly.to_contract
        ));
    }

    for note in data_quality {
        notes.push(note.describe());
    }
    if confidence.level == ConfidenceLevel::Low {
        let reason = match confidence.basis {
            ConfidenceBasis::StaleHistory => format!(
                "no contract within the last {} years",
                config.stale_history_years
            ),
            _ => format!("{} usable contract(s)", confidence.usable_contracts),
        };
        if low_confidence_cap_applied {
            notes.push(format!(
                "low confidence ({reason}); score capped at {}",
                config.low_confidence_ceiling
            ));
        } else {
            notes.push(format!("low confidence ({reason})"));
        }
    }

    notes
}
