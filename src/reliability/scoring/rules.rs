use crate::reliability::signals::SignalSet;

use super::config::ScoringConfig;
use super::{ScoreDeduction, SignalKind};

/// Bounded deductions for every triggered signal, in note order.
///
/// Each deduction is clamped so that on its own it cannot take the baseline
/// below `signal_floor`.
pub(crate) fn score_signals(signals: &SignalSet, config: &ScoringConfig) -> Vec<ScoreDeduction> {
    let headroom = config.baseline_score.saturating_sub(config.signal_floor);
    let mut deductions = Vec::new();
    let mut push = |signal: SignalKind, raw: u32, cap: u8, detail: String| {
        let points = raw.min(u32::from(cap)).min(u32::from(headroom)) as u8;
        if points > 0 {
            deductions.push(ScoreDeduction {
                signal,
                points,
                detail,
            });
        }
    };

    let overlap_count = signals.overlaps.count();
    if overlap_count > 0 {
        push(
            SignalKind::Overlap,
            overlap_count.saturating_mul(u32::from(config.overlap_penalty_per_overlap)),
            config.overlap_penalty_cap,
            format!(
                "{overlap_count} overlap(s) x {} points, capped at {}",
                config.overlap_penalty_per_overlap, config.overlap_penalty_cap
            ),
        );
    }

    let gap_months = signals.gaps.total_gap_months;
    if gap_months > 0.0 {
        push(
            SignalKind::Gap,
            (gap_months * config.gap_penalty_per_month).round() as u32,
            config.gap_penalty_cap,
            format!(
                "{gap_months:.1} gap month(s) x {} points, capped at {}",
                config.gap_penalty_per_month, config.gap_penalty_cap
            ),
        );
    }

    let ratio = signals.churn.short_contract_ratio;
    if ratio > config.short_ratio_penalty_threshold {
        let scaled = (ratio - config.short_ratio_penalty_threshold)
            / (1.0 - config.short_ratio_penalty_threshold);
        push(
            SignalKind::ShortContracts,
            (scaled * f64::from(config.short_ratio_penalty_cap)).round() as u32,
            config.short_ratio_penalty_cap,
            format!(
                "short-contract ratio {ratio:.2} above {:.2}, scaled to at most {}",
                config.short_ratio_penalty_threshold, config.short_ratio_penalty_cap
            ),
        );
    }

    if signals.rank_progression.rank_anomaly {
        push(
            SignalKind::RankAnomaly,
            u32::from(config.rank_anomaly_penalty),
            config.rank_anomaly_penalty,
            "flat rank-anomaly penalty".to_string(),
        );
    }

    if signals.churn.frequent_switch {
        push(
            SignalKind::FrequentSwitch,
            u32::from(config.frequent_switch_penalty),
            config.frequent_switch_penalty,
            "flat frequent-switch penalty".to_string(),
        );
    }

    deductions
}
