use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::reliability::domain::ContractId;
use crate::reliability::scoring::ScoringConfig;
use crate::reliability::timeline::{days_to_months, NormalizedTimeline};

/// Uncovered stretch between two temporally adjacent contracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub after: ContractId,
    pub before: ContractId,
    pub gap_start: NaiveDate,
    pub gap_end: NaiveDate,
    pub days: i64,
    pub months: f64,
    pub long: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapReport {
    pub threshold_months: f64,
    pub total_gap_days: i64,
    pub total_gap_months: f64,
    pub gaps: Vec<Gap>,
    pub long_gap_count: usize,
    /// Time between the latest end date and the reference date.
    pub months_since_last_contract: f64,
}

impl GapReport {
    pub fn long_gaps(&self) -> impl Iterator<Item = &Gap> {
        self.gaps.iter().filter(|gap| gap.long)
    }

    pub fn longest(&self) -> Option<&Gap> {
        self.gaps.iter().max_by(|left, right| {
            left.days
                .cmp(&right.days)
                .then_with(|| right.gap_start.cmp(&left.gap_start))
        })
    }
}

/// Sum the days no contract covers between the first start and the last end.
///
/// The sweep tracks the furthest end date seen so far, so overlapping
/// contracts are merged before any gap is measured and never contribute a
/// negative gap.
pub fn analyze_gaps(timeline: &NormalizedTimeline, config: &ScoringConfig) -> GapReport {
    let mut gaps = Vec::new();
    let mut reach: Option<usize> = None;

    for (index, entry) in timeline.entries.iter().enumerate() {
        let Some(holder_index) = reach else {
            reach = Some(index);
            continue;
        };
        let holder = &timeline.entries[holder_index];

        let days = (entry.start_date - holder.end_date).num_days() - 1;
        if days > 0 {
            let months = days_to_months(days);
            gaps.push(Gap {
                after: holder.contract_id.clone(),
                before: entry.contract_id.clone(),
                gap_start: holder.end_date.succ_opt().unwrap_or(holder.end_date),
                gap_end: entry.start_date.pred_opt().unwrap_or(entry.start_date),
                days,
                months,
                long: months > config.long_gap_threshold_months,
            });
        }

        if entry.end_date > holder.end_date {
            reach = Some(index);
        }
    }

    let total_gap_days: i64 = gaps.iter().map(|gap| gap.days).sum();
    let long_gap_count = gaps.iter().filter(|gap| gap.long).count();
    let months_since_last_contract = timeline
        .most_recent_end()
        .map(|end| days_to_months((timeline.reference_date - end).num_days().max(0)))
        .unwrap_or(0.0);

    GapReport {
        threshold_months: config.long_gap_threshold_months,
        total_gap_days,
        total_gap_months: days_to_months(total_gap_days),
        gaps,
        long_gap_count,
        months_since_last_contract,
    }
}
