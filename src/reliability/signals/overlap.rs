use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::reliability::domain::ContractId;
use crate::reliability::scoring::ScoringConfig;
use crate::reliability::timeline::NormalizedTimeline;

/// Two contracts whose intervals overlap beyond the handover grace window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapPair {
    pub earlier: ContractId,
    pub later: ContractId,
    pub overlap_start: NaiveDate,
    pub overlap_end: NaiveDate,
    pub overlap_days: i64,
    /// Days by which the later start precedes the grace window before the
    /// running end date.
    pub excess_days: i64,
    pub severe: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapReport {
    pub grace_days: i64,
    pub overlaps: Vec<OverlapPair>,
    /// Overlaps short enough to pass as port handovers.
    pub tolerated_handovers: u32,
    /// Two or more overlaps starting within the cluster window.
    pub clustered: bool,
    pub timeline_inconsistency: bool,
}

impl OverlapReport {
    pub fn count(&self) -> u32 {
        self.overlaps.len() as u32
    }

    pub fn severe_count(&self) -> usize {
        self.overlaps.iter().filter(|pair| pair.severe).count()
    }

    pub fn longest(&self) -> Option<&OverlapPair> {
        self.overlaps.iter().max_by(|left, right| {
            left.overlap_days
                .cmp(&right.overlap_days)
                .then_with(|| right.overlap_start.cmp(&left.overlap_start))
        })
    }
}

/// Sorted-interval sweep against the furthest end date seen so far.
///
/// Each contract is compared with the contract holding the running maximum
/// end date, so a fully duplicated interval counts once rather than once per
/// direction.
pub fn detect_overlaps(timeline: &NormalizedTimeline, config: &ScoringConfig) -> OverlapReport {
    let grace_days = config.overlap_grace_days;
    let mut overlaps = Vec::new();
    let mut tolerated_handovers = 0;
    let mut reach: Option<usize> = None;

    for (index, entry) in timeline.entries.iter().enumerate() {
        let Some(holder_index) = reach else {
            reach = Some(index);
            continue;
        };
        let holder = &timeline.entries[holder_index];

        if entry.start_date <= holder.end_date {
            let overlap_end = entry.end_date.min(holder.end_date);
            let overlap_days = (overlap_end - entry.start_date).num_days() + 1;
            // Grace only covers a handover at the tail of the running interval,
            // so a contract nested inside another is measured to the holder's end.
            let tail_days = (holder.end_date - entry.start_date).num_days() + 1;

            if tail_days > grace_days {
                let excess_days = tail_days - grace_days;
                overlaps.push(OverlapPair {
                    earlier: holder.contract_id.clone(),
                    later: entry.contract_id.clone(),
                    overlap_start: entry.start_date,
                    overlap_end,
                    overlap_days,
                    excess_days,
                    severe: excess_days > config.severe_overlap_excess_days,
                });
            } else {
                tolerated_handovers += 1;
            }
        }

        if entry.end_date > holder.end_date {
            reach = Some(index);
        }
    }

    let clustered = overlaps.windows(2).any(|pair| {
        pair[0]
            .overlap_start
            .checked_add_months(Months::new(config.overlap_cluster_window_months))
            .map_or(false, |window_end| pair[1].overlap_start < window_end)
    });

    // Any overlap past the grace window is an inconsistency; clustering and
    // severity only escalate the risk notes.
    let timeline_inconsistency = !overlaps.is_empty();

    OverlapReport {
        grace_days,
        overlaps,
        tolerated_handovers,
        clustered,
        timeline_inconsistency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reliability::tests::common::{contract, date, timeline_of};

    #[test]
    fn sequential_contracts_do_not_overlap() {
        let timeline = timeline_of(vec![
            contract("a", date(2022, 1, 1), Some(date(2022, 6, 30))),
            contract("b", date(2022, 7, 1), Some(date(2022, 12, 31))),
        ]);

        let report = detect_overlaps(&timeline, &ScoringConfig::default());
        assert_eq!(report.count(), 0);
        assert_eq!(report.tolerated_handovers, 0);
        assert!(!report.timeline_inconsistency);
    }

    #[test]
    fn overlap_at_grace_boundary_is_tolerated() {
        // 2022-03-18..=2022-03-31 is exactly 14 days.
        let timeline = timeline_of(vec![
            contract("a", date(2022, 1, 1), Some(date(2022, 3, 31))),
            contract("b", date(2022, 3, 18), Some(date(2022, 9, 30))),
        ]);

        let report = detect_overlaps(&timeline, &ScoringConfig::default());
        assert_eq!(report.count(), 0);
        assert_eq!(report.tolerated_handovers, 1);
        assert!(!report.timeline_inconsistency);
    }

    #[test]
    fn overlap_one_day_past_grace_is_flagged() {
        let timeline = timeline_of(vec![
            contract("a", date(2022, 1, 1), Some(date(2022, 3, 31))),
            contract("b", date(2022, 3, 17), Some(date(2022, 9, 30))),
        ]);

        let report = detect_overlaps(&timeline, &ScoringConfig::default());
        assert_eq!(report.count(), 1);
        let pair = &report.overlaps[0];
        assert_eq!(pair.overlap_days, 15);
        assert_eq!(pair.excess_days, 1);
        assert!(!pair.severe);
        assert!(report.timeline_inconsistency);
    }

    #[test]
    fn identical_intervals_count_once() {
        let timeline = timeline_of(vec![
            contract("a", date(2022, 1, 1), Some(date(2022, 6, 30))),
            contract("b", date(2022, 1, 1), Some(date(2022, 6, 30))),
        ]);

        let report = detect_overlaps(&timeline, &ScoringConfig::default());
        assert_eq!(report.count(), 1);
        assert_eq!(report.overlaps[0].earlier, ContractId("a".to_string()));
        assert_eq!(report.overlaps[0].later, ContractId("b".to_string()));
        assert!(report.overlaps[0].severe);
    }

    #[test]
    fn contract_nested_inside_another_is_flagged() {
        // "b" is only ten days long but starts seven months before "a" ends.
        let timeline = timeline_of(vec![
            contract("a", date(2023, 1, 1), Some(date(2023, 12, 31))),
            contract("b", date(2023, 6, 1), Some(date(2023, 6, 10))),
            contract("c", date(2024, 1, 1), Some(date(2024, 6, 30))),
        ]);

        let report = detect_overlaps(&timeline, &ScoringConfig::default());
        assert_eq!(report.count(), 1);
        assert_eq!(report.tolerated_handovers, 0);
        assert!(report.timeline_inconsistency);

        let pair = &report.overlaps[0];
        assert_eq!(pair.earlier, ContractId("a".to_string()));
        assert_eq!(pair.later, ContractId("b".to_string()));
        assert_eq!(pair.overlap_end, date(2023, 6, 10));
        assert_eq!(pair.overlap_days, 10);
        assert_eq!(pair.excess_days, 214 - 14);
        assert!(pair.severe);
    }

    #[test]
    fn short_nested_contract_near_the_end_is_a_handover() {
        let timeline = timeline_of(vec![
            contract("a", date(2023, 1, 1), Some(date(2023, 12, 31))),
            contract("b", date(2023, 12, 20), Some(date(2023, 12, 25))),
        ]);

        let report = detect_overlaps(&timeline, &ScoringConfig::default());
        assert_eq!(report.count(), 0);
        assert_eq!(report.tolerated_handovers, 1);
    }

    #[test]
    fn compares_against_longest_running_contract() {
        // "a" spans the whole year, so "c" overlaps it even though "b" ended.
        let timeline = timeline_of(vec![
            contract("a", date(2022, 1, 1), Some(date(2022, 12, 31))),
            contract("b", date(2022, 2, 1), Some(date(2022, 3, 1))),
            contract("c", date(2022, 6, 1), Some(date(2023, 3, 1))),
        ]);

        let report = detect_overlaps(&timeline, &ScoringConfig::default());
        assert_eq!(report.count(), 2);
        assert_eq!(report.overlaps[1].earlier, ContractId("a".to_string()));
        assert_eq!(report.overlaps[1].overlap_end, date(2022, 12, 31));
        assert!(report.clustered);
    }

    #[test]
    fn distant_overlaps_are_not_clustered() {
        let timeline = timeline_of(vec![
            contract("a", date(2019, 1, 1), Some(date(2019, 6, 30))),
            contract("b", date(2019, 6, 1), Some(date(2019, 12, 31))),
            contract("c", date(2022, 1, 1), Some(date(2022, 6, 30))),
            contract("d", date(2022, 6, 1), Some(date(2022, 12, 31))),
        ]);

        let report = detect_overlaps(&timeline, &ScoringConfig::default());
        assert_eq!(report.count(), 2);
        assert!(!report.clustered);
        assert_eq!(report.longest().map(|pair| pair.overlap_days), Some(30));
    }
}
