use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::reliability::domain::ContractId;
use crate::reliability::rank::Rank;
use crate::reliability::scoring::ScoringConfig;
use crate::reliability::timeline::{days_to_months, NormalizedTimeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Fell more than the allowed number of levels without a long absence.
    Demotion,
    /// Rose more levels in one step than promotion velocity allows.
    PromotionJump,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankTransition {
    pub from_contract: ContractId,
    pub to_contract: ContractId,
    pub from_rank: Rank,
    pub to_rank: Rank,
    pub level_change: i16,
    /// Months ashore before the later contract started.
    pub absence_months: f64,
    pub kind: TransitionKind,
}

/// Contract left out of rank analysis because its code is not in the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnrankedContract {
    pub contract_id: ContractId,
    pub rank_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankProgressionReport {
    pub transitions_checked: usize,
    pub anomalies: Vec<RankTransition>,
    pub unranked: Vec<UnrankedContract>,
    pub rank_anomaly: bool,
}

/// Walk ranked contracts chronologically and flag implausible moves.
///
/// Absence is measured from the furthest end date reached by any earlier
/// contract, ranked or not, so time spent on an unranked contract still counts
/// as time at sea.
pub fn analyze_rank_progression(
    timeline: &NormalizedTimeline,
    config: &ScoringConfig,
) -> RankProgressionReport {
    let reentry_months = f64::from(config.rank_reentry_gap_years) * 12.0;
    let mut anomalies = Vec::new();
    let mut unranked = Vec::new();
    let mut transitions_checked = 0;
    let mut previous: Option<(&ContractId, Rank)> = None;
    let mut furthest_end: Option<NaiveDate> = None;

    for entry in &timeline.entries {
        let absence_days = furthest_end
            .map(|end| (entry.start_date - end).num_days() - 1)
            .unwrap_or(0)
            .max(0);
        furthest_end = Some(furthest_end.map_or(entry.end_date, |end| entry.end_date.max(end)));

        let Some(rank) = entry.rank else {
            unranked.push(UnrankedContract {
                contract_id: entry.contract_id.clone(),
                rank_code: entry.rank_code.clone(),
            });
            continue;
        };

        if let Some((from_contract, from_rank)) = previous {
            transitions_checked += 1;
            let level_change = i16::from(rank.ordinal()) - i16::from(from_rank.ordinal());
            let absence_months = days_to_months(absence_days);

            let kind = if level_change < -i16::from(config.max_rank_drop)
                && absence_months < reentry_months
            {
                Some(TransitionKind::Demotion)
            } else if level_change > i16::from(config.max_rank_jump) {
                Some(TransitionKind::PromotionJump)
            } else {
                None
            };

            if let Some(kind) = kind {
                anomalies.push(RankTransition {
                    from_contract: from_contract.clone(),
                    to_contract: entry.contract_id.clone(),
                    from_rank,
                    to_rank: rank,
                    level_change,
                    absence_months,
                    kind,
                });
            }
        }

        previous = Some((&entry.contract_id, rank));
    }

    RankProgressionReport {
        transitions_checked,
        rank_anomaly: !anomalies.is_empty(),
        anomalies,
        unranked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reliability::tests::common::{contract_with, date, timeline_of};

    #[test]
    fn steady_promotions_are_plausible() {
        let timeline = timeline_of(vec![
            contract_with("a", date(2018, 1, 1), Some(date(2018, 12, 31)), "acme", "able_seaman"),
            contract_with("b", date(2019, 2, 1), Some(date(2019, 12, 31)), "acme", "bosun"),
            contract_with("c", date(2020, 2, 1), Some(date(2020, 12, 31)), "acme", "3/o"),
            contract_with("d", date(2021, 2, 1), Some(date(2021, 12, 31)), "acme", "2/o"),
        ]);

        let report = analyze_rank_progression(&timeline, &ScoringConfig::default());
        assert_eq!(report.transitions_checked, 3);
        assert!(!report.rank_anomaly);
    }

    #[test]
    fn one_level_step_back_is_tolerated() {
        let timeline = timeline_of(vec![
            contract_with("a", date(2020, 1, 1), Some(date(2020, 12, 31)), "acme", "chief_officer"),
            contract_with("b", date(2021, 2, 1), Some(date(2021, 12, 31)), "acme", "second_officer"),
        ]);

        let report = analyze_rank_progression(&timeline, &ScoringConfig::default());
        assert!(!report.rank_anomaly);
    }

    #[test]
    fn sharp_drop_without_absence_is_anomalous() {
        let timeline = timeline_of(vec![
            contract_with("a", date(2023, 1, 1), Some(date(2023, 12, 31)), "acme", "master"),
            contract_with("b", date(2023, 11, 1), Some(date(2024, 6, 30)), "acme", "deckhand"),
        ]);

        let report = analyze_rank_progression(&timeline, &ScoringConfig::default());
        assert!(report.rank_anomaly);
        let anomaly = &report.anomalies[0];
        assert_eq!(anomaly.kind, TransitionKind::Demotion);
        assert_eq!(anomaly.level_change, -6);
        assert_eq!(anomaly.absence_months, 0.0);
    }

    #[test]
    fn drop_after_multi_year_absence_is_reentry() {
        let timeline = timeline_of(vec![
            contract_with("a", date(2015, 1, 1), Some(date(2015, 12, 31)), "acme", "chief_officer"),
            contract_with("b", date(2019, 1, 1), Some(date(2019, 12, 31)), "acme", "third_officer"),
        ]);

        let report = analyze_rank_progression(&timeline, &ScoringConfig::default());
        assert!(!report.rank_anomaly);
    }

    #[test]
    fn implausible_promotion_velocity_is_anomalous() {
        let timeline = timeline_of(vec![
            contract_with("a", date(2022, 1, 1), Some(date(2022, 6, 30)), "acme", "deckhand"),
            contract_with("b", date(2022, 8, 1), Some(date(2022, 12, 31)), "acme", "second_officer"),
        ]);

        let report = analyze_rank_progression(&timeline, &ScoringConfig::default());
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].kind, TransitionKind::PromotionJump);
        assert_eq!(report.anomalies[0].level_change, 4);
    }

    #[test]
    fn unknown_ranks_are_skipped_and_recorded() {
        let timeline = timeline_of(vec![
            contract_with("a", date(2020, 1, 1), Some(date(2020, 12, 31)), "acme", "master"),
            contract_with("b", date(2021, 1, 1), Some(date(2021, 12, 31)), "acme", "purser"),
            contract_with("c", date(2022, 1, 1), Some(date(2022, 12, 31)), "acme", "master"),
        ]);

        let report = analyze_rank_progression(&timeline, &ScoringConfig::default());
        assert_eq!(report.transitions_checked, 1);
        assert_eq!(report.unranked.len(), 1);
        assert_eq!(report.unranked[0].rank_code, "purser");
        assert!(!report.rank_anomaly);
    }
}
