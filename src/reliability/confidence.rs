use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::ConfidenceLevel;
use super::scoring::ScoringConfig;
use super::timeline::{years_before, NormalizedTimeline};

/// Rule that decided the confidence level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBasis {
    TooFewContracts,
    StaleHistory,
    VerifiedRecentHistory,
    Partial,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceReport {
    pub level: ConfidenceLevel,
    pub basis: ConfidenceBasis,
    pub usable_contracts: usize,
    pub verified_contracts: usize,
    pub verified_ratio: f64,
    pub most_recent_end: Option<NaiveDate>,
}

/// Ordered evaluation, first match wins:
/// 1. `low` with fewer than two usable contracts or a stale most-recent end;
/// 2. `high` with enough contracts, enough verified, and recent activity;
/// 3. otherwise `medium`.
pub fn estimate_confidence(timeline: &NormalizedTimeline, config: &ScoringConfig) -> ConfidenceReport {
    let usable_contracts = timeline.len();
    let verified_contracts = timeline.verified_count();
    let verified_ratio = if usable_contracts == 0 {
        0.0
    } else {
        verified_contracts as f64 / usable_contracts as f64
    };
    let most_recent_end = timeline.most_recent_end();

    let stale_cutoff = years_before(timeline.reference_date, config.stale_history_years);
    let recent_cutoff = years_before(
        timeline.reference_date,
        config.high_confidence_recency_years,
    );

    let (level, basis) = if usable_contracts < 2 {
        (ConfidenceLevel::Low, ConfidenceBasis::TooFewContracts)
    } else if most_recent_end.map_or(true, |end| end < stale_cutoff) {
        (ConfidenceLevel::Low, ConfidenceBasis::StaleHistory)
    } else if usable_contracts >= config.high_confidence_min_contracts
        && verified_ratio >= config.high_confidence_verified_ratio
        && most_recent_end.map_or(false, |end| end >= recent_cutoff)
    {
        (ConfidenceLevel::High, ConfidenceBasis::VerifiedRecentHistory)
    } else {
        (ConfidenceLevel::Medium, ConfidenceBasis::Partial)
    };

    ConfidenceReport {
        level,
        basis,
        usable_contracts,
        verified_contracts,
        verified_ratio,
        most_recent_end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reliability::domain::Provenance;
    use crate::reliability::tests::common::{contract, date, self_declared, timeline_of};

    #[test]
    fn single_contract_is_low() {
        let timeline = timeline_of(vec![contract("a", date(2024, 1, 1), None)]);

        let report = estimate_confidence(&timeline, &ScoringConfig::default());
        assert_eq!(report.level, ConfidenceLevel::Low);
        assert_eq!(report.basis, ConfidenceBasis::TooFewContracts);
    }

    #[test]
    fn stale_history_is_low_even_when_verified() {
        let timeline = timeline_of(vec![
            contract("a", date(2018, 1, 1), Some(date(2018, 12, 31))),
            contract("b", date(2019, 1, 1), Some(date(2019, 12, 31))),
            contract("c", date(2020, 1, 1), Some(date(2020, 12, 31))),
        ]);

        let report = estimate_confidence(&timeline, &ScoringConfig::default());
        assert_eq!(report.level, ConfidenceLevel::Low);
        assert_eq!(report.basis, ConfidenceBasis::StaleHistory);
    }

    #[test]
    fn verified_recent_history_is_high() {
        let timeline = timeline_of(vec![
            contract("a", date(2021, 7, 1), Some(date(2022, 6, 30))),
            contract("b", date(2022, 7, 1), Some(date(2023, 6, 30))),
            contract("c", date(2023, 7, 1), Some(date(2024, 6, 30))),
        ]);

        let report = estimate_confidence(&timeline, &ScoringConfig::default());
        assert_eq!(report.level, ConfidenceLevel::High);
        assert_eq!(report.verified_ratio, 1.0);
    }

    #[test]
    fn mostly_self_declared_history_is_medium() {
        let timeline = timeline_of(vec![
            self_declared(contract("a", date(2021, 7, 1), Some(date(2022, 6, 30)))),
            self_declared(contract("b", date(2022, 7, 1), Some(date(2023, 6, 30)))),
            contract("c", date(2023, 7, 1), Some(date(2024, 6, 30))),
        ]);

        let report = estimate_confidence(&timeline, &ScoringConfig::default());
        assert_eq!(report.level, ConfidenceLevel::Medium);
        assert_eq!(report.verified_contracts, 1);
    }

    #[test]
    fn operator_verification_counts_for_self_declared_records() {
        let mut record = self_declared(contract("a", date(2022, 7, 1), Some(date(2023, 6, 30))));
        record.verified = true;
        assert_eq!(record.provenance, Provenance::SelfDeclared);
        assert!(record.is_verified());
    }
}
