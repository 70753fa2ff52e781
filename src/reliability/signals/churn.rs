use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::reliability::domain::ContractId;
use crate::reliability::scoring::ScoringConfig;
use crate::reliability::timeline::{years_before, NormalizedTimeline};

/// Which frequent-switch rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchTrigger {
    ShortContractRatio,
    DistinctCompanies,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChurnReport {
    pub short_threshold_months: f64,
    pub qualifying_contracts: usize,
    pub short_contracts: Vec<ContractId>,
    pub short_contract_ratio: f64,
    pub company_window_start: NaiveDate,
    pub distinct_companies: Vec<String>,
    pub distinct_company_count: u32,
    pub triggers: Vec<SwitchTrigger>,
    pub frequent_switch: bool,
}

/// Short-contract ratio and employer turnover.
///
/// Ongoing contracts are never classified as short; they have not finished
/// yet. Companies count toward the trailing window when any part of the
/// contract falls inside it.
pub fn analyze_churn(timeline: &NormalizedTimeline, config: &ScoringConfig) -> ChurnReport {
    let qualifying_contracts = timeline.len();
    let short_contracts: Vec<ContractId> = timeline
        .entries
        .iter()
        .filter(|entry| {
            !entry.ongoing && entry.duration_months < config.short_contract_threshold_months
        })
        .map(|entry| entry.contract_id.clone())
        .collect();

    let short_contract_ratio = if qualifying_contracts == 0 {
        0.0
    } else {
        short_contracts.len() as f64 / qualifying_contracts as f64
    };

    let company_window_start = years_before(timeline.reference_date, config.company_window_years);
    let companies: BTreeSet<String> = timeline
        .entries
        .iter()
        .filter(|entry| entry.end_date >= company_window_start)
        .map(|entry| entry.company_id.trim().to_ascii_lowercase())
        .filter(|company| !company.is_empty())
        .collect();
    let distinct_company_count = companies.len() as u32;

    let mut triggers = Vec::new();
    if qualifying_contracts >= config.min_contracts_for_churn
        && short_contract_ratio > config.short_ratio_cutoff
    {
        triggers.push(SwitchTrigger::ShortContractRatio);
    }
    if distinct_company_count > config.distinct_company_cutoff {
        triggers.push(SwitchTrigger::DistinctCompanies);
    }

    ChurnReport {
        short_threshold_months: config.short_contract_threshold_months,
        qualifying_contracts,
        short_contracts,
        short_contract_ratio,
        company_window_start,
        distinct_companies: companies.into_iter().collect(),
        distinct_company_count,
        frequent_switch: !triggers.is_empty(),
        triggers,
    }
}
