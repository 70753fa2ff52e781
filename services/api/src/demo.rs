use crate::infra::load_contract_store;
use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use crew_reliability::error::AppError;
use crew_reliability::reliability::{
    years_before, CandidateId, Clock, ContractId, CriOutcome, EmploymentContract,
    InMemoryContractStore, InMemoryTrustProfileStore, Provenance, ScoringConfig, SystemClock,
    TrustProfile, TrustProfileService,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Contract CSV export (contract_id,candidate_id,vessel_id,vessel_name,rank,company_id,start_date,end_date,provenance,verified)
    #[arg(long)]
    pub(crate) contracts: PathBuf,
    /// Score a single candidate instead of every candidate in the export
    #[arg(long)]
    pub(crate) candidate: Option<String>,
    /// Reference date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) reference_date: Option<NaiveDate>,
    /// Print the full profile as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Reference date for the scenarios (YYYY-MM-DD). Defaults to 2024-06-30.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) reference_date: Option<NaiveDate>,
    /// Print each profile as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

/// Clock pinned to noon UTC on a chosen day.
struct FixedClock(DateTime<Utc>);

impl FixedClock {
    fn on(date: NaiveDate) -> Self {
        let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
        Self(DateTime::from_naive_utc_and_offset(noon, Utc))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

type MemoryService = TrustProfileService<InMemoryContractStore, InMemoryTrustProfileStore>;

fn memory_service(store: InMemoryContractStore, clock: Arc<dyn Clock>) -> MemoryService {
    TrustProfileService::with_clock(
        Arc::new(store),
        Arc::new(InMemoryTrustProfileStore::default()),
        ScoringConfig::default(),
        clock,
    )
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        contracts,
        candidate,
        reference_date,
        json,
    } = args;

    let store = load_contract_store(Some(&contracts))?;
    let candidates = match candidate {
        Some(id) => vec![CandidateId(id)],
        None => store.candidates(),
    };
    let clock: Arc<dyn Clock> = match reference_date {
        Some(date) => Arc::new(FixedClock::on(date)),
        None => Arc::new(SystemClock),
    };
    let service = memory_service(store, clock);

    if candidates.is_empty() {
        println!("No contracts found in {}", contracts.display());
        return Ok(());
    }

    for candidate_id in &candidates {
        let outcome = service.recompute(candidate_id)?;
        render_outcome(&outcome, json);
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        reference_date,
        json,
    } = args;
    let reference_date = reference_date
        .or_else(|| NaiveDate::from_ymd_opt(2024, 6, 30))
        .unwrap_or_default();

    println!("Crew Reliability Index demo (reference date {reference_date})");

    let scenarios = demo_scenarios(reference_date);
    let store = InMemoryContractStore::from_contracts(
        scenarios
            .iter()
            .flat_map(|scenario| scenario.contracts.iter().cloned()),
    );
    let service = memory_service(store, Arc::new(FixedClock::on(reference_date)));

    for scenario in &scenarios {
        println!("\n{}", scenario.title);
        let candidate_id = CandidateId(scenario.candidate.to_string());
        let outcome = service.recompute(&candidate_id)?;
        render_outcome(&outcome, json);
    }

    Ok(())
}

pub(crate) fn render_outcome(outcome: &CriOutcome, json: bool) {
    if json {
        match serde_json::to_string_pretty(outcome) {
            Ok(body) => println!("{body}"),
            Err(err) => println!("  Profile payload unavailable: {err}"),
        }
        return;
    }

    match outcome {
        CriOutcome::Scored(profile) => render_profile(profile),
        CriOutcome::Uncomputable(result) => {
            println!(
                "- {}: CRI not computed ({})",
                result.candidate_id,
                result.reason.label()
            );
            for note in &result.data_quality {
                println!("  - {}", note.describe());
            }
        }
    }
}

fn render_profile(profile: &TrustProfile) {
    println!(
        "- {}: CRI {} | confidence {} | {} contract(s) considered, {} excluded",
        profile.candidate_id,
        profile.cri_score,
        profile.confidence_level.label(),
        profile.detail.contracts_considered,
        profile.detail.contracts_excluded
    );
    println!(
        "  Overlaps {} | gap months {:.2} | short-contract ratio {:.0}% | employers (3y) {}",
        profile.overlap_count,
        profile.gap_months_total,
        profile.short_contract_ratio * 100.0,
        profile.distinct_companies_3y
    );
    println!(
        "  Flags: timeline_inconsistency={} rank_anomaly={} frequent_switch={}",
        profile.timeline_inconsistency_flag,
        profile.rank_anomaly_flag,
        profile.frequent_switch_flag
    );
    if !profile.detail.deductions.is_empty() {
        println!("  Deductions:");
        for deduction in &profile.detail.deductions {
            println!(
                "    - {:?}: -{} ({})",
                deduction.signal, deduction.points, deduction.detail
            );
        }
    }
    if profile.risk_notes.is_empty() {
        println!("  Risk notes: none");
    } else {
        println!("  Risk notes:");
        for note in &profile.risk_notes {
            println!("    - {note}");
        }
    }
}

pub(crate) struct DemoScenario {
    pub(crate) title: &'static str,
    pub(crate) candidate: &'static str,
    pub(crate) contracts: Vec<EmploymentContract>,
}

fn demo_contract(
    candidate: &str,
    id: &str,
    rank: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
    provenance: Provenance,
) -> EmploymentContract {
    EmploymentContract {
        contract_id: ContractId(id.to_string()),
        candidate_id: CandidateId(candidate.to_string()),
        vessel_id: format!("IMO-{id}"),
        vessel_name: format!("MV {}", id.to_ascii_uppercase()),
        rank_code: rank.to_string(),
        company_id: "blue-anchor".to_string(),
        start_date: Some(start),
        end_date: end,
        provenance,
        verified: provenance.is_verified(),
    }
}

/// Clean history, overlap with a rank drop, thin stale data, and no data.
pub(crate) fn demo_scenarios(reference_date: NaiveDate) -> Vec<DemoScenario> {
    let day = chrono::Duration::days(1);
    let three_years_ago = years_before(reference_date, 3);
    let two_years_ago = years_before(reference_date, 2);
    let one_year_ago = years_before(reference_date, 1);

    let clean = vec![
        demo_contract(
            "cand-a",
            "a1",
            "second_officer",
            three_years_ago + day,
            Some(two_years_ago),
            Provenance::CompanyVerified,
        ),
        demo_contract(
            "cand-a",
            "a2",
            "second_officer",
            two_years_ago + day,
            Some(one_year_ago),
            Provenance::AisVerified,
        ),
        demo_contract(
            "cand-a",
            "a3",
            "chief_officer",
            one_year_ago + day,
            Some(reference_date),
            Provenance::CompanyVerified,
        ),
    ];

    let overlap_start = years_before(reference_date, 1) - chrono::Duration::days(242);
    let overlapping = vec![
        demo_contract(
            "cand-b",
            "b1",
            "master",
            overlap_start - chrono::Duration::days(304),
            Some(overlap_start + chrono::Duration::days(60)),
            Provenance::CompanyVerified,
        ),
        demo_contract(
            "cand-b",
            "b2",
            "deckhand",
            overlap_start,
            Some(reference_date),
            Provenance::SelfDeclared,
        ),
    ];

    let stale_end = years_before(reference_date, 4);
    let thin = vec![demo_contract(
        "cand-c",
        "c1",
        "able_seaman",
        years_before(stale_end, 1),
        Some(stale_end),
        Provenance::SelfDeclared,
    )];

    vec![
        DemoScenario {
            title: "Scenario A: three verified back-to-back contracts",
            candidate: "cand-a",
            contracts: clean,
        },
        DemoScenario {
            title: "Scenario B: overlapping contracts with a rank drop",
            candidate: "cand-b",
            contracts: overlapping,
        },
        DemoScenario {
            title: "Scenario C: one self-declared contract, four years old",
            candidate: "cand-c",
            contracts: thin,
        },
        DemoScenario {
            title: "Scenario D: no contracts on record",
            candidate: "cand-d",
            contracts: Vec::new(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crew_reliability::reliability::ConfidenceLevel;

    fn outcomes(reference_date: NaiveDate) -> Vec<CriOutcome> {
        let scenarios = demo_scenarios(reference_date);
        let store = InMemoryContractStore::from_contracts(
            scenarios
                .iter()
                .flat_map(|scenario| scenario.contracts.iter().cloned()),
        );
        let service = memory_service(store, Arc::new(FixedClock::on(reference_date)));
        scenarios
            .iter()
            .map(|scenario| {
                service
                    .recompute(&CandidateId(scenario.candidate.to_string()))
                    .expect("in-memory recompute")
            })
            .collect()
    }

    #[test]
    fn demo_scenarios_match_their_descriptions() {
        let reference_date = NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid");
        let outcomes = outcomes(reference_date);

        let clean = outcomes[0].profile().expect("scenario A scores");
        assert_eq!(clean.confidence_level, ConfidenceLevel::High);
        assert!(clean.cri_score >= 85);
        assert!(!clean.timeline_inconsistency_flag);
        assert!(!clean.rank_anomaly_flag);

        let overlapping = outcomes[1].profile().expect("scenario B scores");
        assert!(overlapping.timeline_inconsistency_flag);
        assert!(overlapping.rank_anomaly_flag);
        assert!(overlapping.cri_score < 80);

        let thin = outcomes[2].profile().expect("scenario C scores");
        assert_eq!(thin.confidence_level, ConfidenceLevel::Low);
        assert!(thin.cri_score <= 75);

        assert!(matches!(outcomes[3], CriOutcome::Uncomputable(_)));
    }

    #[test]
    fn demo_scenarios_hold_for_other_reference_dates() {
        let reference_date = NaiveDate::from_ymd_opt(2026, 2, 28).expect("valid");
        let outcomes = outcomes(reference_date);

        assert!(outcomes[0].profile().expect("scores").cri_score >= 85);
        assert!(outcomes[1].profile().expect("scores").rank_anomaly_flag);
        assert!(matches!(outcomes[3], CriOutcome::Uncomputable(_)));
    }

    #[test]
    fn leap_day_reference_keeps_scenario_a_back_to_back() {
        let reference_date = NaiveDate::from_ymd_opt(2024, 2, 29).expect("valid");
        let scenarios = demo_scenarios(reference_date);
        let clean = &scenarios[0].contracts;

        assert_eq!(clean[0].end_date, Some(years_before(reference_date, 2)));
        assert_eq!(clean[1].end_date, NaiveDate::from_ymd_opt(2023, 2, 28));
        let profile = outcomes(reference_date)[0].profile().expect("scores").clone();
        assert_eq!(profile.gap_months_total, 0.0);
        assert!(!profile.timeline_inconsistency_flag);
    }
}
