use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use crew_reliability::reliability::{
    CandidateId, Clock, ConfidenceLevel, ContractCsvImporter, CriOutcome, DataQualityNote,
    InMemoryContractStore, InMemoryTrustProfileStore, ProfileLookup, RecomputeConfig,
    RecomputeTrigger, ScoringConfig, TrustProfileService, UncomputableReason,
};
use std::sync::Arc;

const FIXTURE: &[u8] = include_bytes!("fixtures/contracts.csv");

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

fn reference_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 30, 9, 30, 0)
        .single()
        .expect("valid instant")
}

fn fixture_service() -> (
    InMemoryContractStore,
    Arc<TrustProfileService<InMemoryContractStore, InMemoryTrustProfileStore>>,
) {
    let contracts = ContractCsvImporter::from_reader(FIXTURE).expect("fixture imports");
    let store = InMemoryContractStore::from_contracts(contracts);
    let service = Arc::new(TrustProfileService::with_clock(
        Arc::new(store.clone()),
        Arc::new(InMemoryTrustProfileStore::default()),
        ScoringConfig::default(),
        Arc::new(FixedClock(reference_instant())),
    ));
    (store, service)
}

fn id(value: &str) -> CandidateId {
    CandidateId(value.to_string())
}

#[test]
fn fixture_export_scores_every_reference_scenario() {
    let (store, service) = fixture_service();
    assert_eq!(
        store.candidates(),
        vec![id("cand-a"), id("cand-b"), id("cand-c"), id("cand-e")]
    );

    let clean = service
        .recompute_trust_profile(&id("cand-a"))
        .expect("clean history scores");
    assert_eq!(clean.confidence_level, ConfidenceLevel::High);
    assert_eq!(clean.cri_score, 100);
    assert!(!clean.rank_anomaly_flag);

    let overlapping = service
        .recompute_trust_profile(&id("cand-b"))
        .expect("overlap scores");
    assert_eq!(overlapping.cri_score, 72);
    assert!(overlapping.timeline_inconsistency_flag);
    assert!(overlapping.rank_anomaly_flag);

    let thin = service
        .recompute_trust_profile(&id("cand-c"))
        .expect("thin history scores");
    assert_eq!(thin.confidence_level, ConfidenceLevel::Low);
    assert!(thin.cri_score <= 75);

    let churner = service
        .recompute_trust_profile(&id("cand-e"))
        .expect("churn history scores");
    assert!(churner.frequent_switch_flag);
    assert!(churner.cri_score < 60, "score {}", churner.cri_score);
    assert_eq!(churner.detail.contracts_excluded, 1);
    assert!(churner
        .detail
        .data_quality
        .iter()
        .any(|note| matches!(note, DataQualityNote::MissingStartDate { contract_id } if contract_id.0 == "E-6")));
}

#[test]
fn unknown_candidates_are_explicitly_not_computed() {
    let (_, service) = fixture_service();

    let outcome = service.recompute(&id("cand-z")).expect("recompute runs");
    assert!(matches!(
        outcome,
        CriOutcome::Uncomputable(ref result) if result.reason == UncomputableReason::NoContracts
    ));
    assert_eq!(
        service.get_trust_profile(&id("cand-z")).expect("lookup"),
        ProfileLookup::NotComputed {
            reason: Some(UncomputableReason::NoContracts)
        }
    );
}

#[test]
fn profiles_serialize_every_public_field() {
    let (_, service) = fixture_service();
    let profile = service
        .recompute_trust_profile(&id("cand-b"))
        .expect("scores");

    let value = serde_json::to_value(&profile).expect("serializes");
    for field in [
        "candidate_id",
        "cri_score",
        "confidence_level",
        "short_contract_ratio",
        "overlap_count",
        "gap_months_total",
        "distinct_companies_3y",
        "rank_anomaly_flag",
        "frequent_switch_flag",
        "timeline_inconsistency_flag",
        "risk_notes",
        "computed_at",
    ] {
        assert!(value.get(field).is_some(), "missing field {field}");
    }
    assert_eq!(value["confidence_level"], "medium");
}

#[tokio::test]
async fn trigger_recomputes_after_contract_changes() {
    let (store, service) = fixture_service();
    let (trigger, workers) = RecomputeTrigger::spawn(service.clone(), RecomputeConfig::default());

    for candidate_id in store.candidates() {
        trigger.notify_contracts_changed(candidate_id, "initial import");
    }
    trigger.close();
    workers.join().await;

    let stats = trigger.stats();
    assert_eq!(stats.enqueued, 4);
    assert_eq!(stats.completed, 4);
    assert_eq!(stats.failed, 0);

    for candidate in ["cand-a", "cand-b", "cand-c", "cand-e"] {
        assert!(matches!(
            service.get_trust_profile(&id(candidate)).expect("lookup"),
            ProfileLookup::Available(_)
        ));
    }
}

#[test]
fn reference_date_follows_the_computation_timestamp() {
    let (_, service) = fixture_service();
    let profile = service
        .recompute_trust_profile(&id("cand-a"))
        .expect("scores");

    assert_eq!(
        profile.detail.reference_date,
        NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid")
    );
    assert_eq!(profile.computed_at, reference_instant());
}
