use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::reliability::domain::{
    CandidateId, ContractId, CriOutcome, EmploymentContract, Provenance,
};
use crate::reliability::memory::{InMemoryContractStore, InMemoryTrustProfileStore};
use crate::reliability::repository::{
    ContractStore, RepositoryError, TrustProfileStore, WriteOutcome,
};
use crate::reliability::scoring::ScoringConfig;
use crate::reliability::service::{Clock, TrustProfileService};
use crate::reliability::timeline::{normalize, NormalizedTimeline};

pub(crate) const CANDIDATE: &str = "cand-001";

pub(crate) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(crate) fn reference_date() -> NaiveDate {
    date(2024, 6, 30)
}

pub(crate) fn reference_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0)
        .single()
        .expect("valid instant")
}

pub(crate) fn candidate() -> CandidateId {
    CandidateId(CANDIDATE.to_string())
}

/// Verified able-seaman contract with a single employer.
pub(crate) fn contract(id: &str, start: NaiveDate, end: Option<NaiveDate>) -> EmploymentContract {
    contract_with(id, start, end, "acme", "able_seaman")
}

pub(crate) fn contract_with(
    id: &str,
    start: NaiveDate,
    end: Option<NaiveDate>,
    company: &str,
    rank: &str,
) -> EmploymentContract {
    EmploymentContract {
        contract_id: ContractId(id.to_string()),
        candidate_id: candidate(),
        vessel_id: format!("IMO-{id}"),
        vessel_name: format!("MV {id}"),
        rank_code: rank.to_string(),
        company_id: company.to_string(),
        start_date: Some(start),
        end_date: end,
        provenance: Provenance::CompanyVerified,
        verified: true,
    }
}

pub(crate) fn self_declared(mut contract: EmploymentContract) -> EmploymentContract {
    contract.provenance = Provenance::SelfDeclared;
    contract.verified = false;
    contract
}

pub(crate) fn timeline_of(contracts: Vec<EmploymentContract>) -> NormalizedTimeline {
    normalize(&contracts, reference_date()).expect("non-empty contract set")
}

/// Three back-to-back verified twelve-month contracts ending on the reference date.
pub(crate) fn clean_history() -> Vec<EmploymentContract> {
    vec![
        contract("c1", date(2021, 7, 1), Some(date(2022, 6, 30))),
        contract("c2", date(2022, 7, 1), Some(date(2023, 6, 30))),
        contract("c3", date(2023, 7, 1), Some(date(2024, 6, 30))),
    ]
}

/// Master through 2023, then a self-declared deckhand contract overlapping it.
pub(crate) fn overlap_and_demotion() -> Vec<EmploymentContract> {
    vec![
        contract_with("k1", date(2023, 1, 1), Some(date(2023, 12, 31)), "acme", "master"),
        self_declared(contract_with(
            "k2",
            date(2023, 11, 1),
            Some(date(2024, 6, 30)),
            "acme",
            "deckhand",
        )),
    ]
}

pub(crate) fn scoring_config() -> ScoringConfig {
    ScoringConfig::default()
}

/// Clock that advances one second per reading.
pub(crate) struct SteppingClock {
    start: DateTime<Utc>,
    ticks: AtomicUsize,
}

impl SteppingClock {
    pub(crate) fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            ticks: AtomicUsize::new(0),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.start + Duration::seconds(tick as i64)
    }
}

pub(crate) fn memory_service(
    contracts: Vec<EmploymentContract>,
) -> (
    Arc<InMemoryContractStore>,
    Arc<InMemoryTrustProfileStore>,
    TrustProfileService<InMemoryContractStore, InMemoryTrustProfileStore>,
) {
    let store = Arc::new(InMemoryContractStore::from_contracts(contracts));
    let profiles = Arc::new(InMemoryTrustProfileStore::default());
    let service = TrustProfileService::with_clock(
        store.clone(),
        profiles.clone(),
        scoring_config(),
        Arc::new(SteppingClock::starting_at(reference_instant())),
    );
    (store, profiles, service)
}

/// Contract store that fails a fixed number of reads before delegating.
pub(crate) struct FlakyContractStore {
    inner: InMemoryContractStore,
    failures_left: Mutex<usize>,
    pub(crate) reads: AtomicUsize,
}

impl FlakyContractStore {
    pub(crate) fn new(contracts: Vec<EmploymentContract>, failures: usize) -> Self {
        Self {
            inner: InMemoryContractStore::from_contracts(contracts),
            failures_left: Mutex::new(failures),
            reads: AtomicUsize::new(0),
        }
    }
}

impl ContractStore for FlakyContractStore {
    fn contracts_for_candidate(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<EmploymentContract>, RepositoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut failures = self.failures_left.lock().expect("flaky store mutex poisoned");
        if *failures > 0 {
            *failures -= 1;
            return Err(RepositoryError::Unavailable(
                "contract store timed out".to_string(),
            ));
        }
        drop(failures);
        self.inner.contracts_for_candidate(candidate_id)
    }
}

/// Profile store that is permanently unreachable.
#[derive(Default)]
pub(crate) struct UnavailableProfileStore;

impl TrustProfileStore for UnavailableProfileStore {
    fn replace(&self, _outcome: CriOutcome) -> Result<WriteOutcome, RepositoryError> {
        Err(RepositoryError::Unavailable("profile store offline".to_string()))
    }

    fn fetch(&self, _candidate_id: &CandidateId) -> Result<Option<CriOutcome>, RepositoryError> {
        Err(RepositoryError::Unavailable("profile store offline".to_string()))
    }

    fn remove(&self, _candidate_id: &CandidateId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("profile store offline".to_string()))
    }
}

/// Profile store whose backend rejects writes permanently.
#[derive(Default)]
pub(crate) struct CorruptProfileStore;

impl TrustProfileStore for CorruptProfileStore {
    fn replace(&self, _outcome: CriOutcome) -> Result<WriteOutcome, RepositoryError> {
        Err(RepositoryError::NotFound)
    }

    fn fetch(&self, _candidate_id: &CandidateId) -> Result<Option<CriOutcome>, RepositoryError> {
        Err(RepositoryError::NotFound)
    }

    fn remove(&self, _candidate_id: &CandidateId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::NotFound)
    }
}

pub(crate) async fn response_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let value = serde_json::from_slice(&bytes).expect("json body");
    (status, value)
}
