//! In-process stores used by the CLI, the demo server, and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::domain::{CandidateId, ContractId, CriOutcome, EmploymentContract};
use super::repository::{ContractStore, RepositoryError, TrustProfileStore, WriteOutcome};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryContractStore {
    contracts: Arc<Mutex<HashMap<CandidateId, Vec<EmploymentContract>>>>,
}

impl InMemoryContractStore {
    pub fn from_contracts<I>(contracts: I) -> Self
    where
        I: IntoIterator<Item = EmploymentContract>,
    {
        let store = Self::default();
        for contract in contracts {
            store.upsert(contract);
        }
        store
    }

    /// Insert a contract, replacing any existing record with the same id.
    pub fn upsert(&self, contract: EmploymentContract) {
        let mut guard = lock(&self.contracts);
        let records = guard.entry(contract.candidate_id.clone()).or_default();
        match records
            .iter_mut()
            .find(|existing| existing.contract_id == contract.contract_id)
        {
            Some(existing) => *existing = contract,
            None => records.push(contract),
        }
    }

    pub fn delete(&self, candidate_id: &CandidateId, contract_id: &ContractId) -> bool {
        let mut guard = lock(&self.contracts);
        let Some(records) = guard.get_mut(candidate_id) else {
            return false;
        };
        let before = records.len();
        records.retain(|record| &record.contract_id != contract_id);
        records.len() != before
    }

    pub fn candidates(&self) -> Vec<CandidateId> {
        let mut ids: Vec<CandidateId> = lock(&self.contracts).keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl ContractStore for InMemoryContractStore {
    fn contracts_for_candidate(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<EmploymentContract>, RepositoryError> {
        Ok(lock(&self.contracts)
            .get(candidate_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryTrustProfileStore {
    outcomes: Arc<Mutex<HashMap<CandidateId, CriOutcome>>>,
}

impl TrustProfileStore for InMemoryTrustProfileStore {
    fn replace(&self, outcome: CriOutcome) -> Result<WriteOutcome, RepositoryError> {
        let mut guard = lock(&self.outcomes);
        if let Some(current) = guard.get(outcome.candidate_id()) {
            if current.computed_at() > outcome.computed_at() {
                return Ok(WriteOutcome::Superseded {
                    current: current.computed_at(),
                });
            }
        }
        guard.insert(outcome.candidate_id().clone(), outcome);
        Ok(WriteOutcome::Written)
    }

    fn fetch(&self, candidate_id: &CandidateId) -> Result<Option<CriOutcome>, RepositoryError> {
        Ok(lock(&self.outcomes).get(candidate_id).cloned())
    }

    fn remove(&self, candidate_id: &CandidateId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.outcomes).remove(candidate_id).is_some())
    }
}
