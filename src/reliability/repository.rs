use chrono::{DateTime, Utc};

use super::domain::{CandidateId, CriOutcome, EmploymentContract};

/// Read access to the host application's contract records.
pub trait ContractStore: Send + Sync {
    /// Full contract set for a candidate. Unknown candidates yield an empty list.
    fn contracts_for_candidate(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<EmploymentContract>, RepositoryError>;
}

/// Storage for the single current trust state per candidate.
///
/// `replace` must be atomic: it installs `outcome` only when no stored
/// outcome carries a later `computed_at`, so a slow, older computation can
/// never overwrite a newer one.
pub trait TrustProfileStore: Send + Sync {
    fn replace(&self, outcome: CriOutcome) -> Result<WriteOutcome, RepositoryError>;
    fn fetch(&self, candidate_id: &CandidateId) -> Result<Option<CriOutcome>, RepositoryError>;
    fn remove(&self, candidate_id: &CandidateId) -> Result<bool, RepositoryError>;
}

/// Result of a last-write-wins replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    Superseded { current: DateTime<Utc> },
}

/// Error enumeration for storage failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Failures worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Unavailable(_))
    }
}
