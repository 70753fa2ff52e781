use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{
    CandidateId, CriOutcome, ProfileLookup, TrustProfile, UncomputableReason,
};
use super::repository::{ContractStore, RepositoryError, TrustProfileStore, WriteOutcome};
use super::scoring::{CriEngine, ScoringConfig};

/// Source of computation timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Service composing the contract store, the engine, and the profile writer.
pub struct TrustProfileService<C, S> {
    contracts: Arc<C>,
    profiles: Arc<S>,
    engine: Arc<CriEngine>,
    clock: Arc<dyn Clock>,
}

impl<C, S> TrustProfileService<C, S>
where
    C: ContractStore + 'static,
    S: TrustProfileStore + 'static,
{
    pub fn new(contracts: Arc<C>, profiles: Arc<S>, config: ScoringConfig) -> Self {
        Self::with_clock(contracts, profiles, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        contracts: Arc<C>,
        profiles: Arc<S>,
        config: ScoringConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            contracts,
            profiles,
            engine: Arc::new(CriEngine::new(config)),
            clock,
        }
    }

    pub fn engine(&self) -> &CriEngine {
        &self.engine
    }

    /// Current trust state, or `NotComputed` when no score exists.
    pub fn get_trust_profile(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<ProfileLookup, RepositoryError> {
        let lookup = match self.profiles.fetch(candidate_id)? {
            Some(CriOutcome::Scored(profile)) => ProfileLookup::Available(profile),
            Some(CriOutcome::Uncomputable(result)) => ProfileLookup::NotComputed {
                reason: Some(result.reason),
            },
            None => ProfileLookup::NotComputed { reason: None },
        };
        Ok(lookup)
    }

    /// Load the latest contract set, score it, and persist the outcome.
    ///
    /// The computation timestamp is taken before the contract read, so it
    /// orders results by the data they saw rather than by completion time.
    pub fn recompute(&self, candidate_id: &CandidateId) -> Result<CriOutcome, RecomputeError> {
        let computed_at = self.clock.now();
        let contracts = self.contracts.contracts_for_candidate(candidate_id)?;
        let outcome = self.engine.evaluate(
            candidate_id,
            &contracts,
            computed_at.date_naive(),
            computed_at,
        );

        match self.profiles.replace(outcome.clone())? {
            WriteOutcome::Written => match &outcome {
                CriOutcome::Scored(profile) => info!(
                    candidate = %candidate_id,
                    score = profile.cri_score,
                    confidence = profile.confidence_level.label(),
                    "trust profile recomputed"
                ),
                CriOutcome::Uncomputable(result) => info!(
                    candidate = %candidate_id,
                    reason = result.reason.label(),
                    "trust profile uncomputable"
                ),
            },
            WriteOutcome::Superseded { current } => debug!(
                candidate = %candidate_id,
                %computed_at,
                %current,
                "newer trust profile already stored; discarding result"
            ),
        }

        Ok(outcome)
    }

    /// Synchronous on-demand recompute for callers that need the profile.
    pub fn recompute_trust_profile(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<TrustProfile, RecomputeError> {
        match self.recompute(candidate_id)? {
            CriOutcome::Scored(profile) => Ok(profile),
            CriOutcome::Uncomputable(result) => Err(RecomputeError::NoContracts {
                candidate_id: candidate_id.clone(),
                reason: result.reason,
            }),
        }
    }

    /// Recompute several candidates, isolating each failure.
    pub fn recompute_batch<'a, I>(&self, candidate_ids: I) -> BatchRecomputeReport
    where
        I: IntoIterator<Item = &'a CandidateId>,
    {
        let entries = candidate_ids
            .into_iter()
            .map(|candidate_id| {
                let result = match self.recompute(candidate_id) {
                    Ok(CriOutcome::Scored(profile)) => BatchEntryResult::Scored {
                        cri_score: profile.cri_score,
                    },
                    Ok(CriOutcome::Uncomputable(result)) => BatchEntryResult::Uncomputable {
                        reason: result.reason,
                    },
                    Err(error) => {
                        warn!(candidate = %candidate_id, %error, "batch recompute failed");
                        BatchEntryResult::Failed {
                            error: error.to_string(),
                        }
                    }
                };
                BatchEntry {
                    candidate_id: candidate_id.clone(),
                    result,
                }
            })
            .collect();

        BatchRecomputeReport { entries }
    }

    /// Drop the stored profile when the candidate record is deleted.
    pub fn forget_candidate(&self, candidate_id: &CandidateId) -> Result<bool, RepositoryError> {
        self.profiles.remove(candidate_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRecomputeReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchRecomputeReport {
    pub fn failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.result, BatchEntryResult::Failed { .. }))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    pub candidate_id: CandidateId,
    pub result: BatchEntryResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchEntryResult {
    Scored { cri_score: u8 },
    Uncomputable { reason: UncomputableReason },
    Failed { error: String },
}

/// Error raised while recomputing a trust profile.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecomputeError {
    #[error("CRI could not be computed for {candidate_id}: {}", .reason.label())]
    NoContracts {
        candidate_id: CandidateId,
        reason: UncomputableReason,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("recompute exceeded its {budget_ms} ms budget")]
    TimedOut { budget_ms: u64 },
    #[error("recompute worker failed: {0}")]
    Worker(String),
}

impl RecomputeError {
    /// Failures the trigger retries with backoff.
    pub fn is_transient(&self) -> bool {
        match self {
            RecomputeError::Repository(error) => error.is_transient(),
            RecomputeError::TimedOut { .. } | RecomputeError::Worker(_) => true,
            RecomputeError::NoContracts { .. } => false,
        }
    }
}
