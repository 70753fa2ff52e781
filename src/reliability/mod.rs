//! Crew Reliability Index scoring and trust profile lifecycle.
//!
//! A candidate's employment contracts are normalized into a timeline, reduced
//! to reliability signals, weighed by a confidence estimate, and aggregated
//! into a bounded score with explanatory risk notes. The service and the
//! recompute trigger keep one current profile per candidate.

pub mod confidence;
pub mod domain;
pub mod import;
pub mod memory;
pub mod rank;
pub mod recompute;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod signals;
pub mod timeline;

#[cfg(test)]
mod tests;

pub use confidence::{estimate_confidence, ConfidenceBasis, ConfidenceReport};
pub use domain::{
    CandidateId, ConfidenceLevel, ContractId, CriOutcome, EmploymentContract, ProfileLookup,
    Provenance, TrustProfile, TrustProfileDetail, UncomputableProfile, UncomputableReason,
};
pub use import::{ContractCsvImporter, ContractImportError};
pub use memory::{InMemoryContractStore, InMemoryTrustProfileStore};
pub use rank::{Rank, RANK_VOCABULARY_VERSION};
pub use recompute::{
    BackoffPolicy, RecomputeConfig, RecomputeStats, RecomputeTrigger, RecomputeWorkers,
};
pub use repository::{ContractStore, RepositoryError, TrustProfileStore, WriteOutcome};
pub use router::{trust_profile_router, ContractsChangedRequest, TrustProfileApi};
pub use scoring::{CriEngine, ScoreDeduction, ScoringConfig, SignalKind};
pub use service::{
    BatchEntry, BatchEntryResult, BatchRecomputeReport, Clock, RecomputeError, SystemClock,
    TrustProfileService,
};
pub use signals::{extract_signals, SignalSet};
pub use timeline::{normalize, years_before, DataQualityNote, NormalizedTimeline, TimelineEntry};
