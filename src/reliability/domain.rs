use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::confidence::ConfidenceReport;
use super::scoring::ScoreDeduction;
use super::signals::{ChurnReport, GapReport, OverlapReport, RankProgressionReport};
use super::timeline::DataQualityNote;

/// Identifier wrapper for a seafarer candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

/// Identifier wrapper for a single employment contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContractId(pub String);

impl std::fmt::Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Display for ContractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an employment record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    SelfDeclared,
    AisVerified,
    CompanyVerified,
}

impl Provenance {
    pub const fn label(self) -> &'static str {
        match self {
            Provenance::SelfDeclared => "self_declared",
            Provenance::AisVerified => "ais_verified",
            Provenance::CompanyVerified => "company_verified",
        }
    }

    pub const fn is_verified(self) -> bool {
        matches!(self, Provenance::AisVerified | Provenance::CompanyVerified)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "self_declared" | "self-declared" | "self" => Some(Self::SelfDeclared),
            "ais_verified" | "ais-verified" | "ais" => Some(Self::AisVerified),
            "company_verified" | "company-verified" | "company" => Some(Self::CompanyVerified),
            _ => None,
        }
    }
}

/// Raw employment record as read from the contract store.
///
/// `start_date` is optional because upstream data entry allows it; records
/// without one are excluded from scoring and reported as a data-quality note.
/// A missing `end_date` means the contract is ongoing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmploymentContract {
    pub contract_id: ContractId,
    pub candidate_id: CandidateId,
    pub vessel_id: String,
    pub vessel_name: String,
    pub rank_code: String,
    pub company_id: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub provenance: Provenance,
    pub verified: bool,
}

impl EmploymentContract {
    /// A record counts as verified when its provenance is a verified source or
    /// an operator has marked it verified.
    pub fn is_verified(&self) -> bool {
        self.provenance.is_verified() || self.verified
    }
}

/// Qualitative weight attached to a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub const fn label(self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
        }
    }
}

/// Latest known trust state for a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustProfile {
    pub candidate_id: CandidateId,
    pub cri_score: u8,
    pub confidence_level: ConfidenceLevel,
    pub short_contract_ratio: f64,
    pub overlap_count: u32,
    pub gap_months_total: f64,
    pub distinct_companies_3y: u32,
    pub rank_anomaly_flag: bool,
    pub frequent_switch_flag: bool,
    pub timeline_inconsistency_flag: bool,
    pub risk_notes: Vec<String>,
    pub detail: TrustProfileDetail,
    pub computed_at: DateTime<Utc>,
}

/// Machine-readable breakdown behind a [`TrustProfile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustProfileDetail {
    pub reference_date: NaiveDate,
    pub rank_vocabulary_version: u16,
    pub contracts_considered: usize,
    pub contracts_excluded: usize,
    pub overlaps: OverlapReport,
    pub gaps: GapReport,
    pub churn: ChurnReport,
    pub rank_progression: RankProgressionReport,
    pub confidence: ConfidenceReport,
    pub deductions: Vec<ScoreDeduction>,
    pub low_confidence_cap_applied: bool,
    pub data_quality: Vec<DataQualityNote>,
}

/// Why a candidate has no CRI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncomputableReason {
    NoContracts,
    NoUsableContracts,
}

impl UncomputableReason {
    pub const fn label(self) -> &'static str {
        match self {
            UncomputableReason::NoContracts => "no contracts on record",
            UncomputableReason::NoUsableContracts => "no contracts with usable dates",
        }
    }
}

/// Explicit "no CRI available" result, distinct from a score of zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncomputableProfile {
    pub candidate_id: CandidateId,
    pub reason: UncomputableReason,
    pub data_quality: Vec<DataQualityNote>,
    pub computed_at: DateTime<Utc>,
}

/// Result of one pass of the engine over a candidate's contract set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CriOutcome {
    Scored(TrustProfile),
    Uncomputable(UncomputableProfile),
}

impl CriOutcome {
    pub fn candidate_id(&self) -> &CandidateId {
        match self {
            CriOutcome::Scored(profile) => &profile.candidate_id,
            CriOutcome::Uncomputable(result) => &result.candidate_id,
        }
    }

    pub fn computed_at(&self) -> DateTime<Utc> {
        match self {
            CriOutcome::Scored(profile) => profile.computed_at,
            CriOutcome::Uncomputable(result) => result.computed_at,
        }
    }

    pub fn profile(&self) -> Option<&TrustProfile> {
        match self {
            CriOutcome::Scored(profile) => Some(profile),
            CriOutcome::Uncomputable(_) => None,
        }
    }

    pub fn into_profile(self) -> Option<TrustProfile> {
        match self {
            CriOutcome::Scored(profile) => Some(profile),
            CriOutcome::Uncomputable(_) => None,
        }
    }
}

/// Answer to a read of the current trust state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProfileLookup {
    Available(TrustProfile),
    NotComputed {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<UncomputableReason>,
    },
}
