//! Canonical, sorted view of a candidate's employment history.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::domain::{ContractId, EmploymentContract, Provenance};
use super::rank::Rank;

/// Mean Gregorian month length, used for every day-to-month conversion.
pub const DAYS_PER_MONTH: f64 = 365.2425 / 12.0;

pub fn days_to_months(days: i64) -> f64 {
    days as f64 / DAYS_PER_MONTH
}

/// Subtract whole years from a date, clamping to the end of shorter months.
pub fn years_before(date: NaiveDate, years: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(years.saturating_mul(12)))
        .unwrap_or(NaiveDate::MIN)
}

/// Input handed to the normalizer contained nothing to score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no employment contracts supplied")]
pub struct NoContractsError;

/// Per-record problem that excluded or degraded a contract without aborting
/// the computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityNote {
    MissingStartDate {
        contract_id: ContractId,
    },
    EndBeforeStart {
        contract_id: ContractId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    StartsAfterReferenceDate {
        contract_id: ContractId,
        start_date: NaiveDate,
    },
    UnknownRank {
        contract_id: ContractId,
        rank_code: String,
    },
}

impl DataQualityNote {
    pub fn describe(&self) -> String {
        match self {
            DataQualityNote::MissingStartDate { contract_id } => {
                format!("contract {contract_id} has no start date and was excluded")
            }
            DataQualityNote::EndBeforeStart {
                contract_id,
                start_date,
                end_date,
            } => format!(
                "contract {contract_id} ends ({end_date}) before it starts ({start_date}) and was rejected"
            ),
            DataQualityNote::StartsAfterReferenceDate {
                contract_id,
                start_date,
            } => format!(
                "contract {contract_id} starts in the future ({start_date}) and was excluded"
            ),
            DataQualityNote::UnknownRank {
                contract_id,
                rank_code,
            } => format!(
                "contract {contract_id} uses unrecognized rank '{rank_code}' and was skipped for rank analysis"
            ),
        }
    }

    pub fn contract_id(&self) -> &ContractId {
        match self {
            DataQualityNote::MissingStartDate { contract_id }
            | DataQualityNote::EndBeforeStart { contract_id, .. }
            | DataQualityNote::StartsAfterReferenceDate { contract_id, .. }
            | DataQualityNote::UnknownRank { contract_id, .. } => contract_id,
        }
    }

    /// True when the note removed the contract from the timeline entirely.
    pub fn excludes_contract(&self) -> bool {
        !matches!(self, DataQualityNote::UnknownRank { .. })
    }
}

/// One scored contract with resolved dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub contract_id: ContractId,
    pub vessel_id: String,
    pub vessel_name: String,
    pub company_id: String,
    pub rank_code: String,
    pub rank: Option<Rank>,
    pub start_date: NaiveDate,
    /// Last day worked, inclusive. Ongoing contracts resolve to the reference date.
    pub end_date: NaiveDate,
    pub ongoing: bool,
    pub provenance: Provenance,
    pub verified: bool,
    pub duration_days: i64,
    pub duration_months: f64,
    pub previous: Option<usize>,
    pub next: Option<usize>,
}

/// Contracts sorted by start date, ties broken by contract id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTimeline {
    pub reference_date: NaiveDate,
    pub entries: Vec<TimelineEntry>,
    pub data_quality: Vec<DataQualityNote>,
    pub supplied: usize,
}

impl NormalizedTimeline {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn excluded(&self) -> usize {
        self.supplied - self.entries.len()
    }

    /// Latest effective end date across the timeline.
    pub fn most_recent_end(&self) -> Option<NaiveDate> {
        self.entries.iter().map(|entry| entry.end_date).max()
    }

    pub fn verified_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.verified).count()
    }
}

/// Build a deterministic timeline from an unordered contract set.
///
/// Records without a start date, with an end before their start, or starting
/// after `reference_date` are dropped and noted. Returns [`NoContractsError`]
/// only when `contracts` is empty; a non-empty set whose records are all
/// excluded yields an empty timeline so callers can report why.
pub fn normalize(
    contracts: &[EmploymentContract],
    reference_date: NaiveDate,
) -> Result<NormalizedTimeline, NoContractsError> {
    if contracts.is_empty() {
        return Err(NoContractsError);
    }

    let mut data_quality = Vec::new();
    let mut entries = Vec::with_capacity(contracts.len());

    for contract in contracts {
        let Some(start_date) = contract.start_date else {
            data_quality.push(DataQualityNote::MissingStartDate {
                contract_id: contract.contract_id.clone(),
            });
            continue;
        };

        if let Some(end_date) = contract.end_date {
            if end_date < start_date {
                warn!(
                    candidate = %contract.candidate_id,
                    contract = %contract.contract_id,
                    %start_date,
                    %end_date,
                    "rejecting contract with end date before start date"
                );
                data_quality.push(DataQualityNote::EndBeforeStart {
                    contract_id: contract.contract_id.clone(),
                    start_date,
                    end_date,
                });
                continue;
            }
        }

        if start_date > reference_date {
            data_quality.push(DataQualityNote::StartsAfterReferenceDate {
                contract_id: contract.contract_id.clone(),
                start_date,
            });
            continue;
        }

        // Scheduled end dates past the reference date are still running.
        let ongoing = contract.end_date.map_or(true, |end| end > reference_date);
        let end_date = contract
            .end_date
            .map_or(reference_date, |end| end.min(reference_date));
        let duration_days = (end_date - start_date).num_days() + 1;

        entries.push(TimelineEntry {
            contract_id: contract.contract_id.clone(),
            vessel_id: contract.vessel_id.clone(),
            vessel_name: contract.vessel_name.clone(),
            company_id: contract.company_id.clone(),
            rank_code: contract.rank_code.clone(),
            rank: Rank::parse(&contract.rank_code),
            start_date,
            end_date,
            ongoing,
            provenance: contract.provenance,
            verified: contract.is_verified(),
            duration_days,
            duration_months: days_to_months(duration_days),
            previous: None,
            next: None,
        });
    }

    entries.sort_by(|left, right| {
        left.start_date
            .cmp(&right.start_date)
            .then_with(|| left.contract_id.cmp(&right.contract_id))
    });

    // Input order is not part of the contract set's identity.
    data_quality.sort_by(|left, right| left.contract_id().cmp(right.contract_id()));

    let count = entries.len();
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.previous = index.checked_sub(1);
        entry.next = (index + 1 < count).then_some(index + 1);
    }

    Ok(NormalizedTimeline {
        reference_date,
        entries,
        data_quality,
        supplied: contracts.len(),
    })
}
