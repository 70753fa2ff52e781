//! CSV import of contract history exports.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use tracing::warn;

use super::domain::{CandidateId, ContractId, EmploymentContract, Provenance};

#[derive(Debug, thiserror::Error)]
pub enum ContractImportError {
    #[error("failed to read contract export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid contract CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {field} '{value}' is not a YYYY-MM-DD date")]
    InvalidDate {
        row: usize,
        field: &'static str,
        value: String,
    },
}

pub struct ContractCsvImporter;

impl ContractCsvImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<EmploymentContract>, ContractImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse every row. Blank start dates stay `None` so scoring can report
    /// them; malformed dates reject the whole file.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<EmploymentContract>, ContractImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut contracts = Vec::new();

        for (index, record) in csv_reader.deserialize::<ContractRow>().enumerate() {
            let row = record?;
            contracts.push(row.into_contract(index + 1)?);
        }

        Ok(contracts)
    }
}

#[derive(Debug, Deserialize)]
struct ContractRow {
    contract_id: String,
    candidate_id: String,
    #[serde(default)]
    vessel_id: String,
    #[serde(default)]
    vessel_name: String,
    #[serde(default)]
    rank: String,
    #[serde(default)]
    company_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    start_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    end_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    provenance: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    verified: Option<String>,
}

impl ContractRow {
    fn into_contract(self, row: usize) -> Result<EmploymentContract, ContractImportError> {
        let start_date = parse_date_field(row, "start_date", self.start_date)?;
        let end_date = parse_date_field(row, "end_date", self.end_date)?;

        let provenance = match self.provenance.as_deref() {
            None => Provenance::SelfDeclared,
            Some(raw) => Provenance::parse(raw).unwrap_or_else(|| {
                warn!(row, provenance = raw, "unknown provenance; treating as self_declared");
                Provenance::SelfDeclared
            }),
        };

        Ok(EmploymentContract {
            contract_id: ContractId(self.contract_id),
            candidate_id: CandidateId(self.candidate_id),
            vessel_id: self.vessel_id,
            vessel_name: self.vessel_name,
            rank_code: self.rank,
            company_id: self.company_id,
            start_date,
            end_date,
            provenance,
            verified: self.verified.as_deref().map_or(false, parse_flag),
        })
    }
}

fn parse_date_field(
    row: usize,
    field: &'static str,
    value: Option<String>,
) -> Result<Option<NaiveDate>, ContractImportError> {
    value
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
                ContractImportError::InvalidDate {
                    row,
                    field,
                    value: raw,
                }
            })
        })
        .transpose()
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "contract_id,candidate_id,vessel_id,vessel_name,rank,company_id,start_date,end_date,provenance,verified\n";

    #[test]
    fn parses_rows_with_optional_fields() {
        let csv = format!(
            "{HEADER}k1,cand-7,IMO9321483,MV Aurora,C/O,north-line,2022-01-10,2022-09-30,company_verified,true\n\
             k2,cand-7,IMO9321484,MV Boreal,master,north-line,2023-01-05,,ais,\n\
             k3,cand-7,,,,,,,,\n"
        );

        let contracts = ContractCsvImporter::from_reader(Cursor::new(csv)).expect("parses");
        assert_eq!(contracts.len(), 3);

        assert_eq!(contracts[0].provenance, Provenance::CompanyVerified);
        assert!(contracts[0].verified);
        assert_eq!(
            contracts[0].start_date,
            NaiveDate::from_ymd_opt(2022, 1, 10)
        );

        assert_eq!(contracts[1].end_date, None);
        assert_eq!(contracts[1].provenance, Provenance::AisVerified);
        assert!(!contracts[1].verified);

        assert_eq!(contracts[2].start_date, None);
        assert_eq!(contracts[2].provenance, Provenance::SelfDeclared);
    }

    #[test]
    fn rejects_malformed_dates() {
        let csv = format!("{HEADER}k1,cand-7,,,master,acme,10/01/2022,,,\n");

        match ContractCsvImporter::from_reader(Cursor::new(csv)) {
            Err(ContractImportError::InvalidDate { row, field, value }) => {
                assert_eq!(row, 1);
                assert_eq!(field, "start_date");
                assert_eq!(value, "10/01/2022");
            }
            other => panic!("expected invalid date error, got {other:?}"),
        }
    }
}
