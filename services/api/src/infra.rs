use chrono::NaiveDate;
use crew_reliability::error::AppError;
use crew_reliability::reliability::{
    ContractCsvImporter, InMemoryContractStore, InMemoryTrustProfileStore, RecomputeTrigger,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

pub(crate) type TrustProfileApi =
    crew_reliability::reliability::TrustProfileApi<InMemoryContractStore, InMemoryTrustProfileStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) trigger: RecomputeTrigger,
}

/// Build the in-process contract store, seeded from a CSV export when given.
pub(crate) fn load_contract_store(path: Option<&Path>) -> Result<InMemoryContractStore, AppError> {
    let Some(path) = path else {
        return Ok(InMemoryContractStore::default());
    };

    let contracts = ContractCsvImporter::from_path(path)?;
    info!(
        path = %path.display(),
        contracts = contracts.len(),
        "loaded contract export"
    );
    Ok(InMemoryContractStore::from_contracts(contracts))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
