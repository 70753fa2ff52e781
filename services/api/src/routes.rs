use crate::infra::{deserialize_optional_date, AppState, TrustProfileApi};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use crew_reliability::error::AppError;
use crew_reliability::reliability::{
    trust_profile_router, CandidateId, ContractCsvImporter, CriOutcome, EmploymentContract,
    InMemoryContractStore,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use std::io::Cursor;
use std::sync::Arc;

/// Ad-hoc scoring of a contract set that is not stored anywhere.
#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    pub(crate) candidate_id: String,
    #[serde(default)]
    pub(crate) contracts: Vec<EmploymentContract>,
    #[serde(default)]
    pub(crate) contracts_csv: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) reference_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImportResponse {
    pub(crate) contracts: usize,
    pub(crate) candidates_queued: Vec<CandidateId>,
}

pub(crate) fn with_trust_profile_routes(api: Arc<TrustProfileApi>) -> axum::Router {
    trust_profile_router(api.clone())
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/recompute/stats",
            axum::routing::get(recompute_stats_endpoint),
        )
        .route("/api/v1/cri/score", axum::routing::post(score_endpoint))
        .route(
            "/api/v1/contracts/import",
            axum::routing::post(import_endpoint),
        )
        .layer(Extension(api))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn recompute_stats_endpoint(
    Extension(state): Extension<AppState>,
) -> impl IntoResponse {
    Json(state.trigger.stats())
}

pub(crate) async fn score_endpoint(
    Extension(api): Extension<Arc<TrustProfileApi>>,
    Json(payload): Json<ScoreRequest>,
) -> Result<Json<CriOutcome>, AppError> {
    let ScoreRequest {
        candidate_id,
        mut contracts,
        contracts_csv,
        reference_date,
    } = payload;

    if let Some(csv) = contracts_csv {
        contracts.extend(ContractCsvImporter::from_reader(Cursor::new(csv.into_bytes()))?);
    }
    let candidate_id = CandidateId(candidate_id);
    contracts.retain(|contract| contract.candidate_id == candidate_id);

    let computed_at = Utc::now();
    let reference_date = reference_date.unwrap_or_else(|| computed_at.date_naive());
    let outcome = api.service.engine().evaluate(
        &candidate_id,
        &contracts,
        reference_date,
        computed_at,
    );

    Ok(Json(outcome))
}

/// Upsert contracts from a CSV body and queue a recompute per touched candidate.
pub(crate) async fn import_endpoint(
    Extension(api): Extension<Arc<TrustProfileApi>>,
    Extension(store): Extension<InMemoryContractStore>,
    body: String,
) -> Result<(StatusCode, Json<ImportResponse>), AppError> {
    let contracts = ContractCsvImporter::from_reader(Cursor::new(body.into_bytes()))?;
    let count = contracts.len();

    let mut touched = BTreeSet::new();
    for contract in contracts {
        touched.insert(contract.candidate_id.clone());
        store.upsert(contract);
    }
    for candidate_id in &touched {
        api.trigger
            .notify_contracts_changed(candidate_id.clone(), "contract import");
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(ImportResponse {
            contracts: count,
            candidates_queued: touched.into_iter().collect(),
        }),
    ))
}
