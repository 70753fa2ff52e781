use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CandidateId, ProfileLookup};
use super::recompute::RecomputeTrigger;
use super::repository::{ContractStore, TrustProfileStore};
use super::service::{RecomputeError, TrustProfileService};

/// Shared state behind the trust profile endpoints.
pub struct TrustProfileApi<C, S> {
    pub service: Arc<TrustProfileService<C, S>>,
    pub trigger: RecomputeTrigger,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContractsChangedRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Router exposing read, on-demand recompute, and change notification.
pub fn trust_profile_router<C, S>(api: Arc<TrustProfileApi<C, S>>) -> Router
where
    C: ContractStore + 'static,
    S: TrustProfileStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/candidates/:candidate_id/trust-profile",
            get(profile_handler::<C, S>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/trust-profile/recompute",
            post(recompute_handler::<C, S>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/contracts-changed",
            post(contracts_changed_handler::<C, S>),
        )
        .with_state(api)
}

pub(crate) async fn profile_handler<C, S>(
    State(api): State<Arc<TrustProfileApi<C, S>>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    C: ContractStore + 'static,
    S: TrustProfileStore + 'static,
{
    let service = api.service.clone();
    let id = CandidateId(candidate_id);
    let lookup = tokio::task::spawn_blocking(move || service.get_trust_profile(&id)).await;

    match lookup {
        Ok(Ok(ProfileLookup::Available(profile))) => {
            (StatusCode::OK, axum::Json(profile)).into_response()
        }
        Ok(Ok(lookup @ ProfileLookup::NotComputed { .. })) => {
            (StatusCode::NOT_FOUND, axum::Json(lookup)).into_response()
        }
        Ok(Err(error)) if error.is_transient() => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
        Ok(Err(error)) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
        Err(join_error) => {
            let payload = json!({ "error": join_error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn recompute_handler<C, S>(
    State(api): State<Arc<TrustProfileApi<C, S>>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    C: ContractStore + 'static,
    S: TrustProfileStore + 'static,
{
    let service = api.service.clone();
    let id = CandidateId(candidate_id);
    let candidate = id.clone();
    // Contract reads are synchronous, so keep them off the async workers.
    let result = tokio::task::spawn_blocking(move || service.recompute_trust_profile(&candidate))
        .await
        .unwrap_or_else(|join_error| Err(RecomputeError::Worker(join_error.to_string())));

    match result {
        Ok(profile) => (StatusCode::OK, axum::Json(profile)).into_response(),
        Err(RecomputeError::NoContracts { reason, .. }) => {
            let payload = json!({
                "candidate_id": id.0,
                "status": "not_computed",
                "reason": reason,
                "error": format!("CRI could not be computed: {}", reason.label()),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(error) if error.is_transient() => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn contracts_changed_handler<C, S>(
    State(api): State<Arc<TrustProfileApi<C, S>>>,
    Path(candidate_id): Path<String>,
    body: Option<axum::Json<ContractsChangedRequest>>,
) -> Response
where
    C: ContractStore + 'static,
    S: TrustProfileStore + 'static,
{
    let reason = body
        .and_then(|axum::Json(request)| request.reason)
        .unwrap_or_else(|| "unspecified".to_string());
    api.trigger
        .notify_contracts_changed(CandidateId(candidate_id.clone()), reason);

    let payload = json!({ "candidate_id": candidate_id, "status": "queued" });
    (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
}
