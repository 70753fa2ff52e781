use crate::cli::ServeArgs;
use crate::infra::{load_contract_store, AppState};
use crate::routes::with_trust_profile_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use crew_reliability::config::AppConfig;
use crew_reliability::error::AppError;
use crew_reliability::reliability::{
    InMemoryTrustProfileStore, RecomputeTrigger, TrustProfileApi, TrustProfileService,
};
use crew_reliability::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(workers) = args.workers.take() {
        config.recompute.workers = workers;
    }

    telemetry::init(&config.telemetry)?;

    let store = load_contract_store(args.contracts.as_deref())?;
    let service = Arc::new(TrustProfileService::new(
        Arc::new(store.clone()),
        Arc::new(InMemoryTrustProfileStore::default()),
        config.scoring.clone(),
    ));
    let (trigger, workers) = RecomputeTrigger::spawn(service.clone(), config.recompute.clone());

    // Score everything that was imported so reads succeed straight away.
    for candidate_id in store.candidates() {
        trigger.notify_contracts_changed(candidate_id, "startup import");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        trigger: trigger.clone(),
    };

    let api = Arc::new(TrustProfileApi {
        service,
        trigger: trigger.clone(),
    });
    let app = with_trust_profile_routes(api)
        .layer(Extension(store))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        workers = config.recompute.workers,
        "crew reliability service ready"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    readiness_flag.store(false, Ordering::Release);
    trigger.close();
    workers.join().await;
    let stats = trigger.stats();
    info!(
        completed = stats.completed,
        failed = stats.failed,
        coalesced = stats.coalesced,
        "recompute workers drained"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
