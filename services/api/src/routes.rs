use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use employer_network::access::Gatekeeper;
use employer_network::workflows::accounts::{
    account_router, AccountProvisioningService, IdentityProvider, ProfileStore,
};
use employer_network::workflows::employers::{
    employer_router, EmployerDirectoryService, EmployerRepository, Notifier,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn build_router<E, P, N, I>(
    directory: Arc<EmployerDirectoryService<E, P, N>>,
    accounts: Arc<AccountProvisioningService<I, P>>,
    gate: Gatekeeper<I, P>,
) -> axum::Router
where
    E: EmployerRepository + 'static,
    P: ProfileStore + 'static,
    N: Notifier + 'static,
    I: IdentityProvider + 'static,
{
    employer_router(directory, gate.clone())
        .merge(account_router(accounts, gate))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
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
