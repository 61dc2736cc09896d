use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{patch, post},
    Router,
};
use serde_json::json;

use crate::access::{bearer_token, Gatekeeper};
use crate::error::extract_json;
use crate::workflows::accounts::{IdentityProvider, ProfileStore};

use super::domain::{EmployerId, EmployerPatch, EmployerSubmission};
use super::listing::ListingRequest;
use super::repository::{EmployerRepository, Notifier};
use super::service::EmployerDirectoryService;

/// Shared state for the directory endpoints.
pub struct EmployerRoutes<E, P, N, I> {
    pub service: Arc<EmployerDirectoryService<E, P, N>>,
    pub gate: Gatekeeper<I, P>,
}

impl<E, P, N, I> Clone for EmployerRoutes<E, P, N, I> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            gate: self.gate.clone(),
        }
    }
}

/// Router builder for the public sign-up form and the staff directory.
pub fn employer_router<E, P, N, I>(
    service: Arc<EmployerDirectoryService<E, P, N>>,
    gate: Gatekeeper<I, P>,
) -> Router
where
    E: EmployerRepository + 'static,
    P: ProfileStore + 'static,
    N: Notifier + 'static,
    I: IdentityProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/employers",
            post(submit_handler::<E, P, N, I>).get(list_handler::<E, P, N, I>),
        )
        .route(
            "/api/v1/employers/:employer_id",
            patch(update_handler::<E, P, N, I>).delete(delete_handler::<E, P, N, I>),
        )
        .route(
            "/api/v1/employers/:employer_id/geocode",
            post(geocode_handler::<E, P, N, I>),
        )
        .with_state(EmployerRoutes { service, gate })
}

pub(crate) async fn submit_handler<E, P, N, I>(
    State(routes): State<EmployerRoutes<E, P, N, I>>,
    body: Result<axum::Json<EmployerSubmission>, JsonRejection>,
) -> Response
where
    E: EmployerRepository + 'static,
    P: ProfileStore + 'static,
    N: Notifier + 'static,
    I: IdentityProvider + 'static,
{
    match extract_json(body).and_then(|submission| routes.service.submit(submission)) {
        Ok(employer) => {
            let payload = json!({ "ok": true, "id": employer.id });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn list_handler<E, P, N, I>(
    State(routes): State<EmployerRoutes<E, P, N, I>>,
    headers: HeaderMap,
    Query(request): Query<ListingRequest>,
) -> Response
where
    E: EmployerRepository + 'static,
    P: ProfileStore + 'static,
    N: Notifier + 'static,
    I: IdentityProvider + 'static,
{
    let result = routes
        .gate
        .resolve(bearer_token(&headers))
        .and_then(|actor| routes.service.list(&actor, &request));

    match result {
        Ok(listing) => (StatusCode::OK, axum::Json(listing)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn update_handler<E, P, N, I>(
    State(routes): State<EmployerRoutes<E, P, N, I>>,
    headers: HeaderMap,
    Path(employer_id): Path<String>,
    body: Result<axum::Json<EmployerPatch>, JsonRejection>,
) -> Response
where
    E: EmployerRepository + 'static,
    P: ProfileStore + 'static,
    N: Notifier + 'static,
    I: IdentityProvider + 'static,
{
    let id = EmployerId(employer_id);
    let result = routes
        .gate
        .resolve(bearer_token(&headers))
        .and_then(|actor| {
            let patch = extract_json(body)?;
            routes.service.update(&actor, &id, &patch)
        });

    match result {
        Ok(employer) => (StatusCode::OK, axum::Json(employer)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn delete_handler<E, P, N, I>(
    State(routes): State<EmployerRoutes<E, P, N, I>>,
    headers: HeaderMap,
    Path(employer_id): Path<String>,
) -> Response
where
    E: EmployerRepository + 'static,
    P: ProfileStore + 'static,
    N: Notifier + 'static,
    I: IdentityProvider + 'static,
{
    let id = EmployerId(employer_id);
    let result = routes
        .gate
        .resolve(bearer_token(&headers))
        .and_then(|actor| routes.service.delete(&actor, &id));

    match result {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "ok": true }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn geocode_handler<E, P, N, I>(
    State(routes): State<EmployerRoutes<E, P, N, I>>,
    headers: HeaderMap,
    Path(employer_id): Path<String>,
) -> Response
where
    E: EmployerRepository + 'static,
    P: ProfileStore + 'static,
    N: Notifier + 'static,
    I: IdentityProvider + 'static,
{
    let id = EmployerId(employer_id);
    let result = routes
        .gate
        .resolve(bearer_token(&headers))
        .and_then(|actor| routes.service.geocode(&actor, &id));

    match result {
        Ok(coordinates) => {
            let payload = json!({
                "ok": true,
                "latitude": coordinates.latitude,
                "longitude": coordinates.longitude,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
