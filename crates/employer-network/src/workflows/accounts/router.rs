use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use serde_json::json;

use crate::access::{bearer_token, Gatekeeper};
use crate::error::extract_json;

use super::domain::{
    Credentials, InviteRequest, LinkRedemption, PasswordChange, PasswordResetRequest,
    ProfileUpdate, UserId,
};
use super::identity::IdentityProvider;
use super::repository::ProfileStore;
use super::service::AccountProvisioningService;

/// Shared state for the setup, auth and user-management endpoints.
pub struct AccountRoutes<I, P> {
    pub service: Arc<AccountProvisioningService<I, P>>,
    pub gate: Gatekeeper<I, P>,
}

impl<I, P> Clone for AccountRoutes<I, P> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            gate: self.gate.clone(),
        }
    }
}

pub fn account_router<I, P>(
    service: Arc<AccountProvisioningService<I, P>>,
    gate: Gatekeeper<I, P>,
) -> Router
where
    I: IdentityProvider + 'static,
    P: ProfileStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/setup",
            get(setup_status_handler::<I, P>).post(bootstrap_handler::<I, P>),
        )
        .route("/api/v1/auth/login", post(sign_in_handler::<I, P>))
        .route("/api/v1/auth/accept-invite", post(redeem_handler::<I, P>))
        .route("/api/v1/auth/password", post(set_password_handler::<I, P>))
        .route(
            "/api/v1/auth/password-reset",
            post(password_reset_handler::<I, P>),
        )
        .route("/api/v1/users", get(list_users_handler::<I, P>))
        .route("/api/v1/users/invite", post(invite_handler::<I, P>))
        .route(
            "/api/v1/users/:user_id",
            patch(update_user_handler::<I, P>).delete(delete_user_handler::<I, P>),
        )
        .with_state(AccountRoutes { service, gate })
}

pub(crate) async fn setup_status_handler<I, P>(
    State(routes): State<AccountRoutes<I, P>>,
) -> Response
where
    I: IdentityProvider + 'static,
    P: ProfileStore + 'static,
{
    match routes.service.setup_status() {
        Ok(status) => (StatusCode::OK, axum::Json(status)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn bootstrap_handler<I, P>(
    State(routes): State<AccountRoutes<I, P>>,
    body: Result<axum::Json<Credentials>, JsonRejection>,
) -> Response
where
    I: IdentityProvider + 'static,
    P: ProfileStore + 'static,
{
    match extract_json(body).and_then(|credentials| routes.service.bootstrap(&credentials)) {
        Ok(profile) => {
            let payload = json!({ "ok": true, "profile": profile });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn sign_in_handler<I, P>(
    State(routes): State<AccountRoutes<I, P>>,
    body: Result<axum::Json<Credentials>, JsonRejection>,
) -> Response
where
    I: IdentityProvider + 'static,
    P: ProfileStore + 'static,
{
    match extract_json(body).and_then(|credentials| routes.service.sign_in(&credentials)) {
        Ok(session) => (StatusCode::OK, axum::Json(session)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn redeem_handler<I, P>(
    State(routes): State<AccountRoutes<I, P>>,
    body: Result<axum::Json<LinkRedemption>, JsonRejection>,
) -> Response
where
    I: IdentityProvider + 'static,
    P: ProfileStore + 'static,
{
    match extract_json(body).and_then(|redemption| routes.service.redeem_link(&redemption)) {
        Ok(redeemed) => (StatusCode::OK, axum::Json(redeemed)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn set_password_handler<I, P>(
    State(routes): State<AccountRoutes<I, P>>,
    headers: HeaderMap,
    body: Result<axum::Json<PasswordChange>, JsonRejection>,
) -> Response
where
    I: IdentityProvider + 'static,
    P: ProfileStore + 'static,
{
    let result = extract_json(body)
        .and_then(|change| routes.service.set_password(bearer_token(&headers), &change));

    match result {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "ok": true }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn password_reset_handler<I, P>(
    State(routes): State<AccountRoutes<I, P>>,
    body: Result<axum::Json<PasswordResetRequest>, JsonRejection>,
) -> Response
where
    I: IdentityProvider + 'static,
    P: ProfileStore + 'static,
{
    let result = extract_json(body)
        .and_then(|request| routes.service.request_password_reset(&request.email));

    match result {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "ok": true }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn list_users_handler<I, P>(
    State(routes): State<AccountRoutes<I, P>>,
    headers: HeaderMap,
) -> Response
where
    I: IdentityProvider + 'static,
    P: ProfileStore + 'static,
{
    let result = routes
        .gate
        .resolve(bearer_token(&headers))
        .and_then(|actor| routes.service.list_users(&actor));

    match result {
        Ok(users) => (StatusCode::OK, axum::Json(json!({ "users": users }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn invite_handler<I, P>(
    State(routes): State<AccountRoutes<I, P>>,
    headers: HeaderMap,
    body: Result<axum::Json<InviteRequest>, JsonRejection>,
) -> Response
where
    I: IdentityProvider + 'static,
    P: ProfileStore + 'static,
{
    let result = routes
        .gate
        .resolve(bearer_token(&headers))
        .and_then(|actor| {
            let request = extract_json(body)?;
            routes.service.invite(&actor, &request)
        });

    match result {
        Ok(outcome) => {
            let payload = json!({ "ok": true, "profile": outcome.profile });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn update_user_handler<I, P>(
    State(routes): State<AccountRoutes<I, P>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
    body: Result<axum::Json<ProfileUpdate>, JsonRejection>,
) -> Response
where
    I: IdentityProvider + 'static,
    P: ProfileStore + 'static,
{
    let id = UserId(user_id);
    let result = routes
        .gate
        .resolve(bearer_token(&headers))
        .and_then(|actor| {
            let update = extract_json(body)?;
            routes.service.update_user(&actor, &id, &update)
        });

    match result {
        Ok(profile) => (StatusCode::OK, axum::Json(profile)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn delete_user_handler<I, P>(
    State(routes): State<AccountRoutes<I, P>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response
where
    I: IdentityProvider + 'static,
    P: ProfileStore + 'static,
{
    let id = UserId(user_id);
    let result = routes
        .gate
        .resolve(bearer_token(&headers))
        .and_then(|actor| routes.service.delete_user(&actor, &id));

    match result {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "ok": true }))).into_response(),
        Err(err) => err.into_response(),
    }
}
