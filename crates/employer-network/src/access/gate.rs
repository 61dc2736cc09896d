use std::sync::Arc;

use axum::http::{header, HeaderMap};
use tracing::{debug, error};

use crate::error::ServiceError;
use crate::workflows::accounts::{IdentityError, IdentityProvider, ProfileStore, UserId};

use super::Role;

/// Caller of a staff operation, resolved for the current request only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl Actor {
    #[cfg(test)]
    pub(crate) fn new(id: impl Into<String>, role: Role) -> Self {
        let id = UserId(id.into());
        Self {
            email: format!("{}@staff.local", id.0),
            id,
            role,
        }
    }

    /// Rejects the request as `Forbidden` unless `capability` holds for the actor's role.
    pub fn ensure(&self, capability: fn(Role) -> bool, action: &str) -> Result<(), ServiceError> {
        if capability(self.role) {
            Ok(())
        } else {
            debug!(actor = %self.id, role = %self.role, action, "capability check failed");
            Err(ServiceError::Forbidden)
        }
    }
}

/// Resolves bearer tokens into actors, reading the role from the profile store every time.
pub struct Gatekeeper<I, P> {
    identity: Arc<I>,
    profiles: Arc<P>,
}

impl<I, P> Gatekeeper<I, P>
where
    I: IdentityProvider + 'static,
    P: ProfileStore + 'static,
{
    pub fn new(identity: Arc<I>, profiles: Arc<P>) -> Self {
        Self { identity, profiles }
    }

    /// Identity only; no profile lookup.
    pub fn authenticate(&self, access_token: Option<&str>) -> Result<UserId, ServiceError> {
        let token = access_token.ok_or(ServiceError::Unauthorized)?;
        self.identity.authenticate(token).map_err(|err| match err {
            IdentityError::Unavailable(detail) => {
                error!(%detail, "identity provider failed during authentication");
                ServiceError::upstream("Authentication service unavailable")
            }
            _ => ServiceError::Unauthorized,
        })
    }

    pub fn resolve(&self, access_token: Option<&str>) -> Result<Actor, ServiceError> {
        let id = self.authenticate(access_token)?;
        let profile = self.profiles.fetch(&id).map_err(|err| {
            error!(user = %id, error = %err, "profile lookup failed");
            ServiceError::upstream("Could not load your profile")
        })?;

        match profile {
            Some(profile) => Ok(Actor {
                id: profile.id,
                email: profile.email,
                role: profile.role,
            }),
            None => {
                debug!(user = %id, "authenticated identity has no profile");
                Err(ServiceError::Forbidden)
            }
        }
    }
}

impl<I, P> Clone for Gatekeeper<I, P> {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity.clone(),
            profiles: self.profiles.clone(),
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
