use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::access::{can_manage_users, Actor, Role};
use crate::config::AccountsConfig;
use crate::error::ServiceError;
use crate::workflows::clean_optional;
use crate::workflows::store::RepositoryError;

use super::domain::{
    Credentials, InviteOutcome, InviteRequest, LinkRedemption, PasswordChange, Profile,
    ProfileChanges, ProfileUpdate, RedeemedLink, Session, SetupStatus, UserId,
};
use super::identity::{IdentityError, IdentityProvider};
use super::repository::ProfileStore;

pub const MIN_PASSWORD_LENGTH: usize = 8;

const DEFAULT_LANDING: &str = "/dashboard";
const SETUP_COMPLETED: &str = "Setup already completed. Use the login page.";
const SETUP_PENDING: &str =
    "Setup is already in progress or awaiting repair of a partially created administrator. Contact your system operator.";
const INVALID_LINK: &str =
    "Invalid or expired link. Please use the link from your invite email or request a new one.";
const SESSION_LOST: &str = "Session lost. Please use the link from your email again.";

/// Provisioning flows that span the identity provider and the profile store.
///
/// Each flow validates and authorizes before its first write. A flow that created an identity
/// but could not store the matching profile reports [`ServiceError::PartiallyCompleted`] and
/// leaves the identity in place for an operator to reconcile.
pub struct AccountProvisioningService<I, P> {
    identity: Arc<I>,
    profiles: Arc<P>,
    accounts: AccountsConfig,
}

impl<I, P> AccountProvisioningService<I, P>
where
    I: IdentityProvider + 'static,
    P: ProfileStore + 'static,
{
    pub fn new(identity: Arc<I>, profiles: Arc<P>, accounts: AccountsConfig) -> Self {
        Self {
            identity,
            profiles,
            accounts,
        }
    }

    pub fn setup_status(&self) -> Result<SetupStatus, ServiceError> {
        let count = self.profile_count()?;
        Ok(SetupStatus {
            setup_allowed: count == 0,
        })
    }

    /// First-run creation of the administrator account.
    pub fn bootstrap(&self, credentials: &Credentials) -> Result<Profile, ServiceError> {
        if self.profile_count()? > 0 {
            return Err(ServiceError::bad_request(SETUP_COMPLETED));
        }

        let email = normalize_email(&credentials.email)
            .filter(|_| password_long_enough(&credentials.password))
            .ok_or_else(|| {
                ServiceError::bad_request("Valid email and password (8+ characters) are required.")
            })?;

        self.profiles.claim_bootstrap().map_err(|err| match err {
            RepositoryError::Conflict => {
                warn!("bootstrap claimed but no profile exists yet");
                ServiceError::bad_request(SETUP_PENDING)
            }
            other => {
                error!(error = %other, "bootstrap claim failed");
                ServiceError::upstream("Failed to create account.")
            }
        })?;

        let identity = match self
            .identity
            .create_user(&email, &credentials.password, true)
        {
            Ok(identity) => identity,
            Err(err) => {
                self.release_bootstrap();
                return Err(match err {
                    IdentityError::AlreadyRegistered => ServiceError::conflict(
                        "A user with this email already exists. Use the login page or reset password.",
                    ),
                    other => {
                        error!(error = %other, "bootstrap identity creation failed");
                        ServiceError::upstream("Failed to create account.")
                    }
                });
            }
        };

        let profile = Profile::new(identity.id.clone(), email, None, Role::Admin);
        let stored = self.profiles.insert(profile).map_err(|err| {
            error!(
                identity = %identity.id,
                error = %err,
                "bootstrap identity created without a profile"
            );
            ServiceError::PartiallyCompleted {
                identity_id: identity.id.clone(),
                message: "Account created but profile could not be saved.".to_string(),
            }
        })?;

        info!(user = %stored.id, "administrator account bootstrapped");
        Ok(stored)
    }

    pub fn invite(
        &self,
        actor: &Actor,
        request: &InviteRequest,
    ) -> Result<InviteOutcome, ServiceError> {
        actor.ensure(can_manage_users, "invite user")?;

        let role = request
            .role
            .as_deref()
            .and_then(|raw| raw.trim().parse::<Role>().ok())
            .filter(|role| role.is_invitable());
        let (email, role) = match (normalize_email(&request.email), role) {
            (Some(email), Some(role)) => (email, role),
            _ => {
                return Err(ServiceError::bad_request(
                    "Valid email and role (Director, Supervisor, Employment Specialist, or CRS) are required.",
                ))
            }
        };
        let full_name = clean_optional(request.full_name.as_deref());

        let identity = self
            .identity
            .invite_user(
                &email,
                full_name.as_deref(),
                &self.accounts.password_redirect(),
            )
            .map_err(|err| match err {
                IdentityError::AlreadyRegistered => {
                    ServiceError::conflict("A user with this email already exists.")
                }
                other => {
                    error!(error = %other, "invite dispatch failed");
                    ServiceError::upstream("Failed to send invite.")
                }
            })?;

        let profile = Profile::new(identity.id.clone(), email, full_name, role);
        let stored = self.profiles.insert(profile).map_err(|err| match err {
            RepositoryError::Conflict => {
                warn!(identity = %identity.id, "invited identity already has a profile");
                ServiceError::conflict("A profile for this user already exists.")
            }
            other => {
                error!(
                    identity = %identity.id,
                    error = %other,
                    "invite sent without a profile"
                );
                ServiceError::PartiallyCompleted {
                    identity_id: identity.id.clone(),
                    message: "User invited but profile could not be created.".to_string(),
                }
            }
        })?;

        info!(invited_by = %actor.id, user = %stored.id, role = %role, "user invited");
        Ok(InviteOutcome { profile: stored })
    }

    pub fn sign_in(&self, credentials: &Credentials) -> Result<Session, ServiceError> {
        let email = normalize_email(&credentials.email)
            .filter(|_| !credentials.password.is_empty())
            .ok_or_else(|| ServiceError::bad_request("Email and password are required."))?;

        self.identity
            .sign_in(&email, &credentials.password)
            .map_err(|err| match err {
                IdentityError::Unavailable(detail) => {
                    error!(%detail, "sign-in failed upstream");
                    ServiceError::upstream("Sign-in failed.")
                }
                _ => {
                    debug!("sign-in rejected");
                    ServiceError::Unauthenticated("Invalid email or password.")
                }
            })
    }

    /// Exchange an invite or reset link code for a live session.
    pub fn redeem_link(&self, redemption: &LinkRedemption) -> Result<RedeemedLink, ServiceError> {
        let code = redemption.code.trim();
        if code.is_empty() {
            return Err(ServiceError::Unauthenticated(INVALID_LINK));
        }

        let session = self.identity.exchange_code(code).map_err(|err| match err {
            IdentityError::Unavailable(detail) => {
                error!(%detail, "link exchange failed upstream");
                ServiceError::upstream("Could not verify link.")
            }
            other => {
                debug!(error = %other, "link code rejected");
                ServiceError::Unauthenticated(INVALID_LINK)
            }
        })?;

        Ok(RedeemedLink {
            session,
            next: landing_path(redemption.next.as_deref()),
        })
    }

    /// Second half of accept-invite and reset; needs the session issued by [`Self::redeem_link`].
    pub fn set_password(
        &self,
        access_token: Option<&str>,
        change: &PasswordChange,
    ) -> Result<(), ServiceError> {
        if change.password != change.confirmation {
            return Err(ServiceError::bad_request("Passwords do not match."));
        }
        if !password_long_enough(&change.password) {
            return Err(ServiceError::bad_request(
                "Password must be at least 8 characters.",
            ));
        }
        let token = access_token.ok_or(ServiceError::Unauthenticated(SESSION_LOST))?;

        self.identity
            .update_password(token, &change.password)
            .map_err(|err| match err {
                IdentityError::Unavailable(detail) => {
                    error!(%detail, "password update failed upstream");
                    ServiceError::upstream("Failed to update password.")
                }
                other => {
                    debug!(error = %other, "password update without a live session");
                    ServiceError::Unauthenticated(SESSION_LOST)
                }
            })?;

        info!("password set");
        Ok(())
    }

    /// Sends a reset link. Unknown addresses succeed silently so the endpoint does not reveal
    /// which emails have accounts.
    pub fn request_password_reset(&self, email: &str) -> Result<(), ServiceError> {
        let email = normalize_email(email)
            .ok_or_else(|| ServiceError::bad_request("Valid email is required."))?;

        match self
            .identity
            .send_password_reset(&email, &self.accounts.password_redirect())
        {
            Ok(()) => Ok(()),
            Err(IdentityError::NotFound) => {
                debug!("password reset requested for unknown email");
                Ok(())
            }
            Err(other) => {
                error!(error = %other, "password reset dispatch failed");
                Err(ServiceError::upstream("Could not send reset email."))
            }
        }
    }

    pub fn list_users(&self, actor: &Actor) -> Result<Vec<Profile>, ServiceError> {
        actor.ensure(can_manage_users, "list users")?;
        self.profiles.list().map_err(|err| {
            error!(error = %err, "profile listing failed");
            ServiceError::upstream("Failed to load users")
        })
    }

    pub fn update_user(
        &self,
        actor: &Actor,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, ServiceError> {
        actor.ensure(can_manage_users, "update user")?;

        let role = match update.role.as_deref() {
            None => None,
            Some(raw) => Some(
                raw.trim()
                    .parse::<Role>()
                    .map_err(|_| ServiceError::bad_request("Invalid role"))?,
            ),
        };
        let changes = ProfileChanges {
            full_name: update
                .full_name
                .as_ref()
                .map(|name| clean_optional(name.as_deref())),
            role,
        };
        if changes.is_empty() {
            return Err(ServiceError::bad_request("No valid fields to update"));
        }

        let updated = self
            .profiles
            .update(id, &changes)
            .map_err(|err| match err {
                RepositoryError::NotFound => ServiceError::not_found("User not found"),
                other => {
                    error!(user = %id, error = %other, "profile update failed");
                    ServiceError::upstream("Update failed")
                }
            })?;

        if let Some(role) = changes.role {
            info!(actor = %actor.id, user = %id, %role, "user role set");
        }
        Ok(updated)
    }

    /// Removes the identity first, then its profile, so a profile never outlives its identity.
    pub fn delete_user(&self, actor: &Actor, id: &UserId) -> Result<(), ServiceError> {
        if &actor.id == id {
            return Err(ServiceError::bad_request(
                "You cannot delete your own account.",
            ));
        }
        actor.ensure(can_manage_users, "delete user")?;

        self.identity.delete_user(id).map_err(|err| match err {
            IdentityError::NotFound => ServiceError::not_found("User not found"),
            other => {
                error!(user = %id, error = %other, "identity removal failed");
                ServiceError::upstream("Failed to remove user.")
            }
        })?;

        match self.profiles.delete(id) {
            Ok(()) | Err(RepositoryError::NotFound) => {
                info!(actor = %actor.id, user = %id, "user removed");
                Ok(())
            }
            Err(other) => {
                error!(user = %id, error = %other, "identity removed but profile remains");
                Err(ServiceError::PartiallyCompleted {
                    identity_id: id.clone(),
                    message: "User removed but profile could not be deleted.".to_string(),
                })
            }
        }
    }

    fn profile_count(&self) -> Result<usize, ServiceError> {
        self.profiles.count().map_err(|err| {
            error!(error = %err, "profile count failed");
            ServiceError::upstream("Could not check setup status")
        })
    }

    fn release_bootstrap(&self) {
        if let Err(err) = self.profiles.release_bootstrap() {
            warn!(error = %err, "bootstrap claim could not be released");
        }
    }
}

/// Trimmed, lower-cased address with a non-empty local part and domain.
pub(crate) fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    let plausible = !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace);
    plausible.then_some(email)
}

fn password_long_enough(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

/// Only same-site absolute paths are honored as post-link destinations.
fn landing_path(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => DEFAULT_LANDING.to_string(),
    }
}
