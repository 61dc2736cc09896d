//! Staff account provisioning: first-run bootstrap, invites, link redemption, password
//! changes and user management.
//!
//! Identities live with an external identity provider; roles live on profile rows in the
//! profile store. The two are written in sequence without a shared transaction, so every flow
//! that writes both reports a half-finished outcome explicitly.

pub mod domain;
pub mod identity;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Credentials, Identity, InviteOutcome, InviteRequest, LinkRedemption, PasswordChange,
    PasswordResetRequest, Profile, ProfileChanges, ProfileUpdate, RedeemedLink, Session,
    SetupStatus, UserId,
};
pub use identity::{IdentityError, IdentityProvider};
pub use repository::ProfileStore;
pub use router::{account_router, AccountRoutes};
pub use service::{AccountProvisioningService, MIN_PASSWORD_LENGTH};
