use super::domain::{Identity, Session, UserId};

/// External identity provider: owns credentials, sessions and one-time link codes.
pub trait IdentityProvider: Send + Sync {
    /// Create an account with a password, optionally marking the email as already confirmed.
    fn create_user(
        &self,
        email: &str,
        password: &str,
        email_confirmed: bool,
    ) -> Result<Identity, IdentityError>;

    /// Create a pending account and dispatch an invitation whose link lands on `redirect_to`.
    fn invite_user(
        &self,
        email: &str,
        full_name: Option<&str>,
        redirect_to: &str,
    ) -> Result<Identity, IdentityError>;

    fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    /// Resolve a session access token to the identity it belongs to.
    fn authenticate(&self, access_token: &str) -> Result<UserId, IdentityError>;

    /// Redeem a one-time code delivered by an invite or reset link.
    fn exchange_code(&self, code: &str) -> Result<Session, IdentityError>;

    fn update_password(&self, access_token: &str, password: &str) -> Result<(), IdentityError>;

    fn send_password_reset(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError>;

    fn delete_user(&self, id: &UserId) -> Result<(), IdentityError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("email has already been registered")]
    AlreadyRegistered,
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("session is missing or expired")]
    InvalidSession,
    #[error("link code is invalid, expired or already used")]
    InvalidCode,
    #[error("identity not found")]
    NotFound,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}
