use crate::access::Role;
use crate::workflows::store::RepositoryError;

use super::domain::{Profile, ProfileChanges, UserId};

/// Storage abstraction for staff profiles.
///
/// Implementations enforce uniqueness on both `id` and `email`, reporting a violation as
/// [`RepositoryError::Conflict`].
pub trait ProfileStore: Send + Sync {
    fn count(&self) -> Result<usize, RepositoryError>;
    fn insert(&self, profile: Profile) -> Result<Profile, RepositoryError>;
    fn fetch(&self, id: &UserId) -> Result<Option<Profile>, RepositoryError>;
    fn update(&self, id: &UserId, changes: &ProfileChanges) -> Result<Profile, RepositoryError>;
    fn delete(&self, id: &UserId) -> Result<(), RepositoryError>;
    /// All profiles, newest first.
    fn list(&self) -> Result<Vec<Profile>, RepositoryError>;
    fn with_role(&self, role: Role) -> Result<Vec<Profile>, RepositoryError>;

    /// Single-writer guard for first-run setup: succeeds for exactly one caller and returns
    /// [`RepositoryError::Conflict`] afterwards.
    fn claim_bootstrap(&self) -> Result<(), RepositoryError>;
    /// Gives the claim back after a bootstrap attempt that created nothing.
    fn release_bootstrap(&self) -> Result<(), RepositoryError>;
}
