use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::workflows::store::RepositoryError;

use super::domain::{Coordinates, Employer, EmployerChanges, EmployerId};
use super::listing::EmployerQuery;

/// Storage abstraction so the directory service can be exercised in isolation.
pub trait EmployerRepository: Send + Sync {
    fn insert(&self, employer: Employer) -> Result<Employer, RepositoryError>;
    fn fetch(&self, id: &EmployerId) -> Result<Option<Employer>, RepositoryError>;
    /// Applies `changes` and returns the stored row; [`RepositoryError::NotFound`] when absent.
    fn update(&self, id: &EmployerId, changes: &EmployerChanges)
        -> Result<Employer, RepositoryError>;
    fn set_coordinates(
        &self,
        id: &EmployerId,
        coordinates: Coordinates,
    ) -> Result<(), RepositoryError>;
    /// Hard delete. Removing an absent row is not an error.
    fn delete(&self, id: &EmployerId) -> Result<(), RepositoryError>;
    /// Filtered read, ordered with [`super::listing::compare_employers`] semantics when
    /// `query.order` is set.
    fn list(&self, query: &EmployerQuery) -> Result<Vec<Employer>, RepositoryError>;
}

/// Outbound message hook (e-mail or chat adapters).
pub trait Notifier: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub template: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub details: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Address-to-coordinate lookup. Callers keep to roughly one lookup per second.
pub trait Geocoder: Send + Sync {
    fn locate(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoding service unavailable: {0}")]
    Unavailable(String),
}
