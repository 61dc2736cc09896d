//! Employer-partner directory: public intake, lifecycle edits and role-scoped listings.

pub mod domain;
pub mod lifecycle;
pub mod listing;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Coordinates, Employer, EmployerChanges, EmployerId, EmployerPatch, EmployerStatus,
    EmployerSubmission,
};
pub use lifecycle::{LifecycleViolation, ReviewedChanges};
pub use listing::{
    compare_employers, EmployerListing, EmployerQuery, ListingPolicy, ListingRequest,
    SortDirection, SortField,
};
pub use repository::{
    EmployerRepository, GeocodeError, Geocoder, Notification, Notifier, NotifyError,
};
pub use router::{employer_router, EmployerRoutes};
pub use service::EmployerDirectoryService;
