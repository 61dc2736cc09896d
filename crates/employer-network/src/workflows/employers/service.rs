use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::access::{can_delete_employers, can_edit_employers, Actor, Role};
use crate::error::ServiceError;
use crate::workflows::accounts::ProfileStore;
use crate::workflows::store::RepositoryError;

use super::domain::{Coordinates, Employer, EmployerId, EmployerPatch, EmployerSubmission};
use super::lifecycle::{self, LifecycleViolation};
use super::listing::{EmployerListing, ListingPolicy, ListingRequest};
use super::repository::{EmployerRepository, Geocoder, Notification, Notifier};

pub(crate) const NEW_SUBMISSION_TEMPLATE: &str = "new_employer_submission";

/// Service composing the employer repository, the staff directory and outbound hooks.
pub struct EmployerDirectoryService<E, P, N> {
    employers: Arc<E>,
    profiles: Arc<P>,
    notifier: Arc<N>,
    geocoder: Option<Arc<dyn Geocoder>>,
}

impl<E, P, N> EmployerDirectoryService<E, P, N>
where
    E: EmployerRepository + 'static,
    P: ProfileStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(employers: Arc<E>, profiles: Arc<P>, notifier: Arc<N>) -> Self {
        Self {
            employers,
            profiles,
            notifier,
            geocoder: None,
        }
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Public sign-up. No caller identity is required.
    pub fn submit(&self, submission: EmployerSubmission) -> Result<Employer, ServiceError> {
        let id = EmployerId(Uuid::new_v4().to_string());
        let employer = lifecycle::admit(&submission, id, Utc::now()).map_err(rejected)?;

        let stored = self.employers.insert(employer).map_err(|err| {
            error!(error = %err, "employer insert failed");
            ServiceError::upstream("Could not save your information. Please try again.")
        })?;

        info!(employer = %stored.id, company = %stored.company_name, "new employer submission");
        self.notify_new_submission(&stored);
        Ok(stored)
    }

    pub fn list(
        &self,
        actor: &Actor,
        request: &ListingRequest,
    ) -> Result<EmployerListing, ServiceError> {
        let policy = ListingPolicy::resolve(actor.role, request);
        let rows = self.employers.list(&policy.query()).map_err(|err| {
            error!(error = %err, "employer listing failed");
            ServiceError::upstream("Failed to load employers")
        })?;

        Ok(policy.listing(policy.arrange(rows)))
    }

    pub fn update(
        &self,
        actor: &Actor,
        id: &EmployerId,
        patch: &EmployerPatch,
    ) -> Result<Employer, ServiceError> {
        actor.ensure(can_edit_employers, "update employer")?;
        let reviewed = lifecycle::review_changes(actor.role, patch).map_err(rejected)?;

        if let Some(discarded) = &reviewed.discarded_status {
            warn!(
                employer = %id,
                role = %actor.role,
                status = %discarded,
                "status outside the lifecycle was not persisted"
            );
        }

        let updated = self
            .employers
            .update(id, &reviewed.changes)
            .map_err(|err| match err {
                RepositoryError::NotFound => ServiceError::not_found("Employer not found"),
                other => {
                    error!(employer = %id, error = %other, "employer update failed");
                    ServiceError::upstream("Update failed")
                }
            })?;

        if let Some(status) = reviewed.changes.status {
            info!(employer = %id, actor = %actor.id, %status, "employer status set");
        }
        Ok(updated)
    }

    pub fn delete(&self, actor: &Actor, id: &EmployerId) -> Result<(), ServiceError> {
        actor.ensure(can_delete_employers, "delete employer")?;
        self.employers.delete(id).map_err(|err| {
            error!(employer = %id, error = %err, "employer delete failed");
            ServiceError::upstream("Delete failed")
        })?;
        info!(employer = %id, actor = %actor.id, "employer removed");
        Ok(())
    }

    /// Look up and store coordinates for an entry's street address.
    pub fn geocode(&self, actor: &Actor, id: &EmployerId) -> Result<Coordinates, ServiceError> {
        actor.ensure(can_edit_employers, "geocode employer")?;

        let employer = self
            .employers
            .fetch(id)
            .map_err(|err| {
                error!(employer = %id, error = %err, "employer fetch failed");
                ServiceError::upstream("Failed to load employer")
            })?
            .ok_or_else(|| ServiceError::not_found("Employer not found"))?;

        let geocoder = self.geocoder.as_ref().ok_or_else(|| {
            warn!("geocoding requested but no geocoder is configured");
            ServiceError::upstream("Geocoding failed")
        })?;

        let coordinates = geocoder
            .locate(&employer.lookup_address())
            .map_err(|err| {
                error!(employer = %id, error = %err, "geocoder failed");
                ServiceError::upstream("Geocoding failed")
            })?
            .ok_or_else(|| ServiceError::not_found("Address could not be located"))?;

        self.employers
            .set_coordinates(id, coordinates)
            .map_err(|err| {
                error!(employer = %id, error = %err, "coordinate update failed");
                ServiceError::upstream("Failed to save coordinates")
            })?;

        Ok(coordinates)
    }

    /// Best effort: a failed or skipped notification never fails the submission.
    fn notify_new_submission(&self, employer: &Employer) {
        let recipients: Vec<String> = match self.profiles.with_role(Role::Crs) {
            Ok(profiles) => profiles.into_iter().map(|profile| profile.email).collect(),
            Err(err) => {
                warn!(error = %err, "could not load CRS recipients");
                return;
            }
        };

        if recipients.is_empty() {
            debug!(employer = %employer.id, "no CRS profiles to notify");
            return;
        }

        let mut details = BTreeMap::new();
        details.insert("employer_id".to_string(), employer.id.0.clone());
        details.insert("company_name".to_string(), employer.company_name.clone());
        details.insert(
            "submitted".to_string(),
            employer.created_at.format("%b %-d, %Y").to_string(),
        );

        let notification = Notification {
            template: NEW_SUBMISSION_TEMPLATE.to_string(),
            recipients,
            subject: format!("New employer submission: {}", employer.company_name),
            details,
        };

        if let Err(err) = self.notifier.publish(notification) {
            warn!(employer = %employer.id, error = %err, "CRS notification failed");
        }
    }
}

fn rejected(violation: LifecycleViolation) -> ServiceError {
    debug!(%violation, "employer request rejected");
    ServiceError::bad_request(violation.to_string())
}
