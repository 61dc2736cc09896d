//! Two-state employer lifecycle.
//!
//! Entries enter as `New Submission` through the public form and move between `New Submission`
//! and `Active Partner` only through an explicit status edit by an edit-capable role.

use chrono::{DateTime, Utc};

use crate::access::Role;
use crate::workflows::clean_optional;

use super::domain::{
    Employer, EmployerChanges, EmployerId, EmployerPatch, EmployerStatus, EmployerSubmission,
};

/// Validation failures raised before any write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleViolation {
    #[error("Missing required fields.")]
    MissingRequiredFields,
    #[error("{0} cannot be blank")]
    BlankRequiredField(&'static str),
    #[error("No valid fields to update")]
    NoRecognizedFields,
    #[error("Invalid status")]
    InvalidStatus(String),
}

/// Outcome of reviewing a staff edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewedChanges {
    pub changes: EmployerChanges,
    /// Status value outside the closed set that was accepted from a non-CRS role but dropped.
    pub discarded_status: Option<String>,
}

fn required(value: Option<&str>) -> Result<String, LifecycleViolation> {
    clean_optional(value).ok_or(LifecycleViolation::MissingRequiredFields)
}

/// Turn a public submission into a new `New Submission` entry.
pub fn admit(
    submission: &EmployerSubmission,
    id: EmployerId,
    now: DateTime<Utc>,
) -> Result<Employer, LifecycleViolation> {
    Ok(Employer {
        id,
        created_at: now,
        updated_at: now,
        status: EmployerStatus::NewSubmission,
        company_name: required(submission.company_name.as_deref())?,
        address_street: required(submission.address_street.as_deref())?,
        address_city: required(submission.address_city.as_deref())?,
        address_state: required(submission.address_state.as_deref())?,
        address_county: required(submission.address_county.as_deref())?,
        phone: clean_optional(submission.phone.as_deref()),
        website: clean_optional(submission.website.as_deref()),
        industry: required(submission.industry.as_deref())?,
        contact_name: required(submission.contact_name.as_deref())?,
        contact_phone: clean_optional(submission.contact_phone.as_deref()),
        contact_email: required(submission.contact_email.as_deref())?,
        contact_title: clean_optional(submission.contact_title.as_deref()),
        latitude: None,
        longitude: None,
    })
}

/// Validate a staff edit for the given role.
///
/// CRS may only set one of the two lifecycle labels. Other edit-capable roles are not held to
/// that allow-list: their unrecognized status values are accepted and reported back in
/// `discarded_status` without reaching storage.
pub fn review_changes(
    role: Role,
    patch: &EmployerPatch,
) -> Result<ReviewedChanges, LifecycleViolation> {
    if patch.is_empty() {
        return Err(LifecycleViolation::NoRecognizedFields);
    }

    let mut discarded_status = None;
    let status = match patch.status.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<EmployerStatus>() {
            Ok(status) => Some(status),
            Err(raw) if role == Role::Crs => return Err(LifecycleViolation::InvalidStatus(raw)),
            Err(raw) => {
                discarded_status = Some(raw);
                None
            }
        },
    };

    let changes = EmployerChanges {
        company_name: required_edit("company_name", &patch.company_name)?,
        address_street: required_edit("address_street", &patch.address_street)?,
        address_city: required_edit("address_city", &patch.address_city)?,
        address_state: required_edit("address_state", &patch.address_state)?,
        address_county: required_edit("address_county", &patch.address_county)?,
        phone: optional_edit(&patch.phone),
        website: optional_edit(&patch.website),
        industry: required_edit("industry", &patch.industry)?,
        contact_name: required_edit("contact_name", &patch.contact_name)?,
        contact_phone: optional_edit(&patch.contact_phone),
        contact_email: required_edit("contact_email", &patch.contact_email)?,
        contact_title: optional_edit(&patch.contact_title),
        status,
    };

    Ok(ReviewedChanges {
        changes,
        discarded_status,
    })
}

fn required_edit(
    field: &'static str,
    value: &Option<String>,
) -> Result<Option<String>, LifecycleViolation> {
    match value {
        None => Ok(None),
        Some(raw) => clean_optional(Some(raw.as_str()))
            .map(Some)
            .ok_or(LifecycleViolation::BlankRequiredField(field)),
    }
}

fn optional_edit(value: &Option<Option<String>>) -> Option<Option<String>> {
    value.as_ref().map(|inner| clean_optional(inner.as_deref()))
}
