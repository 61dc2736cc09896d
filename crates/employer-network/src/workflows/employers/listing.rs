//! Per-role visibility and ordering of directory listings.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::{can_view_active_only, can_view_all_employers, Role};

use super::domain::{Employer, EmployerStatus};

/// Column a listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    CompanyName,
    AddressCity,
    AddressCounty,
    Industry,
    CreatedAt,
}

impl SortField {
    /// Unrecognized or missing values fall back to creation time.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("company_name") => Self::CompanyName,
            Some("address_city") => Self::AddressCity,
            Some("address_county") => Self::AddressCounty,
            Some("industry") => Self::Industry,
            _ => Self::CreatedAt,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CompanyName => "company_name",
            Self::AddressCity => "address_city",
            Self::AddressCounty => "address_county",
            Self::Industry => "industry",
            Self::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// Anything other than `asc` means descending.
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("asc") => Self::Ascending,
            _ => Self::Descending,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// Raw `?sort=&order=` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingRequest {
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
}

/// Read issued to the employer repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmployerQuery {
    pub status: Option<EmployerStatus>,
    /// `None` leaves the order to the caller.
    pub order: Option<(SortField, SortDirection)>,
}

impl EmployerQuery {
    pub const fn all() -> Self {
        Self {
            status: None,
            order: None,
        }
    }

    pub fn matches(&self, employer: &Employer) -> bool {
        self.status.map_or(true, |status| employer.status == status)
    }
}

/// Ordered listing plus the validated parameters it was produced with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployerListing {
    pub employers: Vec<Employer>,
    pub can_view_all: bool,
    pub role: Role,
    pub sort: SortField,
    pub order: SortDirection,
}

/// Listing rules resolved for one caller and one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingPolicy {
    pub role: Role,
    pub sort: SortField,
    pub direction: SortDirection,
}

impl ListingPolicy {
    pub fn resolve(role: Role, request: &ListingRequest) -> Self {
        Self {
            role,
            sort: SortField::from_param(request.sort.as_deref()),
            direction: SortDirection::from_param(request.order.as_deref()),
        }
    }

    /// Active-only roles are filtered to partners before anything is ordered. CRS listings are
    /// bucketed in memory, so the store is asked for an unordered read.
    pub fn query(&self) -> EmployerQuery {
        let status = can_view_active_only(self.role).then_some(EmployerStatus::ActivePartner);
        let order = (self.role != Role::Crs).then_some((self.sort, self.direction));
        EmployerQuery { status, order }
    }

    pub fn arrange(&self, employers: Vec<Employer>) -> Vec<Employer> {
        if self.role != Role::Crs {
            return employers;
        }

        let (mut submissions, mut partners): (Vec<_>, Vec<_>) = employers
            .into_iter()
            .partition(|employer| employer.status == EmployerStatus::NewSubmission);

        submissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        partners.sort_by(|a, b| compare_employers(a, b, self.sort, self.direction));

        submissions.extend(partners);
        submissions
    }

    pub fn listing(&self, employers: Vec<Employer>) -> EmployerListing {
        EmployerListing {
            employers,
            can_view_all: can_view_all_employers(self.role),
            role: self.role,
            sort: self.sort,
            order: self.direction,
        }
    }
}

enum SortValue<'a> {
    Text(&'a str),
    Timestamp(DateTime<Utc>),
}

/// Blank text counts as missing.
fn sort_value(employer: &Employer, field: SortField) -> Option<SortValue<'_>> {
    let text = match field {
        SortField::CreatedAt => return Some(SortValue::Timestamp(employer.created_at)),
        SortField::CompanyName => &employer.company_name,
        SortField::AddressCity => &employer.address_city,
        SortField::AddressCounty => &employer.address_county,
        SortField::Industry => &employer.industry,
    };
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(SortValue::Text(trimmed))
}

/// Orders two entries by `field`. Missing values go last when ascending and first when
/// descending.
pub fn compare_employers(
    a: &Employer,
    b: &Employer,
    field: SortField,
    direction: SortDirection,
) -> Ordering {
    let ascending = direction == SortDirection::Ascending;
    match (sort_value(a, field), sort_value(b, field)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => {
            if ascending {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Some(_), None) => {
            if ascending {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (Some(left), Some(right)) => {
            let ordering = match (left, right) {
                (SortValue::Timestamp(l), SortValue::Timestamp(r)) => l.cmp(&r),
                (SortValue::Text(l), SortValue::Text(r)) => natural_cmp(l, r),
                _ => Ordering::Equal,
            };
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        }
    }
}

/// Case-insensitive comparison that orders embedded digit runs by numeric value.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ordering = compare_digit_runs(&digit_run(&mut left), &digit_run(&mut right));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                let ordering = l.to_lowercase().cmp(r.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn digit_run(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    run
}

fn compare_digit_runs(left: &str, right: &str) -> Ordering {
    let left = left.trim_start_matches('0');
    let right = right.trim_start_matches('0');
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_runs_compare_by_value() {
        assert_eq!(natural_cmp("2", "10"), Ordering::Less);
        assert_eq!(natural_cmp("Unit 9", "Unit 10"), Ordering::Less);
        assert_eq!(natural_cmp("007", "7"), Ordering::Equal);
        assert_eq!(natural_cmp("Route 66 Diner", "Route 6 Diner"), Ordering::Greater);
    }

    #[test]
    fn text_comparison_ignores_case() {
        assert_eq!(natural_cmp("acme", "ACME"), Ordering::Equal);
        assert_eq!(natural_cmp("acme", "Zeta"), Ordering::Less);
        assert_eq!(natural_cmp("Acme", "Acme Corp"), Ordering::Less);
    }

    #[test]
    fn unrecognized_parameters_fall_back_to_defaults() {
        let policy = ListingPolicy::resolve(
            Role::Admin,
            &ListingRequest {
                sort: Some("contact_email".to_string()),
                order: Some("ascending".to_string()),
            },
        );
        assert_eq!(policy.sort, SortField::CreatedAt);
        assert_eq!(policy.direction, SortDirection::Descending);

        let defaults = ListingPolicy::resolve(Role::Admin, &ListingRequest::default());
        assert_eq!(defaults.sort, SortField::CreatedAt);
        assert_eq!(defaults.direction, SortDirection::Descending);
    }

    #[test]
    fn query_filters_active_only_roles() {
        let request = ListingRequest::default();
        for role in [Role::Supervisor, Role::EmploymentSpecialist] {
            let query = ListingPolicy::resolve(role, &request).query();
            assert_eq!(query.status, Some(EmployerStatus::ActivePartner));
            assert!(query.order.is_some());
        }
        for role in [Role::Admin, Role::Director] {
            assert_eq!(ListingPolicy::resolve(role, &request).query().status, None);
        }

        let crs = ListingPolicy::resolve(Role::Crs, &request).query();
        assert_eq!(crs, EmployerQuery::all());
    }

    #[test]
    fn wire_names_round_trip_through_params() {
        for field in [
            SortField::CompanyName,
            SortField::AddressCity,
            SortField::AddressCounty,
            SortField::Industry,
            SortField::CreatedAt,
        ] {
            assert_eq!(SortField::from_param(Some(field.as_str())), field);
        }
        assert_eq!(
            serde_json::to_value(SortDirection::Ascending).expect("serializes"),
            serde_json::json!("asc")
        );
    }
}
