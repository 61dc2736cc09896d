use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::deserialize_nullable;

/// Identifier wrapper for directory entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployerId(pub String);

impl fmt::Display for EmployerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Closed two-state lifecycle. Nothing outside these two values is ever persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmployerStatus {
    #[serde(rename = "New Submission")]
    NewSubmission,
    #[serde(rename = "Active Partner")]
    ActivePartner,
}

impl EmployerStatus {
    pub const fn ordered() -> [Self; 2] {
        [Self::NewSubmission, Self::ActivePartner]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NewSubmission => "New Submission",
            Self::ActivePartner => "Active Partner",
        }
    }
}

impl fmt::Display for EmployerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EmployerStatus {
    type Err = String;

    /// Exact match on the wire label; no case folding or trimming.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|status| status.label() == value)
            .ok_or_else(|| value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Directory entry as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employer {
    pub id: EmployerId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: EmployerStatus,
    pub company_name: String,
    pub address_street: String,
    pub address_city: String,
    pub address_state: String,
    pub address_county: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub industry: String,
    pub contact_name: String,
    pub contact_phone: Option<String>,
    pub contact_email: String,
    pub contact_title: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Employer {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    /// Street, city and state joined for an address lookup, skipping blank parts.
    pub fn lookup_address(&self) -> String {
        [&self.address_street, &self.address_city, &self.address_state]
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Public sign-up form as received. Every field is optional at the wire level so missing
/// values surface as validation failures instead of decoding failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployerSubmission {
    pub company_name: Option<String>,
    pub address_street: Option<String>,
    pub address_city: Option<String>,
    pub address_state: Option<String>,
    pub address_county: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub industry: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub contact_title: Option<String>,
}

/// Staff edit as received. `None` means untouched; for nullable fields `Some(None)` clears.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EmployerPatch {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub address_street: Option<String>,
    #[serde(default)]
    pub address_city: Option<String>,
    #[serde(default)]
    pub address_state: Option<String>,
    #[serde(default)]
    pub address_county: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub website: Option<Option<String>>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub contact_phone: Option<Option<String>>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_nullable")]
    pub contact_title: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<String>,
}

impl EmployerPatch {
    pub fn is_empty(&self) -> bool {
        self.company_name.is_none()
            && self.address_street.is_none()
            && self.address_city.is_none()
            && self.address_state.is_none()
            && self.address_county.is_none()
            && self.phone.is_none()
            && self.website.is_none()
            && self.industry.is_none()
            && self.contact_name.is_none()
            && self.contact_phone.is_none()
            && self.contact_email.is_none()
            && self.contact_title.is_none()
            && self.status.is_none()
    }
}

/// Validated field changes, ready for the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployerChanges {
    pub company_name: Option<String>,
    pub address_street: Option<String>,
    pub address_city: Option<String>,
    pub address_state: Option<String>,
    pub address_county: Option<String>,
    pub phone: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub industry: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<Option<String>>,
    pub contact_email: Option<String>,
    pub contact_title: Option<Option<String>>,
    pub status: Option<EmployerStatus>,
}

impl EmployerChanges {
    pub fn apply(&self, employer: &mut Employer) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        set(&mut employer.company_name, &self.company_name);
        set(&mut employer.address_street, &self.address_street);
        set(&mut employer.address_city, &self.address_city);
        set(&mut employer.address_state, &self.address_state);
        set(&mut employer.address_county, &self.address_county);
        set(&mut employer.phone, &self.phone);
        set(&mut employer.website, &self.website);
        set(&mut employer.industry, &self.industry);
        set(&mut employer.contact_name, &self.contact_name);
        set(&mut employer.contact_phone, &self.contact_phone);
        set(&mut employer.contact_email, &self.contact_email);
        set(&mut employer.contact_title, &self.contact_title);
        set(&mut employer.status, &self.status);
        employer.updated_at = Utc::now();
    }
}
