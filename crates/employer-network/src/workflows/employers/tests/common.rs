use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::access::Role;
use crate::workflows::employers::{
    employer_router, Employer, EmployerDirectoryService, EmployerId, EmployerStatus,
    EmployerSubmission,
};
use crate::workflows::testing::{
    enroll_staff, gatekeeper, FixedGeocoder, MemoryEmployers, MemoryIdentity, MemoryProfiles,
    RecordingNotifier,
};

pub(super) type DirectoryService =
    EmployerDirectoryService<MemoryEmployers, MemoryProfiles, RecordingNotifier>;

pub(super) struct Harness {
    pub(super) service: Arc<DirectoryService>,
    pub(super) employers: Arc<MemoryEmployers>,
    pub(super) profiles: Arc<MemoryProfiles>,
    pub(super) identity: Arc<MemoryIdentity>,
    pub(super) notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub(super) fn new() -> Self {
        Self::build(None)
    }

    pub(super) fn with_geocoder(geocoder: Arc<FixedGeocoder>) -> Self {
        Self::build(Some(geocoder))
    }

    fn build(geocoder: Option<Arc<FixedGeocoder>>) -> Self {
        let employers = Arc::new(MemoryEmployers::default());
        let profiles = Arc::new(MemoryProfiles::default());
        let identity = Arc::new(MemoryIdentity::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let mut service =
            EmployerDirectoryService::new(employers.clone(), profiles.clone(), notifier.clone());
        if let Some(geocoder) = geocoder {
            service = service.with_geocoder(geocoder);
        }
        Self {
            service: Arc::new(service),
            employers,
            profiles,
            identity,
            notifier,
        }
    }

    /// Bearer token for a freshly enrolled staff member.
    pub(super) fn staff(&self, id: &str, role: Role) -> String {
        enroll_staff(&self.identity, &self.profiles, id, role).1
    }

    pub(super) fn router(&self) -> Router {
        employer_router(
            self.service.clone(),
            gatekeeper(&self.identity, &self.profiles),
        )
    }
}

pub(super) fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn employer(
    id: &str,
    company: &str,
    status: EmployerStatus,
    created: DateTime<Utc>,
) -> Employer {
    Employer {
        id: EmployerId(id.to_string()),
        created_at: created,
        updated_at: created + Duration::minutes(5),
        status,
        company_name: company.to_string(),
        address_street: "200 Lincoln Way".to_string(),
        address_city: "Ames".to_string(),
        address_state: "IA".to_string(),
        address_county: "Story".to_string(),
        phone: None,
        website: None,
        industry: "Manufacturing".to_string(),
        contact_name: "Pat Lee".to_string(),
        contact_phone: None,
        contact_email: format!("hiring@{id}.example"),
        contact_title: None,
        latitude: None,
        longitude: None,
    }
}

pub(super) fn required_only_submission() -> EmployerSubmission {
    EmployerSubmission {
        company_name: Some("Cedar Valley Foods".to_string()),
        address_street: Some("12 Depot Road".to_string()),
        address_city: Some("Waterloo".to_string()),
        address_state: Some("IA".to_string()),
        address_county: Some("Black Hawk".to_string()),
        industry: Some("Food Processing".to_string()),
        contact_name: Some("Jordan Kim".to_string()),
        contact_email: Some("jordan@cedarvalley.example".to_string()),
        ..EmployerSubmission::default()
    }
}

/// Two new submissions (T1 < T2) and the partners "Zeta" and "Acme".
pub(super) fn seed_mixed_directory(employers: &MemoryEmployers) {
    employers.seed(employer("older", "Older Co", EmployerStatus::NewSubmission, at(9)));
    employers.seed(employer("zeta", "Zeta", EmployerStatus::ActivePartner, at(8)));
    employers.seed(employer("newer", "Newer Co", EmployerStatus::NewSubmission, at(11)));
    employers.seed(employer("acme", "Acme", EmployerStatus::ActivePartner, at(10)));
}

pub(super) fn ids(employers: &[Employer]) -> Vec<&str> {
    employers.iter().map(|employer| employer.id.0.as_str()).collect()
}
