use std::sync::Arc;

use axum::Router;

use crate::access::{Actor, Role};
use crate::config::AccountsConfig;
use crate::workflows::accounts::{
    account_router, AccountProvisioningService, Credentials, InviteRequest, Profile,
};
use crate::workflows::testing::{enroll_staff, gatekeeper, MemoryIdentity, MemoryProfiles};

pub(super) const PUBLIC_URL: &str = "https://partners.example.org";

pub(super) type Provisioning = AccountProvisioningService<MemoryIdentity, MemoryProfiles>;

pub(super) struct Harness {
    pub(super) service: Arc<Provisioning>,
    pub(super) identity: Arc<MemoryIdentity>,
    pub(super) profiles: Arc<MemoryProfiles>,
}

impl Harness {
    pub(super) fn new() -> Self {
        let identity = Arc::new(MemoryIdentity::default());
        let profiles = Arc::new(MemoryProfiles::default());
        let service = AccountProvisioningService::new(
            identity.clone(),
            profiles.clone(),
            AccountsConfig::new(PUBLIC_URL),
        );
        Self {
            service: Arc::new(service),
            identity,
            profiles,
        }
    }

    /// Profile plus live bearer token for a staff member.
    pub(super) fn staff(&self, id: &str, role: Role) -> (Profile, String) {
        enroll_staff(&self.identity, &self.profiles, id, role)
    }

    pub(super) fn admin(&self) -> Actor {
        let (profile, _) = self.staff("admin-1", Role::Admin);
        Actor {
            id: profile.id,
            email: profile.email,
            role: profile.role,
        }
    }

    pub(super) fn router(&self) -> Router {
        account_router(
            self.service.clone(),
            gatekeeper(&self.identity, &self.profiles),
        )
    }
}

pub(super) fn credentials(email: &str, password: &str) -> Credentials {
    Credentials {
        email: email.to_string(),
        password: password.to_string(),
    }
}

pub(super) fn invite(email: &str, role: &str) -> InviteRequest {
    InviteRequest {
        email: email.to_string(),
        full_name: Some("Riley Chen".to_string()),
        role: Some(role.to_string()),
    }
}
