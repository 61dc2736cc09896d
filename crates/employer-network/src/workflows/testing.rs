//! In-memory collaborators shared by the workflow test suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::to_bytes;
use axum::response::Response;
use serde_json::Value;

use crate::access::{Gatekeeper, Role};
use crate::workflows::accounts::{
    Identity, IdentityError, IdentityProvider, Profile, ProfileChanges, ProfileStore, Session,
    UserId,
};
use crate::workflows::employers::{
    compare_employers, Coordinates, Employer, EmployerChanges, EmployerId, EmployerQuery,
    EmployerRepository, GeocodeError, Geocoder, Notification, Notifier, NotifyError,
};
use crate::workflows::store::RepositoryError;

pub(crate) async fn read_json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

#[derive(Default)]
pub(crate) struct MemoryEmployers {
    rows: Mutex<Vec<Employer>>,
}

impl MemoryEmployers {
    pub(crate) fn seed(&self, employer: Employer) {
        self.rows.lock().expect("employer mutex poisoned").push(employer);
    }

    pub(crate) fn get(&self, id: &EmployerId) -> Option<Employer> {
        self.rows
            .lock()
            .expect("employer mutex poisoned")
            .iter()
            .find(|row| &row.id == id)
            .cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.lock().expect("employer mutex poisoned").len()
    }
}

impl EmployerRepository for MemoryEmployers {
    fn insert(&self, employer: Employer) -> Result<Employer, RepositoryError> {
        let mut rows = self.rows.lock().expect("employer mutex poisoned");
        if rows.iter().any(|row| row.id == employer.id) {
            return Err(RepositoryError::Conflict);
        }
        rows.push(employer.clone());
        Ok(employer)
    }

    fn fetch(&self, id: &EmployerId) -> Result<Option<Employer>, RepositoryError> {
        Ok(self.get(id))
    }

    fn update(
        &self,
        id: &EmployerId,
        changes: &EmployerChanges,
    ) -> Result<Employer, RepositoryError> {
        let mut rows = self.rows.lock().expect("employer mutex poisoned");
        let row = rows
            .iter_mut()
            .find(|row| &row.id == id)
            .ok_or(RepositoryError::NotFound)?;
        changes.apply(row);
        Ok(row.clone())
    }

    fn set_coordinates(
        &self,
        id: &EmployerId,
        coordinates: Coordinates,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().expect("employer mutex poisoned");
        let row = rows
            .iter_mut()
            .find(|row| &row.id == id)
            .ok_or(RepositoryError::NotFound)?;
        row.latitude = Some(coordinates.latitude);
        row.longitude = Some(coordinates.longitude);
        Ok(())
    }

    fn delete(&self, id: &EmployerId) -> Result<(), RepositoryError> {
        self.rows
            .lock()
            .expect("employer mutex poisoned")
            .retain(|row| &row.id != id);
        Ok(())
    }

    fn list(&self, query: &EmployerQuery) -> Result<Vec<Employer>, RepositoryError> {
        let rows = self.rows.lock().expect("employer mutex poisoned");
        let mut matched: Vec<Employer> =
            rows.iter().filter(|row| query.matches(row)).cloned().collect();
        if let Some((field, direction)) = query.order {
            matched.sort_by(|a, b| compare_employers(a, b, field, direction));
        }
        Ok(matched)
    }
}

/// Every call fails as if the store were unreachable.
pub(crate) struct UnavailableEmployers;

impl EmployerRepository for UnavailableEmployers {
    fn insert(&self, _employer: Employer) -> Result<Employer, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    fn fetch(&self, _id: &EmployerId) -> Result<Option<Employer>, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    fn update(
        &self,
        _id: &EmployerId,
        _changes: &EmployerChanges,
    ) -> Result<Employer, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    fn set_coordinates(
        &self,
        _id: &EmployerId,
        _coordinates: Coordinates,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    fn delete(&self, _id: &EmployerId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    fn list(&self, _query: &EmployerQuery) -> Result<Vec<Employer>, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }
}

#[derive(Default)]
pub(crate) struct MemoryProfiles {
    rows: Mutex<Vec<Profile>>,
    bootstrap_claimed: AtomicBool,
    pub(crate) fail_inserts: AtomicBool,
    pub(crate) fail_deletes: AtomicBool,
}

impl MemoryProfiles {
    pub(crate) fn seed(&self, profile: Profile) {
        self.rows.lock().expect("profile mutex poisoned").push(profile);
    }

    pub(crate) fn rows(&self) -> Vec<Profile> {
        self.rows.lock().expect("profile mutex poisoned").clone()
    }

    pub(crate) fn bootstrap_claimed(&self) -> bool {
        self.bootstrap_claimed.load(Ordering::SeqCst)
    }
}

impl ProfileStore for MemoryProfiles {
    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.rows.lock().expect("profile mutex poisoned").len())
    }

    fn insert(&self, profile: Profile) -> Result<Profile, RepositoryError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("write timed out".to_string()));
        }
        let mut rows = self.rows.lock().expect("profile mutex poisoned");
        if rows
            .iter()
            .any(|row| row.id == profile.id || row.email == profile.email)
        {
            return Err(RepositoryError::Conflict);
        }
        rows.push(profile.clone());
        Ok(profile)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .expect("profile mutex poisoned")
            .iter()
            .find(|row| &row.id == id)
            .cloned())
    }

    fn update(&self, id: &UserId, changes: &ProfileChanges) -> Result<Profile, RepositoryError> {
        let mut rows = self.rows.lock().expect("profile mutex poisoned");
        let row = rows
            .iter_mut()
            .find(|row| &row.id == id)
            .ok_or(RepositoryError::NotFound)?;
        changes.apply(row);
        Ok(row.clone())
    }

    fn delete(&self, id: &UserId) -> Result<(), RepositoryError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("write timed out".to_string()));
        }
        let mut rows = self.rows.lock().expect("profile mutex poisoned");
        let before = rows.len();
        rows.retain(|row| &row.id != id);
        if rows.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<Profile>, RepositoryError> {
        let mut rows = self.rows();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    fn with_role(&self, role: Role) -> Result<Vec<Profile>, RepositoryError> {
        Ok(self
            .rows()
            .into_iter()
            .filter(|row| row.role == role)
            .collect())
    }

    fn claim_bootstrap(&self) -> Result<(), RepositoryError> {
        self.bootstrap_claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| RepositoryError::Conflict)
    }

    fn release_bootstrap(&self) -> Result<(), RepositoryError> {
        self.bootstrap_claimed.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SentLink {
    pub(crate) email: String,
    pub(crate) redirect_to: String,
}

#[derive(Default)]
struct IdentityState {
    accounts: HashMap<String, (UserId, Option<String>)>,
    sessions: HashMap<String, UserId>,
    codes: HashMap<String, UserId>,
    invites: Vec<SentLink>,
    resets: Vec<SentLink>,
}

/// Identity provider keeping accounts keyed by email, with plaintext test passwords.
#[derive(Default)]
pub(crate) struct MemoryIdentity {
    state: Mutex<IdentityState>,
    sequence: AtomicUsize,
    pub(crate) fail_creates: AtomicBool,
    pub(crate) fail_deletes: AtomicBool,
}

impl MemoryIdentity {
    fn next(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn state(&self) -> std::sync::MutexGuard<'_, IdentityState> {
        self.state.lock().expect("identity mutex poisoned")
    }

    /// Registers an account and returns a live access token for it.
    pub(crate) fn enroll(&self, id: &UserId, email: &str) -> String {
        let token = self.next("token");
        let mut state = self.state();
        state
            .accounts
            .insert(email.to_string(), (id.clone(), None));
        state.sessions.insert(token.clone(), id.clone());
        token
    }

    pub(crate) fn issue_code(&self, id: &UserId) -> String {
        let code = self.next("code");
        self.state().codes.insert(code.clone(), id.clone());
        code
    }

    pub(crate) fn revoke(&self, token: &str) {
        self.state().sessions.remove(token);
    }

    pub(crate) fn password_of(&self, email: &str) -> Option<String> {
        self.state()
            .accounts
            .get(email)
            .and_then(|(_, password)| password.clone())
    }

    pub(crate) fn has_account(&self, email: &str) -> bool {
        self.state().accounts.contains_key(email)
    }

    pub(crate) fn invites(&self) -> Vec<SentLink> {
        self.state().invites.clone()
    }

    pub(crate) fn resets(&self) -> Vec<SentLink> {
        self.state().resets.clone()
    }
}

impl IdentityProvider for MemoryIdentity {
    fn create_user(
        &self,
        email: &str,
        password: &str,
        _email_confirmed: bool,
    ) -> Result<Identity, IdentityError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(IdentityError::Unavailable("503 from provider".to_string()));
        }
        let id = UserId(self.next("user"));
        let mut state = self.state();
        if state.accounts.contains_key(email) {
            return Err(IdentityError::AlreadyRegistered);
        }
        state
            .accounts
            .insert(email.to_string(), (id.clone(), Some(password.to_string())));
        Ok(Identity {
            id,
            email: email.to_string(),
        })
    }

    fn invite_user(
        &self,
        email: &str,
        _full_name: Option<&str>,
        redirect_to: &str,
    ) -> Result<Identity, IdentityError> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(IdentityError::Unavailable("503 from provider".to_string()));
        }
        let id = UserId(self.next("user"));
        let mut state = self.state();
        if state.accounts.contains_key(email) {
            return Err(IdentityError::AlreadyRegistered);
        }
        state.accounts.insert(email.to_string(), (id.clone(), None));
        state.invites.push(SentLink {
            email: email.to_string(),
            redirect_to: redirect_to.to_string(),
        });
        Ok(Identity {
            id,
            email: email.to_string(),
        })
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let id = match self.state().accounts.get(email) {
            Some((id, Some(stored))) if stored == password => id.clone(),
            _ => return Err(IdentityError::InvalidCredentials),
        };
        let token = self.next("token");
        self.state().sessions.insert(token.clone(), id.clone());
        Ok(Session {
            access_token: token,
            user_id: id,
        })
    }

    fn authenticate(&self, access_token: &str) -> Result<UserId, IdentityError> {
        self.state()
            .sessions
            .get(access_token)
            .cloned()
            .ok_or(IdentityError::InvalidSession)
    }

    fn exchange_code(&self, code: &str) -> Result<Session, IdentityError> {
        let id = self
            .state()
            .codes
            .remove(code)
            .ok_or(IdentityError::InvalidCode)?;
        let token = self.next("token");
        self.state().sessions.insert(token.clone(), id.clone());
        Ok(Session {
            access_token: token,
            user_id: id,
        })
    }

    fn update_password(&self, access_token: &str, password: &str) -> Result<(), IdentityError> {
        let mut state = self.state();
        let id = state
            .sessions
            .get(access_token)
            .cloned()
            .ok_or(IdentityError::InvalidSession)?;
        let account = state
            .accounts
            .values_mut()
            .find(|(account_id, _)| account_id == &id)
            .ok_or(IdentityError::NotFound)?;
        account.1 = Some(password.to_string());
        Ok(())
    }

    fn send_password_reset(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError> {
        let mut state = self.state();
        if !state.accounts.contains_key(email) {
            return Err(IdentityError::NotFound);
        }
        state.resets.push(SentLink {
            email: email.to_string(),
            redirect_to: redirect_to.to_string(),
        });
        Ok(())
    }

    fn delete_user(&self, id: &UserId) -> Result<(), IdentityError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(IdentityError::Unavailable("503 from provider".to_string()));
        }
        let mut state = self.state();
        let before = state.accounts.len();
        state.accounts.retain(|_, (account_id, _)| account_id != id);
        if state.accounts.len() == before {
            return Err(IdentityError::NotFound);
        }
        state.sessions.retain(|_, session_id| session_id != id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    pub(crate) fail: AtomicBool,
}

impl RecordingNotifier {
    pub(crate) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn publish(&self, notification: Notification) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport("smtp refused".to_string()));
        }
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

/// Answers every lookup with the same result and remembers the queried addresses.
pub(crate) struct FixedGeocoder {
    answer: Result<Option<Coordinates>, String>,
    queries: Mutex<Vec<String>>,
}

impl FixedGeocoder {
    pub(crate) fn found(latitude: f64, longitude: f64) -> Self {
        Self {
            answer: Ok(Some(Coordinates {
                latitude,
                longitude,
            })),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn nothing() -> Self {
        Self {
            answer: Ok(None),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            answer: Err("rate limited".to_string()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().expect("geocoder mutex poisoned").clone()
    }
}

impl Geocoder for FixedGeocoder {
    fn locate(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        self.queries
            .lock()
            .expect("geocoder mutex poisoned")
            .push(address.to_string());
        self.answer.clone().map_err(GeocodeError::Unavailable)
    }
}

/// Staff member with a live session in `identity` and a profile in `profiles`.
pub(crate) fn enroll_staff(
    identity: &MemoryIdentity,
    profiles: &MemoryProfiles,
    id: &str,
    role: Role,
) -> (Profile, String) {
    let user = UserId(id.to_string());
    let email = format!("{id}@staff.example");
    let token = identity.enroll(&user, &email);
    let profile = Profile::new(user, email, Some(format!("Staff {id}")), role);
    profiles.seed(profile.clone());
    (profile, token)
}

pub(crate) fn gatekeeper(
    identity: &Arc<MemoryIdentity>,
    profiles: &Arc<MemoryProfiles>,
) -> Gatekeeper<MemoryIdentity, MemoryProfiles> {
    Gatekeeper::new(identity.clone(), profiles.clone())
}
