use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use employer_network::access::Role;
use employer_network::workflows::accounts::{
    Identity, IdentityError, IdentityProvider, Profile, ProfileChanges, ProfileStore, Session,
    UserId,
};
use employer_network::workflows::employers::{
    compare_employers, Coordinates, Employer, EmployerChanges, EmployerId, EmployerQuery,
    EmployerRepository, Notification, Notifier, NotifyError,
};
use employer_network::workflows::store::RepositoryError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;
use uuid::Uuid;

/// Most recent links and notifications kept for inspection; older entries are dropped.
const RETAINED_MESSAGES: usize = 200;
const SESSION_TTL_HOURS: i64 = 12;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn guard<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, String> {
    mutex.lock().map_err(|_| "in-memory store mutex poisoned".to_string())
}

fn store_guard<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    guard(mutex).map_err(RepositoryError::Unavailable)
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryEmployerRepository {
    rows: Arc<Mutex<HashMap<EmployerId, Employer>>>,
}

impl EmployerRepository for InMemoryEmployerRepository {
    fn insert(&self, employer: Employer) -> Result<Employer, RepositoryError> {
        let mut rows = store_guard(&self.rows)?;
        if rows.contains_key(&employer.id) {
            return Err(RepositoryError::Conflict);
        }
        rows.insert(employer.id.clone(), employer.clone());
        Ok(employer)
    }

    fn fetch(&self, id: &EmployerId) -> Result<Option<Employer>, RepositoryError> {
        Ok(store_guard(&self.rows)?.get(id).cloned())
    }

    fn update(
        &self,
        id: &EmployerId,
        changes: &EmployerChanges,
    ) -> Result<Employer, RepositoryError> {
        let mut rows = store_guard(&self.rows)?;
        let row = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        changes.apply(row);
        Ok(row.clone())
    }

    fn set_coordinates(
        &self,
        id: &EmployerId,
        coordinates: Coordinates,
    ) -> Result<(), RepositoryError> {
        let mut rows = store_guard(&self.rows)?;
        let row = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        row.latitude = Some(coordinates.latitude);
        row.longitude = Some(coordinates.longitude);
        Ok(())
    }

    fn delete(&self, id: &EmployerId) -> Result<(), RepositoryError> {
        store_guard(&self.rows)?.remove(id);
        Ok(())
    }

    fn list(&self, query: &EmployerQuery) -> Result<Vec<Employer>, RepositoryError> {
        let rows = store_guard(&self.rows)?;
        let mut matched: Vec<Employer> = rows
            .values()
            .filter(|employer| query.matches(employer))
            .cloned()
            .collect();
        if let Some((field, direction)) = query.order {
            matched.sort_by(|a, b| compare_employers(a, b, field, direction));
        }
        Ok(matched)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryProfileStore {
    rows: Arc<Mutex<HashMap<UserId, Profile>>>,
    bootstrap_claimed: Arc<AtomicBool>,
}

impl ProfileStore for InMemoryProfileStore {
    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(store_guard(&self.rows)?.len())
    }

    fn insert(&self, profile: Profile) -> Result<Profile, RepositoryError> {
        let mut rows = store_guard(&self.rows)?;
        if rows.contains_key(&profile.id) || rows.values().any(|row| row.email == profile.email) {
            return Err(RepositoryError::Conflict);
        }
        rows.insert(profile.id.clone(), profile.clone());
        Ok(profile)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<Profile>, RepositoryError> {
        Ok(store_guard(&self.rows)?.get(id).cloned())
    }

    fn update(&self, id: &UserId, changes: &ProfileChanges) -> Result<Profile, RepositoryError> {
        let mut rows = store_guard(&self.rows)?;
        let row = rows.get_mut(id).ok_or(RepositoryError::NotFound)?;
        changes.apply(row);
        Ok(row.clone())
    }

    fn delete(&self, id: &UserId) -> Result<(), RepositoryError> {
        store_guard(&self.rows)?
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn list(&self) -> Result<Vec<Profile>, RepositoryError> {
        let mut profiles: Vec<Profile> = store_guard(&self.rows)?.values().cloned().collect();
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(profiles)
    }

    fn with_role(&self, role: Role) -> Result<Vec<Profile>, RepositoryError> {
        Ok(store_guard(&self.rows)?
            .values()
            .filter(|profile| profile.role == role)
            .cloned()
            .collect())
    }

    fn claim_bootstrap(&self) -> Result<(), RepositoryError> {
        self.bootstrap_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| RepositoryError::Conflict)
    }

    fn release_bootstrap(&self) -> Result<(), RepositoryError> {
        self.bootstrap_claimed.store(false, Ordering::Release);
        Ok(())
    }
}

/// One-time link handed to the mail transport (invites and password resets).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IssuedLink {
    pub(crate) email: String,
    pub(crate) code: String,
    pub(crate) url: String,
}

#[derive(Debug, Clone)]
struct Account {
    id: UserId,
    password_hash: Option<String>,
    email_confirmed: bool,
}

#[derive(Debug, Clone)]
struct LiveSession {
    user: UserId,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct IdentityState {
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, LiveSession>,
    codes: HashMap<String, UserId>,
    outbox: VecDeque<IssuedLink>,
}

impl IdentityState {
    fn account_mut(&mut self, id: &UserId) -> Option<&mut Account> {
        self.accounts.values_mut().find(|account| &account.id == id)
    }

    fn session_user(&self, access_token: &str) -> Result<UserId, IdentityError> {
        self.sessions
            .get(access_token)
            .filter(|session| session.expires_at > Utc::now())
            .map(|session| session.user.clone())
            .ok_or(IdentityError::InvalidSession)
    }

    fn open_session(&mut self, id: &UserId) -> Session {
        let now = Utc::now();
        self.sessions.retain(|_, session| session.expires_at > now);
        let access_token = Uuid::new_v4().to_string();
        self.sessions.insert(
            access_token.clone(),
            LiveSession {
                user: id.clone(),
                expires_at: now + Duration::hours(SESSION_TTL_HOURS),
            },
        );
        Session {
            access_token,
            user_id: id.clone(),
        }
    }

    /// Stores a single-use code and logs the link carrying it, since no mail transport runs.
    fn issue_link(&mut self, kind: &'static str, email: &str, id: &UserId, redirect_to: &str) {
        let code = Uuid::new_v4().simple().to_string();
        let separator = if redirect_to.contains('?') { '&' } else { '?' };
        let url = format!("{redirect_to}{separator}code={code}");
        info!(kind, email, url = %url, "one-time link issued");
        self.codes.insert(code.clone(), id.clone());
        if self.outbox.len() == RETAINED_MESSAGES {
            self.outbox.pop_front();
        }
        self.outbox.push_back(IssuedLink {
            email: email.to_string(),
            code,
            url,
        });
    }
}

/// Stand-in identity provider: argon2 password hashes, expiring session tokens and single-use
/// link codes, all held in memory.
#[derive(Default, Clone)]
pub(crate) struct InMemoryIdentityProvider {
    state: Arc<Mutex<IdentityState>>,
}

impl InMemoryIdentityProvider {
    fn state(&self) -> Result<MutexGuard<'_, IdentityState>, IdentityError> {
        guard(&self.state).map_err(IdentityError::Unavailable)
    }

    pub(crate) fn outbox(&self) -> Vec<IssuedLink> {
        self.state()
            .map(|state| state.outbox.iter().cloned().collect())
            .unwrap_or_default()
    }
}

fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| IdentityError::Unavailable(format!("password hashing failed: {err}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn create_user(
        &self,
        email: &str,
        password: &str,
        email_confirmed: bool,
    ) -> Result<Identity, IdentityError> {
        let password_hash = hash_password(password)?;
        let mut state = self.state()?;
        if state.accounts.contains_key(email) {
            return Err(IdentityError::AlreadyRegistered);
        }
        let id = UserId(Uuid::new_v4().to_string());
        state.accounts.insert(
            email.to_string(),
            Account {
                id: id.clone(),
                password_hash: Some(password_hash),
                email_confirmed,
            },
        );
        Ok(Identity {
            id,
            email: email.to_string(),
        })
    }

    fn invite_user(
        &self,
        email: &str,
        full_name: Option<&str>,
        redirect_to: &str,
    ) -> Result<Identity, IdentityError> {
        let mut state = self.state()?;
        if state.accounts.contains_key(email) {
            return Err(IdentityError::AlreadyRegistered);
        }
        let id = UserId(Uuid::new_v4().to_string());
        state.accounts.insert(
            email.to_string(),
            Account {
                id: id.clone(),
                password_hash: None,
                email_confirmed: false,
            },
        );
        info!(email, name = full_name.unwrap_or(""), "invitation queued");
        state.issue_link("invite", email, &id, redirect_to);
        Ok(Identity {
            id,
            email: email.to_string(),
        })
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let (id, stored) = match self.state()?.accounts.get(email) {
            Some(Account {
                id,
                password_hash: Some(stored),
                ..
            }) => (id.clone(), stored.clone()),
            _ => return Err(IdentityError::InvalidCredentials),
        };
        if !verify_password(password, &stored) {
            return Err(IdentityError::InvalidCredentials);
        }
        Ok(self.state()?.open_session(&id))
    }

    fn authenticate(&self, access_token: &str) -> Result<UserId, IdentityError> {
        self.state()?.session_user(access_token)
    }

    fn exchange_code(&self, code: &str) -> Result<Session, IdentityError> {
        let mut state = self.state()?;
        let id = state.codes.remove(code).ok_or(IdentityError::InvalidCode)?;
        if let Some(account) = state.account_mut(&id) {
            account.email_confirmed = true;
        }
        Ok(state.open_session(&id))
    }

    fn update_password(&self, access_token: &str, password: &str) -> Result<(), IdentityError> {
        let id = self.state()?.session_user(access_token)?;
        let password_hash = hash_password(password)?;
        let mut state = self.state()?;
        let account = state.account_mut(&id).ok_or(IdentityError::NotFound)?;
        account.password_hash = Some(password_hash);
        Ok(())
    }

    fn send_password_reset(&self, email: &str, redirect_to: &str) -> Result<(), IdentityError> {
        let mut state = self.state()?;
        let id = state
            .accounts
            .get(email)
            .map(|account| account.id.clone())
            .ok_or(IdentityError::NotFound)?;
        state.issue_link("password_reset", email, &id, redirect_to);
        Ok(())
    }

    fn delete_user(&self, id: &UserId) -> Result<(), IdentityError> {
        let mut state = self.state()?;
        let before = state.accounts.len();
        state.accounts.retain(|_, account| &account.id != id);
        if state.accounts.len() == before {
            return Err(IdentityError::NotFound);
        }
        state.sessions.retain(|_, session| &session.user != id);
        state.codes.retain(|_, owner| owner != id);
        Ok(())
    }
}

/// Writes every notification to the log instead of a mail transport, keeping the most recent
/// ones for inspection.
#[derive(Clone)]
pub(crate) struct LoggingNotifier {
    from_address: String,
    sent: Arc<Mutex<VecDeque<Notification>>>,
}

impl LoggingNotifier {
    pub(crate) fn new(from_address: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
            sent: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub(crate) fn sent(&self) -> Vec<Notification> {
        guard(&self.sent)
            .map(|sent| sent.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Notifier for LoggingNotifier {
    fn publish(&self, notification: Notification) -> Result<(), NotifyError> {
        info!(
            from = %self.from_address,
            template = %notification.template,
            recipients = notification.recipients.len(),
            subject = %notification.subject,
            "notification dispatched"
        );
        let mut sent = guard(&self.sent).map_err(NotifyError::Transport)?;
        if sent.len() == RETAINED_MESSAGES {
            sent.pop_front();
        }
        sent.push_back(notification);
        Ok(())
    }
}
