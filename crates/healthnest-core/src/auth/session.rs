use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::credentials::CredentialStore;
use super::error::{AuthError, MalformedSessionRecord};
use super::storage::SessionStorage;
use crate::models::{Identity, Role};
use crate::navigation::Navigator;
use crate::notify::{Notification, Notifier};
use crate::routes::{self, GuardDecision};

/// Storage key holding the signed-in identity
pub const SESSION_KEY: &str = "healthnest_user";

/// Public landing page shown after sign-out
pub const LANDING_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Startup check or a sign-in/sign-up is in progress
    Loading,
    Unauthenticated,
    Authenticated(Identity),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.identity().map(|i| i.role)
    }
}

/// Parse a persisted session record.
pub fn parse_session_record(raw: &str) -> Result<Identity, MalformedSessionRecord> {
    Ok(serde_json::from_str(raw)?)
}

/// Owns the current session and the accounts it is checked against.
///
/// Mutating operations take `&mut self`, so only one sign-in, sign-up or
/// sign-out can be in flight. Observers follow state changes through
/// [`SessionManager::subscribe`].
pub struct SessionManager {
    credentials: CredentialStore,
    storage: Box<dyn SessionStorage>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    latency: Duration,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Create a manager in the `Loading` state. Call [`restore`](Self::restore)
    /// to resume a persisted session.
    pub fn new(
        credentials: CredentialStore,
        storage: Box<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            credentials,
            storage,
            navigator,
            notifier,
            latency: Duration::ZERO,
            state,
        }
    }

    /// Artificial delay applied to sign-in and sign-up.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    // =========================================================================
    // State
    // =========================================================================

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Receiver that sees every state change, including transient `Loading`.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Run the route guard for a path against the current state.
    pub fn check(&self, path: &str) -> GuardDecision {
        routes::check_path(&self.state.borrow(), path)
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Resume a persisted session, if any.
    ///
    /// A record that cannot be parsed is discarded and the session starts
    /// signed out.
    pub fn restore(&mut self) -> SessionState {
        let restored = match self.storage.get(SESSION_KEY) {
            Ok(Some(raw)) => match parse_session_record(&raw) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    warn!(error = %e, "Discarding saved session");
                    self.clear_record();
                    None
                }
            },
            Ok(None) => None,
            Err(e) if e.is_undecodable() => {
                warn!(error = %e, "Discarding saved session");
                self.clear_record();
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to read saved session");
                None
            }
        };

        match restored {
            Some(identity) => {
                debug!(id = %identity.id, role = %identity.role, "Session restored");
                self.state.send_replace(SessionState::Authenticated(identity));
            }
            None => {
                debug!("No saved session");
                self.state.send_replace(SessionState::Unauthenticated);
            }
        }
        self.state()
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Sign in with an address and secret.
    ///
    /// On failure the state reverts to what it was before the call.
    pub async fn login(&mut self, email: &str, secret: &str) -> Result<Identity, AuthError> {
        let previous = self.begin();
        self.simulate_latency().await;

        match self.credentials.authenticate(email, secret) {
            Ok(identity) => {
                info!(id = %identity.id, role = %identity.role, "Login successful");
                self.establish(identity.clone());
                self.notifier.notify(Notification::success(
                    "Login successful",
                    format!("Welcome back, {}!", identity.name),
                ));
                Ok(identity)
            }
            Err(e) => {
                warn!(address = %email, error = %e, "Login failed");
                self.revert(previous);
                self.notifier
                    .notify(Notification::failure("Login failed", e.to_string()));
                Err(e)
            }
        }
    }

    /// Create an account and sign in as it.
    ///
    /// A failed registration leaves both the session and the credential
    /// store untouched.
    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        secret: &str,
        role: Role,
    ) -> Result<Identity, AuthError> {
        let previous = self.begin();
        self.simulate_latency().await;

        let created = if self.credentials.exists(email) {
            Err(AuthError::AddressInUse)
        } else {
            self.credentials
                .create(name, email, secret, role)
                .map_err(AuthError::from)
        };

        match created {
            Ok(identity) => {
                info!(id = %identity.id, role = %identity.role, "Registration successful");
                self.establish(identity.clone());
                self.notifier.notify(Notification::success(
                    "Registration successful",
                    format!("Welcome to HealthNest, {}!", identity.name),
                ));
                Ok(identity)
            }
            Err(e) => {
                warn!(address = %email, error = %e, "Registration failed");
                self.revert(previous);
                self.notifier
                    .notify(Notification::failure("Registration failed", e.to_string()));
                Err(e)
            }
        }
    }

    /// Sign out. Never fails.
    pub fn logout(&mut self) {
        if let Some(identity) = self.identity() {
            info!(id = %identity.id, "Logged out");
        }
        self.state.send_replace(SessionState::Unauthenticated);
        self.clear_record();
        self.navigator.go_to(LANDING_PATH);
        self.notifier.notify(Notification::success(
            "Logged out",
            "You have been successfully logged out.",
        ));
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Enter `Loading`, returning the state to fall back to on failure.
    ///
    /// A manager that was never restored is restored first, so a failed
    /// call falls back to the persisted session rather than hiding it.
    fn begin(&mut self) -> SessionState {
        if self.is_loading() {
            self.restore();
        }
        self.state.send_replace(SessionState::Loading)
    }

    fn revert(&mut self, previous: SessionState) {
        self.state.send_replace(previous);
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// Make `identity` the signed-in user, persist it and go to its home.
    fn establish(&mut self, identity: Identity) {
        match serde_json::to_string(&identity) {
            Ok(record) => {
                if let Err(e) = self.storage.set(SESSION_KEY, &record) {
                    warn!(error = %e, "Failed to save session");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize session"),
        }
        let home = identity.home_path();
        self.state.send_replace(SessionState::Authenticated(identity));
        self.navigator.go_to(home);
    }

    fn clear_record(&self) {
        if let Err(e) = self.storage.remove(SESSION_KEY) {
            warn!(error = %e, "Failed to clear saved session");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credentials::tests::cheap_params;
    use crate::auth::credentials::DEMO_SECRET;
    use crate::auth::storage::{FileStorage, MemoryStorage};
    use crate::navigation::RecordingNavigator;
    use crate::notify::{NotificationKind, RecordingNotifier};

    struct Harness {
        manager: SessionManager,
        storage: Arc<MemoryStorage>,
        navigator: Arc<RecordingNavigator>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness_with(storage: Arc<MemoryStorage>) -> Harness {
        let navigator = Arc::new(RecordingNavigator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let credentials = CredentialStore::with_demo_accounts(cheap_params()).unwrap();
        let manager = SessionManager::new(
            credentials,
            Box::new(storage.clone()),
            navigator.clone(),
            notifier.clone(),
        );
        Harness {
            manager,
            storage,
            navigator,
            notifier,
        }
    }

    /// Signed-out manager with demo accounts and empty storage.
    fn harness() -> Harness {
        let mut h = harness_with(Arc::new(MemoryStorage::default()));
        h.manager.restore();
        h
    }

    fn saved_record(h: &Harness) -> Option<String> {
        h.storage.get(SESSION_KEY).unwrap()
    }

    #[test]
    fn test_initial_state_is_loading() {
        let h = harness_with(Arc::new(MemoryStorage::default()));
        assert!(h.manager.is_loading());
        assert!(!h.manager.is_authenticated());
        assert_eq!(h.manager.check("/patient-dashboard"), GuardDecision::Defer);
    }

    #[test]
    fn test_restore_without_record() {
        let mut h = harness_with(Arc::new(MemoryStorage::default()));
        assert_eq!(h.manager.restore(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_restore_with_saved_identity() {
        let storage = Arc::new(MemoryStorage::default());
        storage
            .set(
                SESSION_KEY,
                r#"{"id":"d1","name":"Dr. Sarah Smith","email":"doctor@example.com","role":"doctor"}"#,
            )
            .unwrap();

        let mut h = harness_with(storage);
        let state = h.manager.restore();
        let identity = state.identity().unwrap();
        assert_eq!(identity.id, "d1");
        assert_eq!(identity.role, Role::Doctor);
        assert!(h.manager.is_authenticated());
    }

    #[test]
    fn test_restore_with_corrupt_record_clears_storage() {
        let storage = Arc::new(MemoryStorage::default());
        storage.set(SESSION_KEY, "{not json").unwrap();

        let mut h = harness_with(storage);
        assert_eq!(h.manager.restore(), SessionState::Unauthenticated);
        assert_eq!(saved_record(&h), None);
    }

    #[test]
    fn test_restore_with_unknown_role_clears_storage() {
        let storage = Arc::new(MemoryStorage::default());
        storage
            .set(
                SESSION_KEY,
                r#"{"id":"a1","name":"Admin","email":"a@example.com","role":"admin"}"#,
            )
            .unwrap();

        let mut h = harness_with(storage);
        assert_eq!(h.manager.restore(), SessionState::Unauthenticated);
        assert_eq!(saved_record(&h), None);
    }

    #[test]
    fn test_restore_with_undecodable_record_clears_storage() {
        let dir = std::env::temp_dir().join(format!(
            "healthnest-session-undecodable-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let record = dir.join(format!("{}.json", SESSION_KEY));
        std::fs::write(&record, [0xff, 0xfe, 0x00]).unwrap();

        let mut manager = SessionManager::new(
            CredentialStore::with_demo_accounts(cheap_params()).unwrap(),
            Box::new(FileStorage::new(dir.clone())),
            Arc::new(RecordingNavigator::default()),
            Arc::new(RecordingNotifier::default()),
        );
        assert_eq!(manager.restore(), SessionState::Unauthenticated);
        assert!(!record.exists());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_failed_login_before_restore_keeps_saved_session() {
        let storage = Arc::new(MemoryStorage::default());
        storage
            .set(
                SESSION_KEY,
                r#"{"id":"d1","name":"Dr. Sarah Smith","email":"doctor@example.com","role":"doctor"}"#,
            )
            .unwrap();

        let mut h = harness_with(storage);
        assert!(h.manager.is_loading());
        let err = h.manager.login("doctor@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        assert_eq!(h.manager.state().role(), Some(Role::Doctor));
        assert!(saved_record(&h).is_some());
        assert_eq!(h.manager.restore().role(), Some(Role::Doctor));
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut h = harness();
        let identity = h
            .manager
            .login("patient@example.com", DEMO_SECRET)
            .await
            .unwrap();

        assert_eq!(identity.id, "p1");
        assert_eq!(h.manager.state(), SessionState::Authenticated(identity.clone()));
        assert_eq!(h.navigator.current().as_deref(), Some("/patient-dashboard"));

        let record = saved_record(&h).unwrap();
        assert_eq!(parse_session_record(&record).unwrap(), identity);
        assert!(!record.contains(DEMO_SECRET));
        assert!(!record.contains("argon2"));

        let note = h.notifier.last().unwrap();
        assert_eq!(note.kind, NotificationKind::Success);
        assert_eq!(note.title, "Login successful");
        assert_eq!(note.message, "Welcome back, John Doe!");
    }

    #[tokio::test]
    async fn test_doctor_login_goes_to_doctor_home() {
        let mut h = harness();
        h.manager
            .login("doctor@example.com", DEMO_SECRET)
            .await
            .unwrap();
        assert_eq!(h.navigator.current().as_deref(), Some("/doctor-dashboard"));
        assert!(h.manager.check("/schedule").is_allowed());
    }

    #[tokio::test]
    async fn test_login_wrong_secret_or_unknown_address() {
        let mut h = harness();

        for (email, secret) in [
            ("patient@example.com", "wrong"),
            ("nobody@example.com", DEMO_SECRET),
        ] {
            let err = h.manager.login(email, secret).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
            assert_eq!(h.manager.state(), SessionState::Unauthenticated);
            assert_eq!(saved_record(&h), None);

            let note = h.notifier.last().unwrap();
            assert_eq!(note.kind, NotificationKind::Failure);
            assert_eq!(note.message, "Invalid email or password");
        }
        assert!(h.navigator.history().is_empty());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let mut h = harness();
        let ann = h
            .manager
            .register("Ann", "ann@x.com", "secret123", Role::Patient)
            .await
            .unwrap();
        assert_eq!(ann.role, Role::Patient);
        assert_eq!(h.manager.identity(), Some(ann.clone()));
        assert_eq!(
            h.notifier.last().unwrap().message,
            "Welcome to HealthNest, Ann!"
        );

        let identity = h.manager.login("ann@x.com", "secret123").await.unwrap();
        assert_eq!(identity, ann);

        let err = h.manager.login("ann@x.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(h.manager.identity(), Some(ann.clone()));
        assert_eq!(
            parse_session_record(&saved_record(&h).unwrap()).unwrap(),
            ann
        );
    }

    #[tokio::test]
    async fn test_register_duplicate_address() {
        let mut h = harness();
        h.manager
            .register("Ann", "ann@x.com", "secret123", Role::Patient)
            .await
            .unwrap();
        let before_state = h.manager.state();
        let before_count = h.manager.credentials().len();

        let err = h
            .manager
            .register("Other Ann", "ann@x.com", "other", Role::Doctor)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AddressInUse));
        assert_eq!(h.manager.state(), before_state);
        assert_eq!(h.manager.credentials().len(), before_count);
        assert_eq!(h.notifier.last().unwrap().title, "Registration failed");
    }

    #[tokio::test]
    async fn test_register_demo_address_while_signed_out() {
        let mut h = harness();
        let err = h
            .manager
            .register("Imposter", "doctor@example.com", "x", Role::Doctor)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AddressInUse));
        assert_eq!(h.manager.state(), SessionState::Unauthenticated);
        assert_eq!(saved_record(&h), None);
    }

    #[tokio::test]
    async fn test_logout() {
        let mut h = harness();
        h.manager
            .login("patient@example.com", DEMO_SECRET)
            .await
            .unwrap();
        assert!(saved_record(&h).is_some());

        h.manager.logout();
        assert_eq!(h.manager.state(), SessionState::Unauthenticated);
        assert_eq!(saved_record(&h), None);
        assert_eq!(h.navigator.current().as_deref(), Some("/"));
        assert_eq!(h.notifier.last().unwrap().title, "Logged out");
        assert_eq!(
            h.manager.check("/patient-dashboard"),
            GuardDecision::RedirectToLogin
        );
    }

    #[tokio::test]
    async fn test_session_survives_restart() {
        let storage = Arc::new(MemoryStorage::default());
        let mut first = harness_with(storage.clone());
        first.manager.restore();
        let identity = first
            .manager
            .login("doctor@example.com", DEMO_SECRET)
            .await
            .unwrap();

        let mut second = harness_with(storage);
        let state = second.manager.restore();
        assert_eq!(state.identity().map(|i| i.id.as_str()), Some("d1"));
        assert_eq!(state.role(), Some(identity.role));
    }

    #[tokio::test]
    async fn test_observers_see_loading_during_login() {
        let mut h = harness();
        h.manager = h.manager.with_latency(Duration::from_millis(20));
        let mut rx = h.manager.subscribe();

        let login = h.manager.login("patient@example.com", DEMO_SECRET);
        let observe = async {
            rx.changed().await.unwrap();
            let seen = rx.borrow_and_update().clone();
            rx.changed().await.unwrap();
            let settled = rx.borrow_and_update().clone();
            (seen, settled)
        };
        let (result, (seen, settled)) = tokio::join!(login, observe);

        assert!(result.is_ok());
        assert_eq!(seen, SessionState::Loading);
        assert!(settled.is_authenticated());
    }

    #[tokio::test]
    async fn test_failed_login_never_leaves_loading() {
        let mut h = harness_with(Arc::new(MemoryStorage::default()));
        assert!(h.manager.is_loading());
        let _ = h.manager.login("nobody@example.com", "x").await;
        assert_eq!(h.manager.state(), SessionState::Unauthenticated);
    }
}
