// Wardrobe - Session Store
// Current authenticated identity, published to subscribers on every auth change.

pub mod keychain;
pub mod validation;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WardrobeError};
use validation::CredentialsForm;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: UserIdentity,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

type Callback = Arc<dyn Fn(AuthEvent, Option<&Session>) + Send + Sync>;

#[derive(Default)]
struct SessionState {
    session: Option<Session>,
    initialized: bool,
}

struct Inner {
    state: Mutex<SessionState>,
    subscribers: Mutex<Vec<(u64, Callback)>>,
    next_id: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Process-wide holder of the current session. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(SessionState::default()),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a callback. It is invoked right away with `InitialSession`
    /// and then on every published event until the subscription is dropped.
    ///
    /// The initial call runs while registration is locked, so a concurrent
    /// `publish` is delivered after it. That call must not subscribe or drop
    /// a subscription itself.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(AuthEvent, Option<&Session>) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let callback: Callback = Arc::new(callback);

        let mut subscribers = lock(&self.inner.subscribers);
        let current = {
            let mut state = lock(&self.inner.state);
            state.initialized = true;
            state.session.clone()
        };
        callback(AuthEvent::InitialSession, current.as_ref());
        subscribers.push((id, callback));
        drop(subscribers);

        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Replace the session and notify every subscriber.
    pub fn publish(&self, event: AuthEvent, session: Option<Session>) {
        {
            let mut state = lock(&self.inner.state);
            state.session = session.clone();
            state.initialized = true;
        }
        log::info!(
            "Auth event {:?} (user: {})",
            event,
            session.as_ref().map(|s| s.user.id.as_str()).unwrap_or("none")
        );

        // Callbacks run outside the lock so they may subscribe or unsubscribe.
        let callbacks: Vec<Callback> = lock(&self.inner.subscribers)
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(event, session.as_ref());
        }
    }

    pub fn current(&self) -> Option<Session> {
        lock(&self.inner.state).session.clone()
    }

    pub fn is_initialized(&self) -> bool {
        lock(&self.inner.state).initialized
    }

    pub fn owner_id(&self) -> Option<String> {
        lock(&self.inner.state).session.as_ref().map(|s| s.user.id.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        lock(&self.inner.state)
            .session
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// Owner id of the signed-in user, or an auth error.
    pub fn require_owner(&self) -> Result<String> {
        self.owner_id()
            .ok_or_else(|| WardrobeError::Auth("Please log in to continue".to_string()))
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        lock(&self.inner.subscribers).len()
    }
}

/// Handle returned by `subscribe`. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    store: Weak<Inner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            lock(&inner.subscribers).retain(|(id, _)| *id != self.id);
        }
    }
}

/// Account operations against the auth provider.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Create an account. The user signs in separately afterwards.
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity>;

    async fn sign_out(&self, session: &Session) -> Result<()>;

    async fn reset_password(&self, email: &str) -> Result<()>;
}

/// Form validation + auth backend + session publication.
#[derive(Clone)]
pub struct AuthService {
    backend: Arc<dyn AuthBackend>,
    store: SessionStore,
}

impl AuthService {
    pub fn new(backend: Arc<dyn AuthBackend>, store: SessionStore) -> Self {
        Self { backend, store }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub async fn sign_in(&self, form: &CredentialsForm) -> Result<Session> {
        validation::validate_sign_in(form)?;
        let session = self.backend.sign_in(form.email.trim(), &form.password).await?;
        self.store.publish(AuthEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    pub async fn sign_up(&self, form: &CredentialsForm) -> Result<UserIdentity> {
        validation::validate_sign_up(form)?;
        let user = self.backend.sign_up(form.email.trim(), &form.password).await?;
        log::info!("Created account {}", user.id);
        Ok(user)
    }

    /// Clear the local session. A backend failure is logged, never kept as signed in.
    pub async fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.store.current() {
            if let Err(e) = self.backend.sign_out(&session).await {
                log::warn!("Sign out request failed: {}", e);
            }
        }
        self.store.publish(AuthEvent::SignedOut, None);
        Ok(())
    }

    pub async fn reset_password(&self, email: &str) -> Result<()> {
        validation::validate_reset_email(email)?;
        self.backend.reset_password(email.trim()).await
    }

    /// Restore a previously persisted session (e.g. from the keychain).
    pub fn restore(&self, session: Option<Session>) {
        match session {
            Some(s) => self.store.publish(AuthEvent::TokenRefreshed, Some(s)),
            None => self.store.publish(AuthEvent::InitialSession, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn session(id: &str) -> Session {
        Session {
            user: UserIdentity {
                id: id.to_string(),
                email: Some(format!("{}@example.com", id)),
            },
            access_token: format!("token-{}", id),
            refresh_token: None,
            expires_at: None,
        }
    }

    struct StubAuth {
        fail_sign_out: bool,
    }

    #[async_trait]
    impl AuthBackend for StubAuth {
        async fn sign_in(&self, email: &str, _password: &str) -> Result<Session> {
            Ok(session(email.split('@').next().unwrap_or("user")))
        }

        async fn sign_up(&self, email: &str, _password: &str) -> Result<UserIdentity> {
            Ok(UserIdentity {
                id: "new-user".to_string(),
                email: Some(email.to_string()),
            })
        }

        async fn sign_out(&self, _session: &Session) -> Result<()> {
            if self.fail_sign_out {
                Err(WardrobeError::Auth("network down".to_string()))
            } else {
                Ok(())
            }
        }

        async fn reset_password(&self, _email: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_subscribe_receives_initial_session() {
        let store = SessionStore::new();
        assert!(!store.is_initialized());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_cb = Arc::clone(&seen);
        let _sub = store.subscribe(move |event, session| {
            seen_cb.lock().unwrap().push((event, session.map(|s| s.user.id.clone())));
        });

        assert!(store.is_initialized());
        assert_eq!(seen.lock().unwrap().as_slice(), &[(AuthEvent::InitialSession, None)]);

        store.publish(AuthEvent::SignedIn, Some(session("u1")));
        assert_eq!(
            seen.lock().unwrap().last().cloned(),
            Some((AuthEvent::SignedIn, Some("u1".to_string())))
        );
        assert_eq!(store.owner_id().as_deref(), Some("u1"));
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let store = SessionStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_cb = Arc::clone(&calls);
        let sub = store.subscribe(move |_, _| {
            calls_cb.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(store.subscriber_count(), 1);

        sub.unsubscribe();
        assert_eq!(store.subscriber_count(), 0);

        store.publish(AuthEvent::SignedOut, None);
        // Only the initial callback ran
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_initial_session_never_arrives_after_newer_event() {
        let store = SessionStore::new();
        let publisher = {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..200 {
                    store.publish(AuthEvent::SignedIn, Some(session(&format!("u{}", i))));
                }
            })
        };

        let mut logs = Vec::new();
        let mut subs = Vec::new();
        for _ in 0..50 {
            let log = Arc::new(Mutex::new(Vec::new()));
            let log_cb = Arc::clone(&log);
            subs.push(store.subscribe(move |_, session| {
                log_cb.lock().unwrap().push(session.map(|s| s.user.id.clone()));
            }));
            logs.push(log);
        }
        publisher.join().unwrap();

        let latest = store.owner_id();
        assert_eq!(latest.as_deref(), Some("u199"));
        for log in logs {
            assert_eq!(log.lock().unwrap().last().cloned().flatten(), latest);
        }
    }

    #[test]
    fn test_require_owner_without_session() {
        let store = SessionStore::new();
        assert!(matches!(store.require_owner(), Err(WardrobeError::Auth(_))));
    }

    #[tokio::test]
    async fn test_sign_in_publishes_session() {
        let store = SessionStore::new();
        let auth = AuthService::new(Arc::new(StubAuth { fail_sign_out: false }), store.clone());
        let form = CredentialsForm::sign_in("ana@example.com", "secret1");

        let s = auth.sign_in(&form).await.unwrap();
        assert_eq!(s.user.id, "ana");
        assert_eq!(store.access_token().as_deref(), Some("token-ana"));
    }

    #[tokio::test]
    async fn test_sign_in_rejects_invalid_form_before_backend() {
        let store = SessionStore::new();
        let auth = AuthService::new(Arc::new(StubAuth { fail_sign_out: false }), store.clone());
        let form = CredentialsForm::sign_in("ana@example.com", "123");

        let err = auth.sign_in(&form).await.unwrap_err();
        assert!(matches!(err, WardrobeError::Validation(_)));
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_even_if_backend_fails() {
        let store = SessionStore::new();
        let auth = AuthService::new(Arc::new(StubAuth { fail_sign_out: true }), store.clone());
        store.publish(AuthEvent::SignedIn, Some(session("u2")));

        auth.sign_out().await.unwrap();
        assert!(store.current().is_none());
    }
}
