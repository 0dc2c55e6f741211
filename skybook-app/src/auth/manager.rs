//! Auth session manager
//!
//! State machine over the persisted session: hydrates once at startup,
//! handles login/logout, and reacts to forced expiry from the gateway.

use crate::AppResult;
use async_trait::async_trait;
use skybook_client::{AuthApi, LoginResponse};
use skybook_core::{Session, SessionEvent, SessionStore, SkybookResult, UserRecord};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Authentication state observed by consumers.
///
/// Consumers must treat `Uninitialized` and `Hydrating` as loading and must
/// not take role-gated decisions until one of the terminal states is reached.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Uninitialized,
    Hydrating,
    Authenticated {
        user: UserRecord,
        access_token: String,
    },
    Anonymous,
}

impl AuthState {
    /// Whether hydration has not finished yet
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Uninitialized | AuthState::Hydrating)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&UserRecord> {
        match self {
            AuthState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }
}

/// Seam to the authentication endpoint, so the manager can be exercised
/// without a live backend
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> SkybookResult<LoginResponse>;
}

#[async_trait]
impl AuthBackend for AuthApi {
    async fn login(&self, email: &str, password: &str) -> SkybookResult<LoginResponse> {
        AuthApi::login(self, email, password).await
    }
}

/// Session lifecycle manager
pub struct AuthManager {
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn AuthBackend>,
    state: watch::Sender<AuthState>,
}

impl AuthManager {
    /// Create a manager in the `Uninitialized` state
    pub fn new(store: Arc<dyn SessionStore>, backend: Arc<dyn AuthBackend>) -> Self {
        let (state, _) = watch::channel(AuthState::Uninitialized);
        Self {
            store,
            backend,
            state,
        }
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Current state snapshot
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Currently authenticated user, if any
    pub fn current_user(&self) -> Option<UserRecord> {
        self.state().user().cloned()
    }

    /// Reconstruct the session from persisted storage.
    ///
    /// Runs exactly once per process: subsequent calls return the current
    /// state untouched. Authenticated only when the user record and access
    /// token are both present; anything else (including a broken store) ends
    /// in `Anonymous`.
    pub fn hydrate(&self) -> AuthState {
        if !matches!(*self.state.borrow(), AuthState::Uninitialized) {
            debug!("Hydration already ran, keeping current state");
            return self.state();
        }

        self.state.send_replace(AuthState::Hydrating);

        let loaded = (|| -> SkybookResult<Option<(UserRecord, String)>> {
            Ok(
                match (self.store.user()?, self.store.access_token()?) {
                    (Some(user), Some(token)) => Some((user, token)),
                    _ => None,
                },
            )
        })();

        let next = match loaded {
            Ok(Some((user, access_token))) => {
                info!("Hydrated session for {}", user.email);
                AuthState::Authenticated { user, access_token }
            }
            Ok(None) => {
                debug!("No persisted session, starting anonymous");
                AuthState::Anonymous
            }
            Err(e) => {
                warn!("Hydration failed, starting anonymous: {}", e);
                AuthState::Anonymous
            }
        };

        self.state.send_replace(next.clone());
        next
    }

    /// Authenticate with credentials.
    ///
    /// On success the access token, refresh token, and user record are
    /// persisted together and the state becomes `Authenticated`. On any
    /// failure the error is returned and neither the state nor the persisted
    /// store is touched.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<UserRecord> {
        let response = self.backend.login(email, password).await?;

        let session = Session {
            access_token: response.access,
            refresh_token: response.refresh,
            user: response.user,
        };
        self.store.store_session(&session)?;

        info!("Logged in as {}", session.user.email);
        self.state.send_replace(AuthState::Authenticated {
            user: session.user.clone(),
            access_token: session.access_token.clone(),
        });

        Ok(session.user)
    }

    /// Clear the session unconditionally and become anonymous.
    ///
    /// Cannot fail: a store that refuses to clear is logged and the in-memory
    /// state transitions anyway.
    pub fn logout(&self) {
        if let Err(e) = self.store.clear() {
            warn!("Failed to clear persisted session: {}", e);
        }
        self.state.send_replace(AuthState::Anonymous);
        info!("Logged out");
    }

    /// Bridge gateway session events into the state machine: an `Expired`
    /// event applies the same transition as an explicit logout.
    pub fn watch_session_events(
        self: &Arc<Self>,
        mut events: broadcast::Receiver<SessionEvent>,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::Expired) => {
                        warn!("Session expired, forcing logout");
                        manager.logout();
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Session event stream lagged by {}", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemorySessionStore;
    use skybook_core::{ErrorContext, Role, SkybookError};
    use uuid::Uuid;

    struct MockBackend {
        /// Password accepted by the mock; everything else is rejected
        password: String,
    }

    #[async_trait]
    impl AuthBackend for MockBackend {
        async fn login(&self, email: &str, password: &str) -> SkybookResult<LoginResponse> {
            if password == self.password {
                Ok(LoginResponse {
                    access: "access-1".to_string(),
                    refresh: "refresh-1".to_string(),
                    user: UserRecord {
                        id: Uuid::new_v4(),
                        email: email.to_string(),
                        first_name: "Amelia".to_string(),
                        last_name: "Earhart".to_string(),
                        role: Role::Client,
                        created_at: None,
                    },
                })
            } else {
                Err(SkybookError::Authentication {
                    message: "Invalid email or password".to_string(),
                    context: ErrorContext::new("mock_backend"),
                })
            }
        }
    }

    fn manager_with(store: Arc<MemorySessionStore>) -> AuthManager {
        AuthManager::new(
            store,
            Arc::new(MockBackend {
                password: "correct-horse".to_string(),
            }),
        )
    }

    #[tokio::test]
    async fn test_hydrate_with_empty_store_is_anonymous() {
        let manager = manager_with(Arc::new(MemorySessionStore::new()));

        assert!(manager.state().is_loading());
        let state = manager.hydrate();
        assert_eq!(state, AuthState::Anonymous);
        assert!(!manager.state().is_loading());
    }

    #[tokio::test]
    async fn test_login_persists_and_hydration_reconstructs() {
        let store = Arc::new(MemorySessionStore::new());
        let manager = manager_with(store.clone());
        manager.hydrate();

        let user = manager
            .login("amelia@example.com", "correct-horse")
            .await
            .unwrap();
        assert!(manager.state().is_authenticated());

        // All three entries were persisted together
        assert_eq!(store.access_token().unwrap().as_deref(), Some("access-1"));
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh-1"));
        assert_eq!(store.user().unwrap().unwrap().id, user.id);

        // Simulated reload: a fresh manager over the same store hydrates to
        // the same authenticated state
        let reloaded = manager_with(store.clone());
        let state = reloaded.hydrate();
        match state {
            AuthState::Authenticated {
                user: hydrated,
                access_token,
            } => {
                assert_eq!(hydrated.id, user.id);
                assert_eq!(access_token, "access-1");
            }
            other => panic!("expected authenticated state, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_login_is_a_noop_on_state_and_store() {
        let store = Arc::new(MemorySessionStore::new());
        let manager = manager_with(store.clone());
        manager.hydrate();

        let result = manager.login("amelia@example.com", "wrong").await;
        assert!(result.is_err());

        assert_eq!(manager.state(), AuthState::Anonymous);
        assert!(store.access_token().unwrap().is_none());
        assert!(store.user().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let store = Arc::new(MemorySessionStore::new());
        let manager = manager_with(store.clone());
        manager.hydrate();
        manager
            .login("amelia@example.com", "correct-horse")
            .await
            .unwrap();

        manager.logout();

        assert_eq!(manager.state(), AuthState::Anonymous);
        assert!(store.access_token().unwrap().is_none());
        assert!(store.refresh_token().unwrap().is_none());
        assert!(store.user().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_hydrate_runs_only_once() {
        let store = Arc::new(MemorySessionStore::new());
        let manager = manager_with(store.clone());
        manager.hydrate();
        manager
            .login("amelia@example.com", "correct-horse")
            .await
            .unwrap();

        // A second hydrate must not reset the authenticated state
        let state = manager.hydrate();
        assert!(state.is_authenticated());
    }

    #[tokio::test]
    async fn test_expired_event_forces_logout() {
        let store = Arc::new(MemorySessionStore::new());
        let manager = Arc::new(manager_with(store.clone()));
        manager.hydrate();
        manager
            .login("amelia@example.com", "correct-horse")
            .await
            .unwrap();

        let (tx, rx) = broadcast::channel(4);
        let handle = manager.watch_session_events(rx);

        let mut states = manager.subscribe();
        tx.send(SessionEvent::Expired).unwrap();

        // Wait for the bridge task to apply the transition
        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            loop {
                states.changed().await.unwrap();
                if *states.borrow() == AuthState::Anonymous {
                    break;
                }
            }
        })
        .await
        .unwrap();

        assert!(store.access_token().unwrap().is_none());
        handle.abort();
    }
}
