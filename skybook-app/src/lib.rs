//! Skybook Application Layer - session lifecycle and notification delivery
//!
//! Builds the user-facing behavior on top of the transport crate:
//!
//! - Persisted session store implementations
//! - Auth session manager (hydrate/login/logout state machine)
//! - Route guard predicates
//! - Notification channel (WebSocket push merged with REST state)
//!
//! ## Architecture
//!
//! This crate follows a clear separation between:
//! - **Transport** (skybook-client): HTTP gateway and typed endpoint clients
//! - **Application** (this crate): session and notification lifecycle
//! - **Presentation** (skybook-cli): the terminal front end

pub mod auth;
pub mod notifications;

pub use auth::{
    AuthBackend, AuthManager, AuthState, FileSessionStore, MemorySessionStore, RouteDecision,
    RouteGuard,
};
pub use notifications::{FeedUpdate, NotificationChannel, NotificationFeed, VISIBLE_LIMIT};

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Core error: {0}")]
    Core(#[from] skybook_core::SkybookError),

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Notification channel error: {message}")]
    Channel { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a session error
    pub fn session<S: Into<String>>(message: S) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Create a channel error
    pub fn channel<S: Into<String>>(message: S) -> Self {
        Self::Channel {
            message: message.into(),
        }
    }
}
