//! Core trait definitions

use crate::error::SkybookResult;
use crate::types::{Session, UserRecord};

/// Persisted session store - the single source of truth for the three flat
/// entries (access token, refresh token, serialized user record).
///
/// The gateway client reads tokens on every request and replaces the access
/// token after a refresh; the session manager owns the full lifecycle. No
/// other component touches the underlying storage directly.
pub trait SessionStore: Send + Sync {
    /// Current access token, if any
    fn access_token(&self) -> SkybookResult<Option<String>>;

    /// Current refresh token, if any
    fn refresh_token(&self) -> SkybookResult<Option<String>>;

    /// Persisted user record, if any
    fn user(&self) -> SkybookResult<Option<UserRecord>>;

    /// Persist a complete session (all three entries together)
    fn store_session(&self, session: &Session) -> SkybookResult<()>;

    /// Replace only the access token after a successful refresh
    fn replace_access_token(&self, access_token: &str) -> SkybookResult<()>;

    /// Clear all persisted entries together. Must not fail on missing state.
    fn clear(&self) -> SkybookResult<()>;
}
