//! Route guard
//!
//! Pure predicate evaluated per navigation. While hydration is in progress
//! the decision is deferred, which is what prevents the flash-redirect to
//! login on a reload.

use super::manager::AuthState;
use skybook_core::Role;

/// Outcome of evaluating a navigation request
#[derive(Debug, Clone, PartialEq)]
pub enum RouteDecision {
    /// Hydration has not finished: render a neutral loading state
    Pending,
    /// Navigation may proceed
    Grant,
    /// Not authenticated: go to the login view, preserving the originally
    /// requested location for the post-login return
    RedirectToLogin { from: String },
    /// Authenticated but the role is not allowed: go to the default landing
    /// route. This is an authorization failure, not an authentication one,
    /// so it must not land on the login view.
    RedirectToDefault,
}

/// Role-aware navigation guard
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    allowed_roles: Option<Vec<Role>>,
}

impl RouteGuard {
    /// Guard that admits any authenticated user
    pub fn any_authenticated() -> Self {
        Self {
            allowed_roles: None,
        }
    }

    /// Guard that admits only the given roles
    pub fn allow_roles<I: IntoIterator<Item = Role>>(roles: I) -> Self {
        Self {
            allowed_roles: Some(roles.into_iter().collect()),
        }
    }

    /// Evaluate a navigation request against the current auth state
    pub fn evaluate(&self, state: &AuthState, requested: &str) -> RouteDecision {
        match state {
            AuthState::Uninitialized | AuthState::Hydrating => RouteDecision::Pending,
            AuthState::Anonymous => RouteDecision::RedirectToLogin {
                from: requested.to_string(),
            },
            AuthState::Authenticated { user, .. } => match &self.allowed_roles {
                Some(roles) if !roles.contains(&user.role) => RouteDecision::RedirectToDefault,
                _ => RouteDecision::Grant,
            },
        }
    }
}
