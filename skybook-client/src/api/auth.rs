//! Authentication and profile endpoints

use crate::gateway::ApiGateway;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use skybook_core::{Role, SkybookError, SkybookResult, UserRecord};
use std::sync::Arc;

/// Successful login payload: tokens and user record arrive together
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserRecord,
}

#[derive(Debug, Clone, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Registration payload
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Partial profile update; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Client for the authentication endpoints
pub struct AuthApi {
    gateway: Arc<ApiGateway>,
}

impl AuthApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    /// Exchange credentials for a token pair and user record.
    ///
    /// Bad credentials surface as an `Authentication` error; the caller's
    /// session state is untouched either way.
    pub async fn login(&self, email: &str, password: &str) -> SkybookResult<LoginResponse> {
        debug!("Logging in as {}", email);

        let result: SkybookResult<LoginResponse> = self
            .gateway
            .post_json("auth/login", &LoginRequest { email, password })
            .await;

        match result {
            Ok(response) => {
                info!("Login succeeded for {}", response.user.email);
                Ok(response)
            }
            Err(e) if e.status() == Some(401) => Err(SkybookError::Authentication {
                message: "Invalid email or password".to_string(),
                context: skybook_core::ErrorContext::new("auth_api")
                    .with_operation("login")
                    .with_suggestion("Check the email and password"),
            }),
            Err(e) => Err(e),
        }
    }

    /// Create a new account
    pub async fn register(&self, request: &RegisterRequest) -> SkybookResult<UserRecord> {
        self.gateway.post_json("auth/register", request).await
    }

    /// Fetch the profile of the authenticated user
    pub async fn me(&self) -> SkybookResult<UserRecord> {
        self.gateway.get_json("users/me").await
    }

    /// Update the authenticated user's profile
    pub async fn update_profile(&self, update: &ProfileUpdate) -> SkybookResult<UserRecord> {
        self.gateway.put_json("users/me", update).await
    }
}
