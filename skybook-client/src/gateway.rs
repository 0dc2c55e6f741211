//! API gateway client
//!
//! Single HTTP client through which all REST traffic flows. Attaches the
//! bearer token from the session store on the way out and runs the
//! 401 refresh-and-retry-once cycle on the way back in.

use log::{debug, info, warn};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use skybook_core::{
    ErrorContext, SessionEvent, SessionStore, SkybookConfig, SkybookError, SkybookResult,
};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Configuration for the API gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL for the REST API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:801/api/v1".to_string(),
            timeout_seconds: 30,
            user_agent: "skybook/1.0".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Create a configuration for a specific base URL
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Derive the gateway configuration from the application configuration
    pub fn from_config(config: &SkybookConfig) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            timeout_seconds: config.api.timeout_seconds,
            user_agent: config.api.user_agent.clone(),
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }
}

/// An outbound request waiting to be issued.
///
/// Carries the `retried` flag the response interception uses as its
/// idempotent guard: a request that has already been through one
/// refresh-and-retry cycle is never retried again.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub retried: bool,
}

impl PendingRequest {
    /// Create a new request for a path relative to the gateway base URL
    pub fn new<S: Into<String>>(method: Method, path: S) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    /// Attach query parameters
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Attach a JSON body
    pub fn with_json<B: Serialize>(mut self, body: &B) -> SkybookResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// Response payload of the token refresh endpoint
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

/// The API gateway client
pub struct ApiGateway {
    /// Client for all intercepted traffic
    client: reqwest::Client,
    /// Out-of-band client for the refresh call, never intercepted
    refresh_client: reqwest::Client,
    config: GatewayConfig,
    store: Arc<dyn SessionStore>,
    session_events: broadcast::Sender<SessionEvent>,
}

impl ApiGateway {
    /// Create a new gateway over the given session store
    pub fn new(config: GatewayConfig, store: Arc<dyn SessionStore>) -> SkybookResult<Self> {
        let client = create_http_client(&config)?;
        let refresh_client = create_http_client(&config)?;
        let (session_events, _) = broadcast::channel(16);

        info!("Created API gateway for {}", config.base_url);

        Ok(Self {
            client,
            refresh_client,
            config,
            store,
            session_events,
        })
    }

    /// Subscribe to session lifecycle events emitted by the interception
    /// (currently only `SessionEvent::Expired` after an irrecoverable
    /// refresh failure)
    pub fn subscribe_session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.session_events.subscribe()
    }

    /// The configured base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Issue the request once, attaching the current access token if present.
    /// Absence of a token sends the request unauthenticated.
    async fn send_once(&self, request: &PendingRequest) -> SkybookResult<reqwest::Response> {
        let url = self.endpoint_url(&request.path);
        debug!("{} {}", request.method, url);

        let mut builder = self.client.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if let Some(token) = self.store.access_token()? {
            builder = builder.bearer_auth(token);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(|e| SkybookError::Network {
            message: format!("Request to {} failed: {}", url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("api_gateway").with_operation("send_once"),
        })
    }

    /// Send a request through the interception pipeline.
    ///
    /// Any response other than 401 is returned unchanged. A 401 on a request
    /// that has not been retried triggers exactly one refresh-and-retry
    /// cycle; the retry's result is returned as-is, even if it is another
    /// 401. An irrecoverable refresh failure clears the persisted session
    /// and broadcasts `SessionEvent::Expired`.
    pub async fn execute(&self, mut request: PendingRequest) -> SkybookResult<reqwest::Response> {
        let response = self.send_once(&request).await?;

        if response.status() != StatusCode::UNAUTHORIZED || request.retried {
            return Ok(response);
        }

        request.retried = true;

        let refresh_token = match self.store.refresh_token()? {
            Some(token) => token,
            None => {
                debug!(
                    "401 on {} {} without a refresh token on record, propagating",
                    request.method, request.path
                );
                return Ok(response);
            }
        };

        match self.refresh_access_token(&refresh_token).await {
            Ok(access) => {
                self.store.replace_access_token(&access)?;
                info!(
                    "Access token refreshed, retrying {} {}",
                    request.method, request.path
                );
                // The retry re-reads the store, so it picks up the token that
                // was just persisted
                self.send_once(&request).await
            }
            Err(e) => {
                warn!("Token refresh failed, terminating session: {}", e);
                self.store.clear()?;
                let _ = self.session_events.send(SessionEvent::Expired);
                Err(SkybookError::Authentication {
                    message: "Session expired and could not be refreshed".to_string(),
                    context: ErrorContext::new("api_gateway")
                        .with_operation("refresh_and_retry")
                        .with_suggestion("Log in again"),
                })
            }
        }
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Goes through the out-of-band client so the call itself is never
    /// intercepted.
    async fn refresh_access_token(&self, refresh_token: &str) -> SkybookResult<String> {
        let url = self.endpoint_url("auth/refresh");

        let response = self
            .refresh_client
            .post(&url)
            .json(&serde_json::json!({ "refresh": refresh_token }))
            .send()
            .await
            .map_err(|e| SkybookError::Network {
                message: format!("Refresh request failed: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("api_gateway").with_operation("refresh_access_token"),
            })?;

        if !response.status().is_success() {
            return Err(handle_response_error(response, "refresh_access_token").await);
        }

        let body: RefreshResponse =
            response.json().await.map_err(|e| SkybookError::Api {
                message: format!("Failed to parse refresh response: {}", e),
                status: None,
                source: Some(Box::new(e)),
                context: ErrorContext::new("api_gateway").with_operation("refresh_access_token"),
            })?;

        Ok(body.access)
    }

    // Typed conveniences used by the endpoint clients. All of them go
    // through `execute`, so all of them inherit the interception.

    /// GET a JSON resource
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> SkybookResult<T> {
        let response = self.execute(PendingRequest::new(Method::GET, path)).await?;
        into_json(response, path).await
    }

    /// GET a JSON resource with query parameters
    pub async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> SkybookResult<T> {
        let response = self
            .execute(PendingRequest::new(Method::GET, path).with_query(query))
            .await?;
        into_json(response, path).await
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> SkybookResult<T> {
        let response = self
            .execute(PendingRequest::new(Method::POST, path).with_json(body)?)
            .await?;
        into_json(response, path).await
    }

    /// PUT a JSON body and decode the JSON response
    pub async fn put_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> SkybookResult<T> {
        let response = self
            .execute(PendingRequest::new(Method::PUT, path).with_json(body)?)
            .await?;
        into_json(response, path).await
    }

    /// PATCH a JSON body and decode the JSON response
    pub async fn patch_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> SkybookResult<T> {
        let response = self
            .execute(PendingRequest::new(Method::PATCH, path).with_json(body)?)
            .await?;
        into_json(response, path).await
    }

    /// PATCH without a body and decode the JSON response
    pub async fn patch_empty<T: DeserializeOwned>(&self, path: &str) -> SkybookResult<T> {
        let response = self
            .execute(PendingRequest::new(Method::PATCH, path))
            .await?;
        into_json(response, path).await
    }

    /// DELETE a resource, discarding any response body
    pub async fn delete(&self, path: &str) -> SkybookResult<()> {
        let response = self
            .execute(PendingRequest::new(Method::DELETE, path))
            .await?;

        if !response.status().is_success() {
            return Err(handle_response_error(response, path).await);
        }

        Ok(())
    }
}

/// Helper function to create an HTTP client with common configuration
pub(crate) fn create_http_client(config: &GatewayConfig) -> SkybookResult<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();

    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_str(&config.user_agent).map_err(|e| {
            SkybookError::Config {
                message: format!("Invalid user agent: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            }
        })?,
    );

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| SkybookError::Internal {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("http_client").with_operation("create_client"),
        })?;

    Ok(client)
}

/// Decode a response body, converting non-success statuses into API errors
pub(crate) async fn into_json<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: &str,
) -> SkybookResult<T> {
    if !response.status().is_success() {
        return Err(handle_response_error(response, operation).await);
    }

    response.json().await.map_err(|e| SkybookError::Api {
        message: format!("Failed to parse response body: {}", e),
        status: None,
        source: Some(Box::new(e)),
        context: ErrorContext::new("api_gateway").with_operation(operation),
    })
}

/// Helper function to convert a failed HTTP response into an error
pub(crate) async fn handle_response_error(
    response: reqwest::Response,
    operation: &str,
) -> SkybookError {
    let status = response.status();
    let url = response.url().clone();

    let error_body = response.text().await.unwrap_or_default();

    SkybookError::Api {
        message: format!(
            "HTTP {} error for {}: {}",
            status.as_u16(),
            url,
            if error_body.is_empty() {
                status.canonical_reason().unwrap_or("Unknown error")
            } else {
                &error_body
            }
        ),
        status: Some(status.as_u16()),
        source: None,
        context: ErrorContext::new("api_gateway")
            .with_operation(operation)
            .with_suggestion(match status.as_u16() {
                401 => "Check your credentials or log in again",
                403 => "Check your role permissions",
                404 => "Resource not found or not accessible",
                _ => "Check network connectivity and API status",
            }),
    }
}
