//! Tests for the gateway configuration and request building

#[cfg(test)]
mod tests {
    use crate::gateway::{create_http_client, GatewayConfig, PendingRequest};
    use reqwest::Method;
    use skybook_core::SkybookConfig;

    #[test]
    fn test_gateway_config_creation() {
        let config = GatewayConfig::default();
        assert_eq!(config.base_url, "http://localhost:801/api/v1");
        assert_eq!(config.timeout_seconds, 30);

        let config = GatewayConfig::new("https://api.example.com/api/v1").with_timeout(60);
        assert_eq!(config.base_url, "https://api.example.com/api/v1");
        assert_eq!(config.timeout_seconds, 60);
    }

    #[test]
    fn test_gateway_config_from_app_config() {
        let mut app_config = SkybookConfig::default();
        app_config.api.base_url = "https://booking.example.com/api/v1".to_string();
        app_config.api.timeout_seconds = 10;

        let config = GatewayConfig::from_config(&app_config);
        assert_eq!(config.base_url, "https://booking.example.com/api/v1");
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.user_agent, app_config.api.user_agent);
    }

    #[test]
    fn test_pending_request_starts_unretried() {
        let request = PendingRequest::new(Method::GET, "flights/");
        assert!(!request.retried);
        assert!(request.body.is_none());
        assert!(request.query.is_empty());
    }

    #[test]
    fn test_pending_request_with_json_body() {
        let request = PendingRequest::new(Method::POST, "bookings/")
            .with_json(&serde_json::json!({"flight_id": "abc"}))
            .unwrap();

        let body = request.body.unwrap();
        assert_eq!(body["flight_id"], "abc");
    }

    #[tokio::test]
    async fn test_http_client_creation() {
        let config = GatewayConfig::default();
        let client = create_http_client(&config);
        assert!(client.is_ok());
    }
}
