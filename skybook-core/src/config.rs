//! Configuration management

use crate::error::{ErrorContext, SkybookError, SkybookResult};
use crate::types::{ApiConfig, SkybookConfig, StorageConfig, WebSocketConfig};

use std::path::Path;

/// Environment variable overriding the REST base URL
pub const ENV_API_URL: &str = "SKYBOOK_API_URL";
/// Environment variable overriding the WebSocket base URL
pub const ENV_WS_URL: &str = "SKYBOOK_WS_URL";

impl Default for SkybookConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:801/api/v1".to_string(),
                timeout_seconds: 30,
                user_agent: "skybook/1.0".to_string(),
            },
            websocket: WebSocketConfig {
                base_url: "ws://localhost:801".to_string(),
            },
            storage: StorageConfig {
                session_file: "~/.skybook/session.json".to_string(),
            },
        }
    }
}

impl SkybookConfig {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> SkybookResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SkybookError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: SkybookConfig = toml::from_str(&content).map_err(|e| SkybookError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SkybookResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| SkybookError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| SkybookError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Apply environment overrides on top of whatever was loaded
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.is_empty() {
                self.api.base_url = url;
            }
        }
        if let Ok(url) = std::env::var(ENV_WS_URL) {
            if !url.is_empty() {
                self.websocket.base_url = url;
            }
        }
        self
    }

    /// 验证配置
    pub fn validate(&self) -> SkybookResult<()> {
        if self.api.base_url.is_empty() {
            return Err(crate::config_error!("API base_url must not be empty", "config"));
        }

        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(SkybookError::Config {
                message: format!("API base_url has no http(s) scheme: {}", self.api.base_url),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use an http:// or https:// URL"),
            });
        }

        if !self.websocket.base_url.starts_with("ws://")
            && !self.websocket.base_url.starts_with("wss://")
        {
            return Err(SkybookError::Config {
                message: format!(
                    "WebSocket base_url has no ws(s) scheme: {}",
                    self.websocket.base_url
                ),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use a ws:// or wss:// URL"),
            });
        }

        if self.api.timeout_seconds == 0 {
            return Err(crate::config_error!(
                "API timeout_seconds must be greater than 0",
                "config"
            ));
        }

        Ok(())
    }
}
