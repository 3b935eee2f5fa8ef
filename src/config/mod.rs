use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub security: SecurityConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the content-service REST API, e.g. http://localhost:1337/api
    pub base_url: String,
    /// API token injected as a Bearer credential on every upstream call
    pub api_token: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub session_expiry_hours: u64,
    pub admin_email: String,
    pub admin_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Minimum re-fetch interval for the client data layer; 0 disables
    pub dedup_window_ms: u64,
    pub timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("VITRINE_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("VITRINE_REQUEST_LOGGING") {
            self.server.enable_request_logging =
                v.parse().unwrap_or(self.server.enable_request_logging);
        }

        // Upstream overrides
        if let Ok(v) = env::var("VITRINE_UPSTREAM_URL") {
            self.upstream.base_url = v;
        }
        if let Ok(v) = env::var("VITRINE_UPSTREAM_TOKEN") {
            self.upstream.api_token = v;
        }
        if let Ok(v) = env::var("VITRINE_UPSTREAM_TIMEOUT_SECS") {
            self.upstream.timeout_secs = v.parse().unwrap_or(self.upstream.timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("VITRINE_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("VITRINE_SESSION_EXPIRY_HOURS") {
            self.security.session_expiry_hours =
                v.parse().unwrap_or(self.security.session_expiry_hours);
        }
        if let Ok(v) = env::var("VITRINE_ADMIN_EMAIL") {
            self.security.admin_email = v;
        }
        if let Ok(v) = env::var("VITRINE_ADMIN_PASSWORD") {
            self.security.admin_password = v;
        }

        // Client data layer overrides
        if let Ok(v) = env::var("VITRINE_CLIENT_DEDUP_MS") {
            self.client.dedup_window_ms = v.parse().unwrap_or(self.client.dedup_window_ms);
        }
        if let Ok(v) = env::var("VITRINE_CLIENT_TIMEOUT_SECS") {
            self.client.timeout_secs = v.parse().unwrap_or(self.client.timeout_secs);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                enable_request_logging: true,
            },
            upstream: UpstreamConfig {
                // Strapi's default local port
                base_url: "http://localhost:1337/api".to_string(),
                api_token: String::new(),
                timeout_secs: 30,
            },
            security: SecurityConfig {
                jwt_secret: "dev-secret-change-me".to_string(),
                session_expiry_hours: 24 * 7,
                admin_email: "admin@localhost".to_string(),
                admin_password: "admin".to_string(),
            },
            client: ClientConfig {
                dedup_window_ms: 2000,
                timeout_secs: 30,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                enable_request_logging: true,
            },
            upstream: UpstreamConfig {
                base_url: String::new(),
                api_token: String::new(),
                timeout_secs: 15,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                session_expiry_hours: 24,
                admin_email: String::new(),
                admin_password: String::new(),
            },
            client: ClientConfig {
                dedup_window_ms: 2000,
                timeout_secs: 15,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                enable_request_logging: false,
            },
            upstream: UpstreamConfig {
                base_url: String::new(),
                api_token: String::new(),
                timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                session_expiry_hours: 4,
                admin_email: String::new(),
                admin_password: String::new(),
            },
            client: ClientConfig {
                dedup_window_ms: 2000,
                timeout_secs: 10,
            },
        }
    }
}

// Global singleton config - initialized once at startup. Services built from
// it (auth, upstream client) are constructed explicitly and injected through
// router state, so tests never depend on this global.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.upstream.base_url, "http://localhost:1337/api");
        assert_eq!(config.client.dedup_window_ms, 2000);
        assert!(config.server.enable_request_logging);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.upstream.base_url.is_empty());
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.security.session_expiry_hours, 4);
        assert!(!config.server.enable_request_logging);
    }
}
