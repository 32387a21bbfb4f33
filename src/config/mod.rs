use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub oracle: OracleConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Header carrying the caller's username. Stored lowercase.
    pub identity_header: String,
    pub default_list_limit: u32,
    pub max_list_limit: u32,
    pub bulk_limit: u32,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid oracle base URL '{0}'")]
    InvalidOracleUrl(String),

    #[error("Oracle timeout must be greater than zero")]
    ZeroOracleTimeout,

    #[error("Identity header name must not be empty")]
    EmptyIdentityHeader,

    #[error("Identity header name '{0}' is not a valid HTTP header name")]
    InvalidIdentityHeader(String),

    #[error("List limits are inconsistent: default {default} > max {max}")]
    InconsistentListLimits { default: u32, max: u32 },
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        Self::preset(environment).with_env_overrides()
    }

    pub fn preset(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("PROFILE_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Oracle overrides
        if let Ok(v) = env::var("ORACLE_BASE_URL") {
            self.oracle.base_url = v;
        }
        if let Ok(v) = env::var("ORACLE_TIMEOUT_SECS") {
            self.oracle.timeout_secs = v.parse().unwrap_or(self.oracle.timeout_secs);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_IDENTITY_HEADER") {
            self.api.identity_header = v.trim().to_ascii_lowercase();
        }
        if let Ok(v) = env::var("API_DEFAULT_LIST_LIMIT") {
            self.api.default_list_limit = v.parse().unwrap_or(self.api.default_list_limit);
        }
        if let Ok(v) = env::var("API_MAX_LIST_LIMIT") {
            self.api.max_list_limit = v.parse().unwrap_or(self.api.max_list_limit);
        }
        if let Ok(v) = env::var("API_BULK_LIMIT") {
            self.api.bulk_limit = v.parse().unwrap_or(self.api.bulk_limit);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    /// Checks settings that would otherwise only fail at request time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.oracle.base_url)
            .map_err(|_| ConfigError::InvalidOracleUrl(self.oracle.base_url.clone()))?;

        if self.oracle.timeout_secs == 0 {
            return Err(ConfigError::ZeroOracleTimeout);
        }
        if self.api.identity_header.trim().is_empty() {
            return Err(ConfigError::EmptyIdentityHeader);
        }
        if axum::http::HeaderName::from_bytes(self.api.identity_header.as_bytes()).is_err() {
            return Err(ConfigError::InvalidIdentityHeader(self.api.identity_header.clone()));
        }
        if self.api.default_list_limit > self.api.max_list_limit {
            return Err(ConfigError::InconsistentListLimits {
                default: self.api.default_list_limit,
                max: self.api.max_list_limit,
            });
        }
        Ok(())
    }

    /// Clamp a caller-supplied list limit into the configured range.
    pub fn list_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.api.default_list_limit)
            .clamp(1, self.api.max_list_limit.max(1))
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 8000 },
            oracle: OracleConfig {
                base_url: "http://localhost:9000/verify".to_string(),
                timeout_secs: 5,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                identity_header: "x-username".to_string(),
                default_list_limit: 50,
                max_list_limit: 1000,
                bulk_limit: 5000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 8000 },
            oracle: OracleConfig {
                base_url: "https://oracle.staging.example.com/verify".to_string(),
                timeout_secs: 5,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                identity_header: "x-username".to_string(),
                default_list_limit: 50,
                max_list_limit: 500,
                bulk_limit: 2000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 8000 },
            oracle: OracleConfig {
                base_url: "https://oracle.example.com/verify".to_string(),
                timeout_secs: 5,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                identity_header: "x-username".to_string(),
                default_list_limit: 50,
                max_list_limit: 100,
                bulk_limit: 1000,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}
