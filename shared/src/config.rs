use std::env;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    /// Process-local maps; for local runs only.
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has unsupported value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings read from the Lambda environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub table_name: String,
    pub store_backend: StoreBackend,
    pub cors_allowed_origins: Vec<String>,
    pub log_format: LogFormat,
    pub cognito_user_pool_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_name: "coursefile".to_string(),
            store_backend: StoreBackend::DynamoDb,
            cors_allowed_origins: vec!["*".to_string()],
            log_format: LogFormat::Json,
            cognito_user_pool_id: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source; unset or blank values fall back to
    /// the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(table) = get("TABLE_NAME") {
            config.table_name = table;
        }

        if let Some(raw) = get("STORE_BACKEND") {
            config.store_backend = match raw.to_ascii_lowercase().as_str() {
                "dynamodb" | "dynamo" => StoreBackend::DynamoDb,
                "memory" => StoreBackend::Memory,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "STORE_BACKEND",
                        value: raw,
                    })
                }
            };
        }

        if let Some(raw) = get("CORS_ALLOWED_ORIGINS") {
            config.cors_allowed_origins = raw
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }

        if let Some(raw) = get("LOG_FORMAT") {
            config.log_format = match raw.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "text" | "pretty" => LogFormat::Text,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "LOG_FORMAT",
                        value: raw,
                    })
                }
            };
        }

        config.cognito_user_pool_id = get("COGNITO_USER_POOL_ID");
        Ok(config)
    }

    /// Origin to echo back, or the first allowed one when the request's is
    /// not on the list.
    pub fn cors_origin(&self, request_origin: Option<&str>) -> String {
        if self.cors_allowed_origins.iter().any(|o| o == "*") {
            return "*".to_string();
        }
        match request_origin {
            Some(origin) if self.cors_allowed_origins.iter().any(|o| o == origin) => {
                origin.to_string()
            }
            _ => self
                .cors_allowed_origins
                .first()
                .cloned()
                .unwrap_or_else(|| "*".to_string()),
        }
    }
}
