//! Typed process configuration (env var list).
//!
//! Config *loading* (file formats, secrets managers) is out of scope;
//! this is only the struct every other crate consumes, populated from
//! environment variables at process start.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub llm_primary_api_key: String,
    pub llm_secondary_api_key: String,
    pub rerank_api_key: String,
    pub relational_store_url: String,
    pub key_value_store_url: String,
    pub vector_store_host: String,
    pub vector_store_port: u16,
    pub vector_store_api_key: Option<String>,
    pub jwt_secret: String,
    pub api_key_prefix: String,
    pub app_env: String,
    pub log_level: String,
    pub idle_session_timeout_minutes: u64,
    pub max_sessions_per_tenant: u32,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            llm_primary_api_key: required_env("LLM_PRIMARY_API_KEY")?,
            llm_secondary_api_key: required_env("LLM_SECONDARY_API_KEY")?,
            rerank_api_key: required_env("RERANK_API_KEY")?,
            relational_store_url: required_env("RELATIONAL_STORE_URL")?,
            key_value_store_url: required_env("KEY_VALUE_STORE_URL")?,
            vector_store_host: env::var("VECTOR_STORE_HOST").unwrap_or_else(|_| "localhost".to_string()),
            vector_store_port: parse_env_or("VECTOR_STORE_PORT", 6334),
            vector_store_api_key: env::var("VECTOR_STORE_API_KEY").ok(),
            jwt_secret: required_env("JWT_SECRET")?,
            api_key_prefix: env::var("API_KEY_PREFIX").unwrap_or_else(|_| "ent_live_".to_string()),
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            idle_session_timeout_minutes: parse_env_or("IDLE_SESSION_TIMEOUT_MINUTES", 30),
            max_sessions_per_tenant: parse_env_or("MAX_SESSIONS_PER_TENANT", 1000),
        })
    }

    pub fn idle_session_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_session_timeout_minutes * 60)
    }

    /// TTL for the per-session billing counters: 2x the idle timeout.
    pub fn billing_counter_ttl(&self) -> Duration {
        self.idle_session_timeout() * 2
    }
}

#[derive(Debug, thiserror::Error)]
#[error("missing required environment variable: {0}")]
pub struct ConfigError(pub String);

fn required_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError(key.to_string()))
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_counter_ttl_is_twice_idle_timeout() {
        let settings = Settings {
            llm_primary_api_key: String::new(),
            llm_secondary_api_key: String::new(),
            rerank_api_key: String::new(),
            relational_store_url: String::new(),
            key_value_store_url: String::new(),
            vector_store_host: String::new(),
            vector_store_port: 0,
            vector_store_api_key: None,
            jwt_secret: String::new(),
            api_key_prefix: String::new(),
            app_env: String::new(),
            log_level: String::new(),
            idle_session_timeout_minutes: 30,
            max_sessions_per_tenant: 1,
        };
        assert_eq!(settings.billing_counter_ttl(), Duration::from_secs(60 * 60));
    }
}
