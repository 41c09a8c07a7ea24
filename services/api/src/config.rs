//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Settings for the hosted auth/storage backend.
#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub service_role_key: String,
}

/// Settings for the in-process narration queue consumer.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub enabled: bool,
    pub queue_name: String,
    pub batch_size: i64,
    pub poll_interval: Duration,
    pub visibility_timeout: Duration,
    pub retry_delay: Duration,
    pub max_attempts: i32,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub cors_origin: String,
    pub supabase: SupabaseConfig,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub story_model: String,
    pub image_model: String,
    pub speech_model: String,
    pub worker: WorkerConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()));
        let or_default = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server and Database Settings ---
        let bind_address = parse_value::<SocketAddr>("BIND_ADDRESS", &or_default("BIND_ADDRESS", "0.0.0.0:3000"))?;
        let database_url = required("DATABASE_URL")?;

        let log_level_str = or_default("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;
        let cors_origin = or_default("CORS_ORIGIN", "http://localhost:5173");

        // --- Hosted Backend ---
        let supabase = SupabaseConfig {
            url: required("SUPABASE_URL")?.trim_end_matches('/').to_string(),
            anon_key: required("SUPABASE_ANON_KEY")?,
            service_role_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
        };

        // --- AI Settings ---
        let openai_api_key = lookup("OPENAI_API_KEY");
        let openai_base_url = or_default("OPENAI_BASE_URL", "https://api.openai.com/v1")
            .trim_end_matches('/')
            .to_string();
        let story_model = or_default("STORY_MODEL", "gpt-4o-mini");
        let image_model = or_default("IMAGE_MODEL", "dall-e-3");
        let speech_model = or_default("SPEECH_MODEL", "gpt-4o-mini-tts");

        // --- Narration Queue ---
        let worker = WorkerConfig {
            enabled: parse_value("AUDIO_WORKER_ENABLED", &or_default("AUDIO_WORKER_ENABLED", "true"))?,
            queue_name: or_default("AUDIO_QUEUE", "audio-generation"),
            batch_size: parse_value("AUDIO_BATCH_SIZE", &or_default("AUDIO_BATCH_SIZE", "5"))?,
            poll_interval: Duration::from_secs(parse_value(
                "AUDIO_POLL_INTERVAL_SECS",
                &or_default("AUDIO_POLL_INTERVAL_SECS", "5"),
            )?),
            visibility_timeout: Duration::from_secs(parse_value(
                "AUDIO_VISIBILITY_TIMEOUT_SECS",
                &or_default("AUDIO_VISIBILITY_TIMEOUT_SECS", "300"),
            )?),
            retry_delay: Duration::from_secs(parse_value(
                "AUDIO_RETRY_DELAY_SECS",
                &or_default("AUDIO_RETRY_DELAY_SECS", "30"),
            )?),
            max_attempts: parse_value("AUDIO_MAX_ATTEMPTS", &or_default("AUDIO_MAX_ATTEMPTS", "3"))?,
        };
        if worker.batch_size < 1 {
            return Err(ConfigError::InvalidValue(
                "AUDIO_BATCH_SIZE".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if worker.max_attempts < 1 {
            return Err(ConfigError::InvalidValue(
                "AUDIO_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            supabase,
            openai_api_key,
            openai_base_url,
            story_model,
            image_model,
            speech_model,
            worker,
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/monogatari"),
            ("SUPABASE_URL", "https://project.supabase.co/"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn applies_defaults() {
        let config = load(&base_vars()).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.supabase.url, "https://project.supabase.co");
        assert_eq!(config.worker.queue_name, "audio-generation");
        assert_eq!(config.worker.max_attempts, 3);
        assert_eq!(config.worker.poll_interval, Duration::from_secs(5));
        assert!(config.worker.enabled);
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn missing_database_url_is_reported() {
        let mut vars = base_vars();
        vars.remove("DATABASE_URL");
        match load(&vars) {
            Err(ConfigError::MissingVar(name)) => assert_eq!(name, "DATABASE_URL"),
            other => panic!("expected MissingVar, got {:?}", other),
        }
    }

    #[test]
    fn rejects_invalid_numbers() {
        let mut vars = base_vars();
        vars.insert("AUDIO_BATCH_SIZE", "lots");
        assert!(matches!(load(&vars), Err(ConfigError::InvalidValue(key, _)) if key == "AUDIO_BATCH_SIZE"));

        let mut vars = base_vars();
        vars.insert("AUDIO_MAX_ATTEMPTS", "0");
        assert!(matches!(load(&vars), Err(ConfigError::InvalidValue(key, _)) if key == "AUDIO_MAX_ATTEMPTS"));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut vars = base_vars();
        vars.insert("RUST_LOG", "chatty");
        assert!(matches!(load(&vars), Err(ConfigError::InvalidValue(key, _)) if key == "RUST_LOG"));
    }
}
