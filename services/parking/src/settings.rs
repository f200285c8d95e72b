//! Service settings
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `parking.toml` in the working directory, then `PARKING_*` environment
//! variables (`__` separates nested keys, e.g. `PARKING_AUTH__JWT_SECRET`).
//! Database settings live in `common::database::DatabaseConfig`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;

use crate::{
    jwt::{DEFAULT_TOKEN_EXPIRY_SECS, JwtConfig},
    rate_limiter::LoginThrottleConfig,
};

/// Shortest accepted signing secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    /// Socket address to bind, e.g. `0.0.0.0:5000`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_expiry_secs: i64,
    pub max_login_attempts: u32,
    pub login_window_secs: u64,
    pub lockout_secs: u64,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("token_expiry_secs", &self.token_expiry_secs)
            .field("max_login_attempts", &self.max_login_attempts)
            .field("login_window_secs", &self.login_window_secs)
            .field("lockout_secs", &self.lockout_secs)
            .finish()
    }
}

impl AuthSettings {
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.jwt_secret.clone(),
            token_expiry: self.token_expiry_secs,
        }
    }

    pub fn throttle_config(&self) -> LoginThrottleConfig {
        LoginThrottleConfig {
            max_attempts: self.max_login_attempts,
            window_seconds: self.login_window_secs,
            lockout_seconds: self.lockout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub auth: AuthSettings,
}

impl Settings {
    /// Load settings from defaults, `parking.toml` and the environment
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("auth.token_expiry_secs", DEFAULT_TOKEN_EXPIRY_SECS)?
            .set_default("auth.max_login_attempts", 5)?
            .set_default("auth.login_window_secs", 300)?
            .set_default("auth.lockout_secs", 900)?
            .add_source(File::with_name("parking").required(false))
            .add_source(
                Environment::with_prefix("PARKING")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Message(format!(
                "auth.jwt_secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        if self.auth.token_expiry_secs <= 0 {
            return Err(ConfigError::Message(
                "auth.token_expiry_secs must be positive".to_string(),
            ));
        }

        if self.auth.max_login_attempts == 0 {
            return Err(ConfigError::Message(
                "auth.max_login_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
