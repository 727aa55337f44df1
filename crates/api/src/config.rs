use std::time::Duration;

use crate::auth::jwt::SigningKey;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Authentication and session settings.
    pub auth: AuthConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let auth = AuthConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            auth,
        }
    }
}

/// Default session lifetime in hours.
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
/// Default placeholder expiry for provisional sessions, in seconds.
const DEFAULT_PROVISIONAL_TTL_SECS: i64 = 300;
/// Default bound on a single storage call, in seconds.
const DEFAULT_STORAGE_TIMEOUT_SECS: u64 = 10;
/// Default cleanup sweep period: 24 hours.
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 86_400;

/// Longest accepted session lifetime: one year.
const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;
/// Longest accepted provisional placeholder: one hour.
const MAX_PROVISIONAL_TTL_SECS: i64 = 3_600;

/// Configuration of the authentication core.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC key for bearer tokens. Loaded or generated once per process.
    pub signing_key: SigningKey,
    /// Session (and token) lifetime in hours.
    pub session_ttl_hours: i64,
    /// Placeholder expiry of a provisional session, in seconds.
    pub provisional_ttl_secs: i64,
    /// Upper bound on any single storage call, in seconds.
    pub storage_timeout_secs: u64,
    /// Period of the cleanup sweep, in seconds.
    pub cleanup_interval_secs: u64,
}

impl AuthConfig {
    /// Load auth configuration from environment variables.
    ///
    /// | Env Var                          | Required | Default               |
    /// |----------------------------------|----------|-----------------------|
    /// | `SESSION_SIGNING_KEY`            | no       | random, per process   |
    /// | `SESSION_TTL_HOURS`              | no       | `24`                  |
    /// | `SESSION_PROVISIONAL_TTL_SECS`   | no       | `300`                 |
    /// | `AUTH_STORAGE_TIMEOUT_SECS`      | no       | `10`                  |
    /// | `SESSION_CLEANUP_INTERVAL_SECS`  | no       | `86400`               |
    ///
    /// # Panics
    ///
    /// Panics if a value does not parse, `SESSION_SIGNING_KEY` is shorter
    /// than [`SigningKey::MIN_LEN`] bytes, or [`validate`](Self::validate)
    /// fails.
    pub fn from_env() -> Self {
        let signing_key = match std::env::var("SESSION_SIGNING_KEY") {
            Ok(secret) => SigningKey::from_bytes(secret.as_bytes())
                .unwrap_or_else(|e| panic!("SESSION_SIGNING_KEY rejected: {e}")),
            Err(_) => {
                tracing::warn!(
                    "SESSION_SIGNING_KEY not set; generated an ephemeral key, \
                     tokens will not survive a restart"
                );
                SigningKey::generate()
            }
        };

        let config = Self {
            signing_key,
            session_ttl_hours: env_or("SESSION_TTL_HOURS", DEFAULT_SESSION_TTL_HOURS),
            provisional_ttl_secs: env_or(
                "SESSION_PROVISIONAL_TTL_SECS",
                DEFAULT_PROVISIONAL_TTL_SECS,
            ),
            storage_timeout_secs: env_or("AUTH_STORAGE_TIMEOUT_SECS", DEFAULT_STORAGE_TIMEOUT_SECS),
            cleanup_interval_secs: env_or(
                "SESSION_CLEANUP_INTERVAL_SECS",
                DEFAULT_CLEANUP_INTERVAL_SECS,
            ),
        };

        if let Err(msg) = config.validate() {
            panic!("Invalid auth configuration: {msg}");
        }
        config
    }

    /// Default settings around an explicit key.
    pub fn with_key(signing_key: SigningKey) -> Self {
        Self {
            signing_key,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            provisional_ttl_secs: DEFAULT_PROVISIONAL_TTL_SECS,
            storage_timeout_secs: DEFAULT_STORAGE_TIMEOUT_SECS,
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
        }
    }

    /// Check cross-field constraints.
    ///
    /// A provisional row must outlive two storage calls (finalize and the
    /// compensating delete); otherwise a sweep could purge it mid-login.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session_ttl_hours) {
            return Err(format!(
                "SESSION_TTL_HOURS must be between 1 and {MAX_SESSION_TTL_HOURS}"
            ));
        }
        if self.provisional_ttl_secs > MAX_PROVISIONAL_TTL_SECS {
            return Err(format!(
                "SESSION_PROVISIONAL_TTL_SECS must not exceed {MAX_PROVISIONAL_TTL_SECS}"
            ));
        }
        if self.storage_timeout_secs == 0 {
            return Err("AUTH_STORAGE_TIMEOUT_SECS must be positive".into());
        }
        if self.cleanup_interval_secs == 0 {
            return Err("SESSION_CLEANUP_INTERVAL_SECS must be positive".into());
        }
        let min_provisional = i64::try_from(self.storage_timeout_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(2);
        if self.provisional_ttl_secs <= min_provisional {
            return Err(format!(
                "SESSION_PROVISIONAL_TTL_SECS ({}) must exceed twice AUTH_STORAGE_TIMEOUT_SECS ({})",
                self.provisional_ttl_secs, self.storage_timeout_secs
            ));
        }
        Ok(())
    }

    /// Saturates instead of panicking; [`validate`](Self::validate) bounds it.
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.session_ttl_hours).unwrap_or(chrono::Duration::MAX)
    }

    pub fn provisional_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.provisional_ttl_secs).unwrap_or(chrono::Duration::MAX)
    }

    pub fn storage_timeout(&self) -> Duration {
        Duration::from_secs(self.storage_timeout_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

/// Parse `name` from the environment, falling back to `default` when unset.
fn env_or<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be a valid number: {e}")),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AuthConfig::with_key(SigningKey::generate());
        assert!(config.validate().is_ok());
        assert_eq!(config.session_ttl(), chrono::Duration::hours(24));
        assert_eq!(config.cleanup_interval(), Duration::from_secs(86_400));
    }

    #[test]
    fn provisional_ttl_must_outlive_storage_calls() {
        let mut config = AuthConfig::with_key(SigningKey::generate());
        config.storage_timeout_secs = 30;
        config.provisional_ttl_secs = 60;

        let err = config.validate().unwrap_err();
        assert!(err.contains("SESSION_PROVISIONAL_TTL_SECS"), "got: {err}");

        config.provisional_ttl_secs = 61;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn oversized_lifetimes_are_rejected() {
        let mut config = AuthConfig::with_key(SigningKey::generate());
        config.provisional_ttl_secs = 10_000_000_000_000;
        let err = config.validate().unwrap_err();
        assert!(err.contains("SESSION_PROVISIONAL_TTL_SECS"), "got: {err}");

        let mut config = AuthConfig::with_key(SigningKey::generate());
        config.session_ttl_hours = i64::MAX / 2;
        let err = config.validate().unwrap_err();
        assert!(err.contains("SESSION_TTL_HOURS"), "got: {err}");

        let mut config = AuthConfig::with_key(SigningKey::generate());
        config.storage_timeout_secs = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = AuthConfig::with_key(SigningKey::generate());
        config.session_ttl_hours = MAX_SESSION_TTL_HOURS;
        config.provisional_ttl_secs = MAX_PROVISIONAL_TTL_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_positive_values_are_rejected() {
        let mut config = AuthConfig::with_key(SigningKey::generate());
        config.session_ttl_hours = 0;
        assert!(config.validate().is_err());

        let mut config = AuthConfig::with_key(SigningKey::generate());
        config.cleanup_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
