use std::env;
use anyhow::{Context, Result};
use chrono::Duration;

/// Default session lifetime in days. Re-login friction is the motivating
/// concern, so the default is multi-week.
const DEFAULT_SESSION_LIFETIME_DAYS: i64 = 14;

/// The session store's configuration.
#[derive(Clone)]
pub struct SessionConfig {
    /// The URL of the Redis server backing the cache.
    pub redis_url: String,
    /// How long a user session stays alive after its last touch.
    pub session_lifetime: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            session_lifetime: Duration::days(DEFAULT_SESSION_LIFETIME_DAYS),
        }
    }
}

impl SessionConfig {
    /// Creates a new `SessionConfig` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `SessionConfig`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let lifetime_days: i64 = env::var("SESSION_DURATION_DAYS")
            .unwrap_or_else(|_| DEFAULT_SESSION_LIFETIME_DAYS.to_string())
            .parse()
            .context("Invalid SESSION_DURATION_DAYS")?;

        Ok(Self {
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            session_lifetime: Duration::days(lifetime_days),
        })
    }
}
