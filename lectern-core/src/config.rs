//! Centralized configuration for Lectern.
//!
//! All tunable parameters and settings are defined here to avoid
//! hard-coded values scattered throughout the codebase. The server URL and
//! shared secret come from the host deployment; everything else has
//! sensible defaults.

use std::time::Duration;

/// Raised when the supplied configuration cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("conferencing server URL is not configured")]
    MissingServerUrl,

    #[error("conferencing server shared secret is not configured")]
    MissingSharedSecret,
}

/// Central configuration for all Lectern components.
///
/// Groups related configuration settings into logical sections.
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct LecternConfig {
    pub server: ServerConfig,
    pub recordings: RecordingsConfig,
    pub features: FeaturesConfig,
}

/// Remote conferencing-server endpoint configuration.
///
/// Controls where signed API requests are sent and how long the HTTP
/// layer waits for them.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the conferencing server, with or without a trailing
    /// `/api` segment
    pub base_url: String,
    /// Shared secret used to checksum API requests
    pub shared_secret: String,
    /// HTTP request timeout for bulk API calls
    pub request_timeout: Duration,
    /// HTTP timeout for reachability probes (HEAD requests)
    pub probe_timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: &'static str,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            shared_secret: String::new(),
            request_timeout: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(1),
            user_agent: "lectern/0.1.0",
        }
    }
}

impl ServerConfig {
    /// Checks that the endpoint settings are usable.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingServerUrl` - Base URL is empty
    /// - `ConfigError::MissingSharedSecret` - Shared secret is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingServerUrl);
        }
        if self.shared_secret.trim().is_empty() {
            return Err(ConfigError::MissingSharedSecret);
        }
        Ok(())
    }
}

/// Recording listing behavior.
#[derive(Debug, Clone)]
pub struct RecordingsConfig {
    /// Sort aggregated recordings oldest-first instead of newest-first
    pub sort_ascending: bool,
    /// Interval the client-side table widget should ping the activity at
    pub ping_interval: Duration,
    /// Locale code handed to the client-side table widget
    pub locale: String,
}

impl Default for RecordingsConfig {
    fn default() -> Self {
        Self {
            sort_ascending: false,
            ping_interval: Duration::from_secs(10),
            locale: "en".to_string(),
        }
    }
}

/// Site-wide feature toggles.
///
/// Per-activity settings can only enable a feature that is also enabled
/// here.
#[derive(Debug, Clone)]
pub struct FeaturesConfig {
    /// Recording listings are available at all
    pub recordings_enabled: bool,
    /// Imported recording references may be surfaced
    pub import_recordings_enabled: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            recordings_enabled: true,
            import_recordings_enabled: true,
        }
    }
}

impl LecternConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Allows runtime configuration via environment variables while
    /// maintaining sensible defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("LECTERN_SERVER_URL") {
            config.server.base_url = url;
        }
        if let Ok(secret) = std::env::var("LECTERN_SHARED_SECRET") {
            config.server.shared_secret = secret;
        }
        if let Ok(timeout) = std::env::var("LECTERN_REQUEST_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.server.request_timeout = Duration::from_secs(seconds);
            }
        }
        if let Ok(timeout) = std::env::var("LECTERN_PROBE_TIMEOUT") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.server.probe_timeout = Duration::from_secs(seconds);
            }
        }
        if let Ok(ascending) = std::env::var("LECTERN_SORT_ASCENDING") {
            config.recordings.sort_ascending = ascending.parse().unwrap_or(false);
        }
        if let Ok(locale) = std::env::var("LECTERN_LOCALE") {
            config.recordings.locale = locale;
        }

        config
    }
}
