//! Configuration management

use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKOFF_BASE, DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_LINK_STATE_TTL_SECS,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF_MS, DEFAULT_PROVIDER_PRIORITY,
    DEFAULT_PROVIDER_TIMEOUT_SECS, DEFAULT_QUIET_PERIOD_MS, FALLBACK_TIMEZONE, PROVIDER_DEEPSEEK,
    PROVIDER_OPENAI,
};
use crate::errors::{Result, SchedulrError};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulrConfig {
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub timezone: TimezoneConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SchedulrConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.aggregation.quiet_period_ms == 0 {
            return Err(SchedulrError::Config("aggregation.quiet_period_ms must be > 0".into()));
        }
        self.extraction.retry.validate("extraction.retry")?;
        self.calendar.retry.validate("calendar.retry")?;
        if self.extraction.priority.is_empty() {
            return Err(SchedulrError::Config("extraction.priority must not be empty".into()));
        }
        if self.timezone.default_timezone.parse::<Tz>().is_err() {
            return Err(SchedulrError::Config(format!(
                "timezone.default_timezone is not an IANA zone: {}",
                self.timezone.default_timezone
            )));
        }
        if !self.extraction.priority.iter().any(|name| self.extraction.is_configured(name)) {
            return Err(SchedulrError::Config(format!(
                "none of extraction.priority [{}] has a configured provider section",
                self.extraction.priority.join(", ")
            )));
        }
        Ok(())
    }
}

/// Debounce settings for the per-conversation buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub quiet_period_ms: u64,
}

impl AggregationConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self { quiet_period_ms: DEFAULT_QUIET_PERIOD_MS }
    }
}

/// Bounded exponential backoff shared by extraction and calendar calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    #[serde(default = "default_backoff_base")]
    pub backoff_base: f64,
}

fn default_backoff_base() -> f64 {
    DEFAULT_BACKOFF_BASE
}

impl RetrySettings {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    fn validate(&self, section: &str) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(SchedulrError::Config(format!("{section}.max_attempts must be > 0")));
        }
        if self.backoff_base <= 0.0 {
            return Err(SchedulrError::Config(format!("{section}.backoff_base must be > 0")));
        }
        Ok(())
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }
}

/// Extraction provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Provider names in the order they are consulted.
    pub priority: Vec<String>,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub openai: Option<ProviderConfig>,
    #[serde(default)]
    pub deepseek: Option<ProviderConfig>,
}

impl ExtractionConfig {
    /// Whether `name` refers to a provider with a configured section.
    pub fn is_configured(&self, name: &str) -> bool {
        let name = name.trim();
        if name.eq_ignore_ascii_case(PROVIDER_OPENAI) {
            self.openai.is_some()
        } else if name.eq_ignore_ascii_case(PROVIDER_DEEPSEEK) {
            self.deepseek.is_some()
        } else {
            false
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PROVIDER_PRIORITY.iter().map(|p| (*p).to_string()).collect(),
            retry: RetrySettings::default(),
            openai: None,
            deepseek: None,
        }
    }
}

/// Credentials and endpoint overrides for one chat-completions provider
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_provider_timeout() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT_SECS
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: None,
            api_url: None,
            timeout_secs: DEFAULT_PROVIDER_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Calendar integration settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default)]
    pub google: Option<GoogleOAuthConfig>,
    #[serde(default)]
    pub retry: RetrySettings,
}

/// Google OAuth client registration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub redirect_uri: String,
    #[serde(default = "default_link_state_ttl")]
    pub link_state_ttl_secs: u64,
}

fn default_link_state_ttl() -> u64 {
    DEFAULT_LINK_STATE_TTL_SECS
}

impl std::fmt::Debug for GoogleOAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleOAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("link_state_ttl_secs", &self.link_state_ttl_secs)
            .finish()
    }
}

/// Timezone resolution settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimezoneConfig {
    /// Application default used when the user has neither a zone nor a
    /// location.
    pub default_timezone: String,
    /// Key for the Google Time Zone API (coordinate lookups).
    #[serde(default, skip_serializing)]
    pub google_api_key: Option<String>,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self { default_timezone: FALLBACK_TIMEZONE.to_string(), google_api_key: None }
    }
}

impl std::fmt::Debug for TimezoneConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimezoneConfig")
            .field("default_timezone", &self.default_timezone)
            .field("google_api_key", &self.google_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Logging output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}
