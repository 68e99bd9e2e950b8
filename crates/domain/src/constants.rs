//! Pipeline constants
//!
//! Centralized defaults shared by configuration, core services and adapters.

// Aggregation
pub const DEFAULT_QUIET_PERIOD_MS: u64 = 3_000;

// Retry (extraction providers and calendar inserts)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 10_000;
pub const DEFAULT_BACKOFF_BASE: f64 = 2.0;

// Extraction
pub const PROVIDER_OPENAI: &str = "openai";
pub const PROVIDER_DEEPSEEK: &str = "deepseek";
pub const DEFAULT_PROVIDER_PRIORITY: [&str; 2] = [PROVIDER_OPENAI, PROVIDER_DEEPSEEK];
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;

// Time
pub const FALLBACK_TIMEZONE: &str = "UTC";
/// Wire format for event timestamps exchanged with extraction providers.
pub const EVENT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Account linking
pub const DEFAULT_LINK_STATE_TTL_SECS: u64 = 600;
