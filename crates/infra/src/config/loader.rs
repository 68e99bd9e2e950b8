//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file into the process environment when present
//! 2. Loads from environment variables when an extraction API key is set;
//!    any invalid variable is then an error
//! 3. Otherwise falls back to loading from file
//! 4. Probes multiple paths for config files
//! 5. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! At least one extraction API key is required for the environment to count
//! as a complete configuration.
//! - `SCHEDULR_OPENAI_API_KEY`, `SCHEDULR_OPENAI_MODEL`, `SCHEDULR_OPENAI_API_URL`
//! - `SCHEDULR_DEEPSEEK_API_KEY`, `SCHEDULR_DEEPSEEK_MODEL`, `SCHEDULR_DEEPSEEK_API_URL`
//! - `SCHEDULR_EXTRACTION_PRIORITY`: comma separated provider names
//! - `SCHEDULR_MAX_ATTEMPTS`: retry budget for extraction and calendar calls
//! - `SCHEDULR_QUIET_PERIOD_MS`: aggregation quiet period
//! - `SCHEDULR_GOOGLE_CLIENT_ID`, `SCHEDULR_GOOGLE_CLIENT_SECRET`,
//!   `SCHEDULR_GOOGLE_REDIRECT_URI`: Google Calendar OAuth client (all or none)
//! - `SCHEDULR_DEFAULT_TIMEZONE`: fallback IANA zone
//! - `SCHEDULR_GOOGLE_MAPS_API_KEY`: Time Zone API key
//! - `SCHEDULR_LOG_LEVEL`, `SCHEDULR_LOG_JSON`
//!
//! ## File Locations
//! The loader searches the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./schedulr.json` or `./schedulr.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use schedulr_domain::{
    GoogleOAuthConfig, ProviderConfig, Result, SchedulrConfig, SchedulrError,
};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `SchedulrError::Config` if:
/// - An extraction API key is set and another variable is invalid
/// - No API key is set and no config file can be loaded
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<SchedulrConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    let config = if env_has_api_key() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        config
    } else {
        tracing::debug!("No extraction API key in environment, trying file");
        load_from_file(None)?
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// Unset optional variables keep their defaults.
///
/// # Errors
/// Returns `SchedulrError::Config` if no extraction API key is set or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<SchedulrConfig> {
    let mut config = SchedulrConfig::default();

    config.extraction.openai = provider_from_env("OPENAI");
    config.extraction.deepseek = provider_from_env("DEEPSEEK");
    if config.extraction.openai.is_none() && config.extraction.deepseek.is_none() {
        return Err(SchedulrError::Config(
            "Missing required environment variable: SCHEDULR_OPENAI_API_KEY or SCHEDULR_DEEPSEEK_API_KEY"
                .into(),
        ));
    }

    if let Some(priority) = optional_var("SCHEDULR_EXTRACTION_PRIORITY") {
        config.extraction.priority = priority
            .split(',')
            .map(|name| name.trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
    }

    if let Some(attempts) = env_parse::<u32>("SCHEDULR_MAX_ATTEMPTS")? {
        config.extraction.retry.max_attempts = attempts;
        config.calendar.retry.max_attempts = attempts;
    }

    if let Some(quiet_period_ms) = env_parse::<u64>("SCHEDULR_QUIET_PERIOD_MS")? {
        config.aggregation.quiet_period_ms = quiet_period_ms;
    }

    config.calendar.google = google_from_env()?;

    if let Some(timezone) = optional_var("SCHEDULR_DEFAULT_TIMEZONE") {
        config.timezone.default_timezone = timezone;
    }
    config.timezone.google_api_key = optional_var("SCHEDULR_GOOGLE_MAPS_API_KEY");

    if let Some(level) = optional_var("SCHEDULR_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("SCHEDULR_LOG_JSON", false);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, searches multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `SchedulrError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<SchedulrConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SchedulrError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => discover_config_paths().ok_or_else(|| {
            SchedulrError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SchedulrError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<SchedulrConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SchedulrError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SchedulrError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(SchedulrError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn discover_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 6] = [
        "config.json",
        "config.toml",
        "schedulr.json",
        "schedulr.toml",
        "../config.json",
        "../config.toml",
    ];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn env_has_api_key() -> bool {
    ["SCHEDULR_OPENAI_API_KEY", "SCHEDULR_DEEPSEEK_API_KEY"]
        .iter()
        .any(|key| optional_var(key).is_some())
}

fn provider_from_env(prefix: &str) -> Option<ProviderConfig> {
    let api_key = optional_var(&format!("SCHEDULR_{prefix}_API_KEY"))?;
    let mut provider = ProviderConfig::new(api_key);
    provider.model = optional_var(&format!("SCHEDULR_{prefix}_MODEL"));
    provider.api_url = optional_var(&format!("SCHEDULR_{prefix}_API_URL"));
    Some(provider)
}

fn google_from_env() -> Result<Option<GoogleOAuthConfig>> {
    let client_id = optional_var("SCHEDULR_GOOGLE_CLIENT_ID");
    let client_secret = optional_var("SCHEDULR_GOOGLE_CLIENT_SECRET");
    let redirect_uri = optional_var("SCHEDULR_GOOGLE_REDIRECT_URI");

    match (client_id, client_secret, redirect_uri) {
        (None, None, None) => Ok(None),
        (Some(client_id), Some(client_secret), Some(redirect_uri)) => Ok(Some(GoogleOAuthConfig {
            client_id,
            client_secret,
            redirect_uri,
            link_state_ttl_secs: schedulr_domain::constants::DEFAULT_LINK_STATE_TTL_SECS,
        })),
        _ => Err(SchedulrError::Config(
            "SCHEDULR_GOOGLE_CLIENT_ID, SCHEDULR_GOOGLE_CLIENT_SECRET and SCHEDULR_GOOGLE_REDIRECT_URI must be set together"
                .into(),
        )),
    }
}

/// Non-empty environment variable, if set
fn optional_var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse an optional environment variable
///
/// # Errors
/// Returns `SchedulrError::Config` if the variable is set but invalid.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_var(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| SchedulrError::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 16] = [
        "SCHEDULR_OPENAI_API_KEY",
        "SCHEDULR_OPENAI_MODEL",
        "SCHEDULR_OPENAI_API_URL",
        "SCHEDULR_DEEPSEEK_API_KEY",
        "SCHEDULR_DEEPSEEK_MODEL",
        "SCHEDULR_DEEPSEEK_API_URL",
        "SCHEDULR_EXTRACTION_PRIORITY",
        "SCHEDULR_MAX_ATTEMPTS",
        "SCHEDULR_QUIET_PERIOD_MS",
        "SCHEDULR_GOOGLE_CLIENT_ID",
        "SCHEDULR_GOOGLE_CLIENT_SECRET",
        "SCHEDULR_GOOGLE_REDIRECT_URI",
        "SCHEDULR_DEFAULT_TIMEZONE",
        "SCHEDULR_GOOGLE_MAPS_API_KEY",
        "SCHEDULR_LOG_LEVEL",
        "SCHEDULR_LOG_JSON",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    fn temp_config(contents: &str, extension: &str) -> PathBuf {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        let path = temp_file.path().with_extension(extension);
        std::fs::copy(temp_file.path(), &path).unwrap();
        path
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("TEST_SCHEDULR_BOOL_ON", "on");
        std::env::set_var("TEST_SCHEDULR_BOOL_UPPER", "TRUE");
        std::env::set_var("TEST_SCHEDULR_BOOL_NO", "no");

        assert!(env_bool("TEST_SCHEDULR_BOOL_ON", false));
        assert!(env_bool("TEST_SCHEDULR_BOOL_UPPER", false));
        assert!(!env_bool("TEST_SCHEDULR_BOOL_NO", true));

        std::env::remove_var("TEST_SCHEDULR_BOOL_MISSING");
        assert!(env_bool("TEST_SCHEDULR_BOOL_MISSING", true));

        std::env::remove_var("TEST_SCHEDULR_BOOL_ON");
        std::env::remove_var("TEST_SCHEDULR_BOOL_UPPER");
        std::env::remove_var("TEST_SCHEDULR_BOOL_NO");
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("SCHEDULR_OPENAI_API_KEY", "sk-openai");
        std::env::set_var("SCHEDULR_OPENAI_MODEL", "gpt-4o");
        std::env::set_var("SCHEDULR_DEEPSEEK_API_KEY", "sk-deepseek");
        std::env::set_var("SCHEDULR_EXTRACTION_PRIORITY", "DeepSeek, openai");
        std::env::set_var("SCHEDULR_MAX_ATTEMPTS", "5");
        std::env::set_var("SCHEDULR_QUIET_PERIOD_MS", "1500");
        std::env::set_var("SCHEDULR_GOOGLE_CLIENT_ID", "client");
        std::env::set_var("SCHEDULR_GOOGLE_CLIENT_SECRET", "secret");
        std::env::set_var("SCHEDULR_GOOGLE_REDIRECT_URI", "https://bot.example/callback");
        std::env::set_var("SCHEDULR_DEFAULT_TIMEZONE", "Europe/Berlin");
        std::env::set_var("SCHEDULR_LOG_JSON", "true");

        let result = load_from_env();
        clear_env();
        let config = result.expect("config from env");

        assert_eq!(config.extraction.priority, vec!["deepseek", "openai"]);
        assert_eq!(config.extraction.openai.as_ref().unwrap().model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.extraction.deepseek.as_ref().unwrap().api_key, "sk-deepseek");
        assert_eq!(config.extraction.retry.max_attempts, 5);
        assert_eq!(config.calendar.retry.max_attempts, 5);
        assert_eq!(config.aggregation.quiet_period_ms, 1500);
        assert_eq!(config.calendar.google.as_ref().unwrap().client_id, "client");
        assert_eq!(config.timezone.default_timezone, "Europe/Berlin");
        assert!(config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_env_missing_api_key() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, SchedulrError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("SCHEDULR_OPENAI_API_KEY", "sk-openai");
        std::env::set_var("SCHEDULR_QUIET_PERIOD_MS", "soon");

        let result = load_from_env();
        clear_env();
        assert!(matches!(result, Err(SchedulrError::Config(msg)) if msg.contains("SCHEDULR_QUIET_PERIOD_MS")));
    }

    #[test]
    fn test_load_reports_invalid_env_instead_of_falling_back() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("SCHEDULR_OPENAI_API_KEY", "sk-openai");
        std::env::set_var("SCHEDULR_MAX_ATTEMPTS", "many");
        let invalid_number = load();

        std::env::set_var("SCHEDULR_MAX_ATTEMPTS", "2");
        std::env::set_var("SCHEDULR_GOOGLE_CLIENT_SECRET", "secret");
        let partial_google = load();

        clear_env();
        assert!(matches!(invalid_number, Err(SchedulrError::Config(msg)) if msg.contains("SCHEDULR_MAX_ATTEMPTS")));
        assert!(matches!(partial_google, Err(SchedulrError::Config(msg)) if msg.contains("SCHEDULR_GOOGLE_CLIENT_ID")));
    }

    #[test]
    fn test_partial_google_client_is_rejected() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("SCHEDULR_OPENAI_API_KEY", "sk-openai");
        std::env::set_var("SCHEDULR_GOOGLE_CLIENT_ID", "client");

        let result = load_from_env();
        clear_env();
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file_json() {
        let path = temp_config(
            r#"{
                "aggregation": { "quiet_period_ms": 2000 },
                "extraction": {
                    "priority": ["deepseek"],
                    "deepseek": { "api_key": "sk-file" }
                },
                "timezone": { "default_timezone": "Asia/Tokyo" }
            }"#,
            "json",
        );

        let config = load_from_file(Some(path.clone())).expect("json config");
        assert_eq!(config.aggregation.quiet_period_ms, 2000);
        assert_eq!(config.extraction.priority, vec!["deepseek"]);
        assert_eq!(config.extraction.deepseek.unwrap().timeout_secs, 60);
        assert_eq!(config.extraction.retry.max_attempts, 3);
        assert_eq!(config.timezone.default_timezone, "Asia/Tokyo");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_toml() {
        let path = temp_config(
            r#"
[extraction]
priority = ["openai", "deepseek"]

[extraction.retry]
max_attempts = 4

[extraction.openai]
api_key = "sk-toml"
model = "gpt-4o-mini"

[calendar.google]
client_id = "client"
client_secret = "secret"
redirect_uri = "https://bot.example/callback"

[logging]
level = "debug"
"#,
            "toml",
        );

        let config = load_from_file(Some(path.clone())).expect("toml config");
        assert_eq!(config.extraction.retry.max_attempts, 4);
        assert_eq!(config.extraction.retry.initial_backoff_ms, 500);
        assert_eq!(config.extraction.openai.unwrap().api_key, "sk-toml");
        assert_eq!(config.calendar.google.unwrap().link_state_ttl_secs, 600);
        assert_eq!(config.logging.level, "debug");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(matches!(result, Err(SchedulrError::Config(_))));
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let path = temp_config(r#"{ "this is": "not valid json" "#, "json");

        let result = load_from_file(Some(path.clone()));
        assert!(result.is_err(), "Should fail with invalid JSON");

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", &PathBuf::from("test.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }
}
