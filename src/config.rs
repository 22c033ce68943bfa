//! Layered configuration
//!
//! Sources, in increasing precedence: built-in defaults, a YAML file
//! (`--config`, else `config/config.yaml`, else the user config
//! directory), `config/local.env` applied to the process environment,
//! then `CSVPILOT_*` environment variables. Credentials come only from
//! the environment, never from YAML.
//!
//! Validation runs after merging and reports every violation at once.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use import_flow::{Credentials, OrchestratorConfig};
use import_retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

const DEFAULT_CONFIG_FILE: &str = "config/config.yaml";
const USER_CONFIG_FILE: &str = "csvpilot/config.yaml";

pub const ENV_BASE_URL: &str = "CSVPILOT_BASE_URL";
pub const ENV_DATA_DIR: &str = "CSVPILOT_DATA_DIR";
pub const ENV_USERNAME: &str = "CSVPILOT_USERNAME";
pub const ENV_PASSWORD: &str = "CSVPILOT_PASSWORD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file {path} could not be read: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file {path} is not valid YAML: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// All validation violations, collected in one pass.
    #[error("Configuration is invalid:\n  - {}", violations.join("\n  - "))]
    Invalid { violations: Vec<String> },
}

/// Retry section of the config file. Durations are humantime strings
/// ("500ms", "2s") so the file stays readable.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySection {
    pub max_attempts: u32,
    pub base_delay: String,
    pub backoff_factor: f64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: "1s".to_string(),
            backoff_factor: 1.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSection {
    pub selector: String,
    pub validation: String,
    pub completion: String,
    pub navigation: String,
    pub settle: String,
    pub auth_wait: String,
    pub auth_check_interval: String,
}

impl Default for TimeoutSection {
    fn default() -> Self {
        Self {
            selector: "10s".to_string(),
            validation: "15s".to_string(),
            completion: "60s".to_string(),
            navigation: "10s".to_string(),
            settle: "500ms".to_string(),
            auth_wait: "3m".to_string(),
            auth_check_interval: "2s".to_string(),
        }
    }
}

/// The merged, not-yet-validated configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub debug_dir: PathBuf,
    pub authenticated_url_patterns: Vec<String>,
    pub retry: RetrySection,
    pub timeouts: TimeoutSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            data_dir: PathBuf::from("data"),
            logs_dir: PathBuf::from("logs"),
            debug_dir: PathBuf::from("debug/html"),
            authenticated_url_patterns: vec![
                "/dashboard".to_string(),
                "/home".to_string(),
                "/app".to_string(),
                "/portal".to_string(),
            ],
            retry: RetrySection::default(),
            timeouts: TimeoutSection::default(),
        }
    }
}

/// Validated settings, ready for wiring.
#[derive(Clone, Debug)]
pub struct RuntimeSettings {
    pub orchestrator: OrchestratorConfig,
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub debug_dir: PathBuf,
}

impl AppConfig {
    /// Load and merge all configuration sources.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        apply_local_env(Path::new("config/local.env"));

        let mut config = match locate_file(explicit) {
            Some(path) => {
                info!(path = %path.display(), "loading configuration");
                let raw = fs::read_to_string(&path).map_err(|source| {
                    ConfigError::Unreadable {
                        path: path.clone(),
                        source,
                    }
                })?;
                serde_yaml::from_str(&raw)
                    .map_err(|source| ConfigError::Malformed { path, source })?
            }
            None => {
                debug!("no configuration file found, using defaults");
                Self::default()
            }
        };

        if let Ok(url) = env::var(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Ok(dir) = env::var(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }

        Ok(config)
    }

    /// Validate the merged configuration, reporting every violation.
    pub fn validate(self) -> Result<RuntimeSettings, ConfigError> {
        let mut violations = Vec::new();

        match Url::parse(&self.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => violations.push(format!(
                "base_url: unsupported scheme '{}' (expected http or https)",
                url.scheme()
            )),
            Err(err) => violations.push(format!("base_url: {err}")),
        }

        if !(1..=10).contains(&self.retry.max_attempts) {
            violations.push(format!(
                "retry.max_attempts: {} is outside 1..=10",
                self.retry.max_attempts
            ));
        }
        let base_delay = parse_window(
            "retry.base_delay",
            &self.retry.base_delay,
            Duration::from_millis(100),
            Duration::from_secs(10),
            &mut violations,
        );
        if !self.retry.backoff_factor.is_finite() || self.retry.backoff_factor <= 0.0 {
            violations.push(format!(
                "retry.backoff_factor: {} must be a positive number",
                self.retry.backoff_factor
            ));
        }

        let selector = parse_timeout("timeouts.selector", &self.timeouts.selector, &mut violations);
        let validation =
            parse_timeout("timeouts.validation", &self.timeouts.validation, &mut violations);
        let completion =
            parse_timeout("timeouts.completion", &self.timeouts.completion, &mut violations);
        let navigation =
            parse_timeout("timeouts.navigation", &self.timeouts.navigation, &mut violations);
        let settle = parse_timeout("timeouts.settle", &self.timeouts.settle, &mut violations);
        let auth_wait =
            parse_timeout("timeouts.auth_wait", &self.timeouts.auth_wait, &mut violations);
        let auth_check_interval = parse_timeout(
            "timeouts.auth_check_interval",
            &self.timeouts.auth_check_interval,
            &mut violations,
        );

        if self.authenticated_url_patterns.is_empty() {
            violations.push("authenticated_url_patterns: at least one pattern required".into());
        }
        for pattern in &self.authenticated_url_patterns {
            if pattern.trim().is_empty() {
                violations.push("authenticated_url_patterns: blank pattern".into());
            }
        }

        if !violations.is_empty() {
            return Err(ConfigError::Invalid { violations });
        }

        let mut orchestrator = OrchestratorConfig::new(self.base_url);
        orchestrator.retry_policy = RetryPolicy::new(
            self.retry.max_attempts,
            base_delay.unwrap_or(Duration::from_secs(1)),
        )
        .with_backoff_factor(self.retry.backoff_factor);
        orchestrator.selector_budget = or_default(selector, 10);
        orchestrator.validation_budget = or_default(validation, 15);
        orchestrator.completion_budget = or_default(completion, 60);
        orchestrator.navigation_deadline = or_default(navigation, 10);
        orchestrator.settle_delay = settle.unwrap_or(Duration::from_millis(500));
        orchestrator.auth_wait = or_default(auth_wait, 180);
        orchestrator.auth_check_interval = auth_check_interval.unwrap_or(Duration::from_secs(2));
        orchestrator.authenticated_url_patterns = self.authenticated_url_patterns;
        orchestrator.credentials = credentials_from_env();

        Ok(RuntimeSettings {
            orchestrator,
            data_dir: self.data_dir,
            logs_dir: self.logs_dir,
            debug_dir: self.debug_dir,
        })
    }
}

/// Apply `KEY=VALUE` lines to the process environment. Existing
/// variables win, so real environment overrides the file.
pub fn apply_local_env(path: &Path) {
    let Ok(raw) = fs::read_to_string(path) else {
        return;
    };
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            warn!(path = %path.display(), line, "ignoring malformed env line");
            continue;
        };
        let key = key.trim();
        if env::var_os(key).is_none() {
            env::set_var(key, value.trim());
        }
    }
    debug!(path = %path.display(), "applied local environment file");
}

fn locate_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        // An explicitly named file must exist; surface the IO error
        // from the read rather than silently falling back.
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    let user = dirs::config_dir()?.join(USER_CONFIG_FILE);
    user.is_file().then_some(user)
}

fn credentials_from_env() -> Option<Credentials> {
    let username = env::var(ENV_USERNAME).ok()?;
    let password = env::var(ENV_PASSWORD).ok()?;
    Some(Credentials { username, password })
}

fn parse_timeout(field: &str, value: &str, violations: &mut Vec<String>) -> Option<Duration> {
    match humantime::parse_duration(value) {
        Ok(duration) if !duration.is_zero() => Some(duration),
        Ok(_) => {
            violations.push(format!("{field}: must be positive"));
            None
        }
        Err(err) => {
            violations.push(format!("{field}: '{value}' is not a duration ({err})"));
            None
        }
    }
}

fn parse_window(
    field: &str,
    value: &str,
    min: Duration,
    max: Duration,
    violations: &mut Vec<String>,
) -> Option<Duration> {
    let duration = parse_timeout(field, value, violations)?;
    if duration < min || duration > max {
        violations.push(format!(
            "{field}: '{value}' is outside {}..={}",
            humantime::format_duration(min),
            humantime::format_duration(max)
        ));
        return None;
    }
    Some(duration)
}

fn or_default(parsed: Option<Duration>, default_secs: u64) -> Duration {
    parsed.unwrap_or(Duration::from_secs(default_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let settings = AppConfig::default().validate().unwrap();
        assert_eq!(settings.orchestrator.selector_budget, Duration::from_secs(10));
        assert_eq!(settings.orchestrator.retry_policy.max_attempts, 3);
        assert_eq!(settings.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn every_violation_is_reported_at_once() {
        let mut config = AppConfig::default();
        config.base_url = "not a url".to_string();
        config.retry.max_attempts = 0;
        config.retry.base_delay = "50ms".to_string();
        config.timeouts.selector = "soon".to_string();

        let err = config.validate().unwrap_err();
        let ConfigError::Invalid { violations } = err else {
            panic!("expected Invalid");
        };
        assert!(violations.iter().any(|v| v.starts_with("base_url")));
        assert!(violations.iter().any(|v| v.starts_with("retry.max_attempts")));
        assert!(violations.iter().any(|v| v.starts_with("retry.base_delay")));
        assert!(violations.iter().any(|v| v.starts_with("timeouts.selector")));
        assert_eq!(violations.len(), 4);
    }

    #[test]
    fn non_http_scheme_is_rejected() {
        let mut config = AppConfig::default();
        config.base_url = "ftp://files.example".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn yaml_sections_deserialize_with_partial_content() {
        let config: AppConfig = serde_yaml::from_str(
            "base_url: https://imports.example\nretry:\n  max_attempts: 5\n",
        )
        .unwrap();
        assert_eq!(config.base_url, "https://imports.example");
        assert_eq!(config.retry.max_attempts, 5);
        // Untouched sections keep their defaults.
        assert_eq!(config.timeouts.completion, "60s");
    }

    #[test]
    fn local_env_file_never_overrides_real_environment() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("local.env");
        fs::write(
            &file,
            "# comment\nCSVPILOT_TEST_FRESH=from-file\nCSVPILOT_TEST_TAKEN=from-file\n",
        )
        .unwrap();

        env::set_var("CSVPILOT_TEST_TAKEN", "from-env");
        apply_local_env(&file);

        assert_eq!(env::var("CSVPILOT_TEST_FRESH").unwrap(), "from-file");
        assert_eq!(env::var("CSVPILOT_TEST_TAKEN").unwrap(), "from-env");
        env::remove_var("CSVPILOT_TEST_FRESH");
        env::remove_var("CSVPILOT_TEST_TAKEN");
    }
}
