use std::path::Path;
use std::time::Duration;

use jsonschema::{validator_for, Validator};
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:4000/api/v1/demo-feedback";
pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const DEFAULT_DELETE_DELAY_MS: u64 = 300;
pub const DEFAULT_UPDATE_DELAY_MS: u64 = 500;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Listing endpoint; PATCH writes go to `{endpoint}/{id}`.
    pub endpoint: String,
    /// Rows per page.
    #[schemars(range(min = 1))]
    pub page_size: usize,
    /// Delay between marking a row deleting and removing it.
    pub delete_delay_ms: u64,
    /// Round-trip delay of the simulated update sink.
    pub update_delay_ms: u64,
    pub request_timeout_ms: u64,
    /// Optional bearer token sent with every request.
    pub token: Option<String>,
    /// Confirm updates locally instead of sending them to the endpoint.
    pub simulate_updates: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            delete_delay_ms: DEFAULT_DELETE_DELAY_MS,
            update_delay_ms: DEFAULT_UPDATE_DELAY_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            token: None,
            simulate_updates: false,
        }
    }
}

static CONFIG_SCHEMA: Lazy<Validator> = Lazy::new(|| {
    let schema_value = config_schema_json();
    validator_for(&schema_value).expect("valid schema")
});

/// Returns the JSON schema describing the configuration structure.
///
/// # Panics
///
/// Panics if schema generation fails; this indicates a programming error.
pub fn config_schema_json() -> serde_json::Value {
    let schema = schemars::schema_for!(DashboardConfig);
    serde_json::to_value(&schema).expect("schema json")
}

impl DashboardConfig {
    pub fn delete_delay(&self) -> Duration {
        Duration::from_millis(self.delete_delay_ms)
    }

    pub fn update_delay(&self) -> Duration {
        Duration::from_millis(self.update_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Parse TOML text, checking it against the schema first.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: toml::Value = toml::from_str(content)?;
        let json_value =
            serde_json::to_value(&raw).map_err(|e| ConfigError::Schema(e.to_string()))?;
        let validation_errors: Vec<_> = CONFIG_SCHEMA
            .iter_errors(&json_value)
            .map(|e| e.to_string())
            .collect();
        if !validation_errors.is_empty() {
            return Err(ConfigError::Schema(validation_errors.join(", ")));
        }
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults, then the optional file, then `FRD_*` overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = env_value("FRD_ENDPOINT") {
            self.endpoint = v;
        }
        if let Some(v) = env_value("FRD_TOKEN") {
            self.token = Some(v);
        }
        if let Some(v) = env_number("FRD_PAGE_SIZE")? {
            if v == 0 {
                return Err(ConfigError::Env {
                    key: "FRD_PAGE_SIZE",
                    value: v.to_string(),
                });
            }
            self.page_size = v as usize;
        }
        if let Some(v) = env_number("FRD_DELETE_DELAY_MS")? {
            self.delete_delay_ms = v;
        }
        if let Some(v) = env_number("FRD_UPDATE_DELAY_MS")? {
            self.update_delay_ms = v;
        }
        if let Some(v) = env_number("FRD_REQUEST_TIMEOUT_MS")? {
            self.request_timeout_ms = v;
        }
        if let Some(v) = env_flag("FRD_SIMULATE")? {
            self.simulate_updates = v;
        }
        Ok(())
    }
}

fn env_number(key: &'static str) -> Result<Option<u64>, ConfigError> {
    match env_value(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::Env { key, value: raw }),
    }
}

/// Trimmed value of `key`; blank counts as unset.
fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_flag(key: &'static str) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = env_value(key) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::Env { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::EnvScope;
    use std::io::Write as _;

    const KEYS: &[&str] = &[
        "FRD_ENDPOINT",
        "FRD_TOKEN",
        "FRD_PAGE_SIZE",
        "FRD_DELETE_DELAY_MS",
        "FRD_UPDATE_DELAY_MS",
        "FRD_REQUEST_TIMEOUT_MS",
        "FRD_SIMULATE",
    ];

    #[test]
    fn defaults_match_design_values() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.page_size, 5);
        assert_eq!(cfg.delete_delay(), Duration::from_millis(300));
        assert_eq!(cfg.update_delay(), Duration::from_millis(500));
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = DashboardConfig::from_toml_str("page_size = 10\nendpoint = \"http://x/y\"\n")
            .expect("valid");
        assert_eq!(cfg.page_size, 10);
        assert_eq!(cfg.endpoint, "http://x/y");
        assert_eq!(cfg.delete_delay_ms, DEFAULT_DELETE_DELAY_MS);
    }

    #[test]
    fn schema_rejects_zero_page_size_and_wrong_types() {
        assert!(matches!(
            DashboardConfig::from_toml_str("page_size = 0"),
            Err(ConfigError::Schema(_))
        ));
        assert!(matches!(
            DashboardConfig::from_toml_str("delete_delay_ms = \"soon\""),
            Err(ConfigError::Schema(_))
        ));
        assert!(DashboardConfig::from_toml_str("unknown_key = 1").is_err());
        assert!(matches!(
            DashboardConfig::from_toml_str("page_size = ["),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn resolve_layers_file_then_env() {
        let mut env = EnvScope::new(KEYS);
        let mut file = tempfile::NamedTempFile::new().expect("tmp");
        writeln!(file, "page_size = 8\nupdate_delay_ms = 50").expect("write");

        env.set("FRD_PAGE_SIZE", "3");
        env.set("FRD_SIMULATE", "yes");
        env.set("FRD_TOKEN", " secret ");
        let cfg = DashboardConfig::resolve(Some(file.path())).expect("resolve");
        assert_eq!(cfg.page_size, 3);
        assert_eq!(cfg.update_delay_ms, 50);
        assert!(cfg.simulate_updates);
        assert_eq!(cfg.token.as_deref(), Some("secret"));
    }

    #[test]
    fn bad_env_numbers_are_errors() {
        let mut env = EnvScope::new(KEYS);
        env.set("FRD_DELETE_DELAY_MS", "fast");
        assert!(matches!(
            DashboardConfig::resolve(None),
            Err(ConfigError::Env {
                key: "FRD_DELETE_DELAY_MS",
                ..
            })
        ));
        env.set("FRD_DELETE_DELAY_MS", "10");
        env.set("FRD_PAGE_SIZE", "0");
        assert!(DashboardConfig::resolve(None).is_err());
    }

    #[test]
    fn simulate_flag_accepts_word_forms_and_rejects_others() {
        let mut env = EnvScope::new(KEYS);
        for (raw, want) in [("On", true), ("1", true), ("no", false), ("FALSE", false)] {
            env.set("FRD_SIMULATE", raw);
            let cfg = DashboardConfig::resolve(None).expect("resolve");
            assert_eq!(cfg.simulate_updates, want, "FRD_SIMULATE={raw}");
        }
        env.set("FRD_SIMULATE", "maybe");
        assert!(matches!(
            DashboardConfig::resolve(None),
            Err(ConfigError::Env {
                key: "FRD_SIMULATE",
                ..
            })
        ));
        env.set("FRD_SIMULATE", "   ");
        assert!(!DashboardConfig::resolve(None).expect("blank").simulate_updates);
    }

    #[test]
    fn blank_endpoint_env_keeps_default() {
        let mut env = EnvScope::new(KEYS);
        env.set("FRD_ENDPOINT", "  ");
        let cfg = DashboardConfig::resolve(None).expect("resolve");
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = DashboardConfig::load(Path::new("/definitely/not/here.toml"))
            .expect_err("missing");
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
