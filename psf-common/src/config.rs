//! Configuration loading for PSF
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables (`PSF_*`)
//! 3. TOML config file
//! 4. Compiled defaults (fallback)
//!
//! The result is an immutable [`Config`] handed to the search pipeline at
//! construction time. Nothing reads configuration from globals afterwards.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Default HTTP port for psf-search
pub const DEFAULT_PORT: u16 = 5780;
/// Environment variable naming an explicit config file
pub const ENV_CONFIG_PATH: &str = "PSF_CONFIG";

const DEFAULT_BIND: &str = "127.0.0.1";
const DEFAULT_BATCH_LIMIT: usize = 50;
const DEFAULT_BULK_CONCURRENCY: usize = 4;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_ICECAT_ENDPOINT: &str = "https://live.icecat.biz/api";
const DEFAULT_GS1_ENDPOINT: &str = "https://api.gs1.org/v1";

/// Gemini keys shorter than this are rejected as malformed
const MIN_GEMINI_KEY_LEN: usize = 20;

// ============================================================================
// Source identifiers
// ============================================================================

/// Live data sources that can be enabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// AI search with web grounding (Gemini)
    Gemini,
    /// Product database (Icecat)
    Icecat,
    /// Barcode registry (GS1)
    Gs1,
}

impl SourceKind {
    pub fn id(&self) -> &'static str {
        match self {
            SourceKind::Gemini => "gemini",
            SourceKind::Icecat => "icecat",
            SourceKind::Gs1 => "gs1",
        }
    }

    /// Every live source, in the default priority order
    pub fn all() -> Vec<SourceKind> {
        vec![SourceKind::Icecat, SourceKind::Gemini, SourceKind::Gs1]
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" | "ai_search" => Ok(SourceKind::Gemini),
            "icecat" | "product_db" => Ok(SourceKind::Icecat),
            "gs1" | "barcode_registry" => Ok(SourceKind::Gs1),
            other => Err(Error::Config(format!("Unknown data source: '{}'", other))),
        }
    }
}

// ============================================================================
// TOML file schema
// ============================================================================

/// Configuration file contents; every field optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub demo_mode: Option<bool>,
    /// Ordered list; order is merge priority
    pub enabled_sources: Option<Vec<String>>,
    pub batch_limit: Option<usize>,
    pub bulk_concurrency: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub retry_backoff_ms: Option<u64>,
    pub logging: LoggingConfig,
    pub gemini: GeminiToml,
    pub icecat: IcecatToml,
    pub gs1: Gs1Toml,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GeminiToml {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub requests_per_second: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IcecatToml {
    pub username: Option<String>,
    pub api_token: Option<String>,
    pub content_token: Option<String>,
    pub language: Option<String>,
    pub endpoint: Option<String>,
    pub requests_per_second: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Gs1Toml {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub requests_per_second: Option<u32>,
}

impl TomlConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }
}

// ============================================================================
// Resolved configuration
// ============================================================================

/// Command-line overrides (tier 1)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub bind: Option<String>,
    pub port: Option<u16>,
    /// `--demo` forces demo mode on
    pub demo: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub requests_per_second: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IcecatSettings {
    pub username: Option<String>,
    pub api_token: Option<String>,
    pub content_token: Option<String>,
    pub language: String,
    pub endpoint: String,
    pub requests_per_second: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gs1Settings {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub requests_per_second: u32,
}

/// Immutable service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    /// Replace live sources with the static sample set
    pub demo_mode: bool,
    /// Enabled live sources in priority order (earliest wins merge ties)
    pub enabled_sources: Vec<SourceKind>,
    pub batch_limit: usize,
    pub bulk_concurrency: usize,
    pub request_timeout: Duration,
    pub retry_backoff: Duration,
    pub log_level: String,
    pub gemini: GeminiSettings,
    pub icecat: IcecatSettings,
    pub gs1: Gs1Settings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            demo_mode: false,
            enabled_sources: SourceKind::all(),
            batch_limit: DEFAULT_BATCH_LIMIT,
            bulk_concurrency: DEFAULT_BULK_CONCURRENCY,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            log_level: default_log_level(),
            gemini: GeminiSettings {
                api_key: None,
                model: DEFAULT_GEMINI_MODEL.to_string(),
                endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
                requests_per_second: 2,
            },
            icecat: IcecatSettings {
                username: None,
                api_token: None,
                content_token: None,
                language: "en".to_string(),
                endpoint: DEFAULT_ICECAT_ENDPOINT.to_string(),
                requests_per_second: 5,
            },
            gs1: Gs1Settings {
                api_key: None,
                endpoint: DEFAULT_GS1_ENDPOINT.to_string(),
                requests_per_second: 5,
            },
        }
    }
}

impl Config {
    /// Load configuration from file, process environment and CLI overrides
    ///
    /// A missing default config file is not an error (defaults are used).
    /// A missing file named explicitly via `--config`/`PSF_CONFIG` is.
    pub fn load(cli: &CliOverrides) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();

        let explicit = cli
            .config_path
            .clone()
            .or_else(|| env(ENV_CONFIG_PATH).map(PathBuf::from));

        let toml = match explicit {
            Some(path) => {
                info!("Loading config: {}", path.display());
                TomlConfig::from_file(&path)?
            }
            None => match default_config_path() {
                Some(path) if path.exists() => {
                    info!("Loading config: {}", path.display());
                    TomlConfig::from_file(&path)?
                }
                _ => {
                    warn!("No config file found, using defaults and environment");
                    TomlConfig::default()
                }
            },
        };

        Self::resolve(toml, env, cli)
    }

    /// Merge the tiers and validate
    ///
    /// `env` looks up environment variables; tests pass a closure over a map.
    pub fn resolve<F>(toml: TomlConfig, env: F, cli: &CliOverrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let enabled_names = match env("PSF_ENABLED_SOURCES") {
            Some(list) => Some(list.split(',').map(str::to_string).collect::<Vec<_>>()),
            None => toml.enabled_sources.clone(),
        };
        let enabled_sources = match enabled_names {
            Some(names) => parse_source_list(&names)?,
            None => defaults.enabled_sources.clone(),
        };

        let demo_mode = cli.demo
            || match env("PSF_DEMO_MODE") {
                Some(v) => parse_bool("PSF_DEMO_MODE", &v)?,
                None => toml.demo_mode.unwrap_or(defaults.demo_mode),
            };

        let batch_limit = match env("PSF_BATCH_LIMIT") {
            Some(v) => parse_number::<usize>("PSF_BATCH_LIMIT", &v)?,
            None => toml.batch_limit.unwrap_or(defaults.batch_limit),
        };

        let port = match (cli.port, env("PSF_PORT")) {
            (Some(port), _) => port,
            (None, Some(v)) => parse_number::<u16>("PSF_PORT", &v)?,
            (None, None) => toml.port.unwrap_or(defaults.port),
        };

        let bind = cli
            .bind
            .clone()
            .or(toml.bind.clone())
            .unwrap_or(defaults.bind);

        let gemini = GeminiSettings {
            api_key: resolve_secret("Gemini API key", env("PSF_GEMINI_API_KEY"), toml.gemini.api_key),
            model: toml.gemini.model.unwrap_or(defaults.gemini.model),
            endpoint: toml.gemini.endpoint.unwrap_or(defaults.gemini.endpoint),
            requests_per_second: toml
                .gemini
                .requests_per_second
                .unwrap_or(defaults.gemini.requests_per_second),
        };

        let icecat = IcecatSettings {
            username: resolve_secret("Icecat username", env("PSF_ICECAT_USERNAME"), toml.icecat.username),
            api_token: resolve_secret("Icecat API token", env("PSF_ICECAT_API_TOKEN"), toml.icecat.api_token),
            content_token: resolve_secret(
                "Icecat content token",
                env("PSF_ICECAT_CONTENT_TOKEN"),
                toml.icecat.content_token,
            ),
            language: toml.icecat.language.unwrap_or(defaults.icecat.language),
            endpoint: toml.icecat.endpoint.unwrap_or(defaults.icecat.endpoint),
            requests_per_second: toml
                .icecat
                .requests_per_second
                .unwrap_or(defaults.icecat.requests_per_second),
        };

        let gs1 = Gs1Settings {
            api_key: resolve_secret("GS1 API key", env("PSF_GS1_API_KEY"), toml.gs1.api_key),
            endpoint: toml.gs1.endpoint.unwrap_or(defaults.gs1.endpoint),
            requests_per_second: toml
                .gs1
                .requests_per_second
                .unwrap_or(defaults.gs1.requests_per_second),
        };

        let config = Config {
            bind,
            port,
            demo_mode,
            enabled_sources,
            batch_limit,
            bulk_concurrency: toml.bulk_concurrency.unwrap_or(defaults.bulk_concurrency),
            request_timeout: toml
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            retry_backoff: toml
                .retry_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_backoff),
            log_level: toml.logging.level,
            gemini,
            icecat,
            gs1,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.batch_limit == 0 {
            return Err(Error::Config("batch_limit must be at least 1".to_string()));
        }
        if self.bulk_concurrency == 0 {
            return Err(Error::Config("bulk_concurrency must be at least 1".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::Config("request_timeout_secs must be at least 1".to_string()));
        }
        for (name, rps) in [
            ("gemini", self.gemini.requests_per_second),
            ("icecat", self.icecat.requests_per_second),
            ("gs1", self.gs1.requests_per_second),
        ] {
            if rps == 0 {
                return Err(Error::Config(format!(
                    "{}.requests_per_second must be at least 1",
                    name
                )));
            }
        }
        if let Some(key) = &self.gemini.api_key {
            if key.len() < MIN_GEMINI_KEY_LEN {
                return Err(Error::Config(
                    "Gemini API key looks malformed (too short)".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Enabled sources that have the credentials they need, in priority order
    ///
    /// Gemini needs an API key, Icecat needs a username. GS1 key is optional.
    pub fn active_sources(&self) -> Vec<SourceKind> {
        self.enabled_sources
            .iter()
            .copied()
            .filter(|kind| {
                let ready = match kind {
                    SourceKind::Gemini => self.gemini.api_key.is_some(),
                    SourceKind::Icecat => self.icecat.username.is_some(),
                    SourceKind::Gs1 => true,
                };
                if !ready {
                    warn!(source = %kind, "Source enabled but credentials missing; skipping");
                }
                ready
            })
            .collect()
    }
}

/// Default config file location (`~/.config/psf/psf-search.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("psf").join("psf-search.toml"))
}

/// Validate a secret (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Pick a credential from ENV → TOML, warning when both are set
fn resolve_secret(label: &str, env_value: Option<String>, toml_value: Option<String>) -> Option<String> {
    let env_value = env_value.filter(|v| is_valid_key(v)).map(|v| v.trim().to_string());
    let toml_value = toml_value.filter(|v| is_valid_key(v)).map(|v| v.trim().to_string());

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in multiple sources: environment, TOML. Using environment (higher priority).",
            label
        );
    }
    env_value.or(toml_value)
}

fn parse_source_list(names: &[String]) -> Result<Vec<SourceKind>> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();
    for name in names.iter().filter(|n| !n.trim().is_empty()) {
        let kind: SourceKind = name.parse()?;
        if !seen.insert(kind) {
            return Err(Error::Config(format!(
                "Data source '{}' listed more than once",
                kind
            )));
        }
        sources.push(kind);
    }
    Ok(sources)
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{}: invalid boolean '{}'", name, other))),
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{}: invalid number '{}'", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_when_nothing_configured() {
        let config = Config::resolve(TomlConfig::default(), no_env, &CliOverrides::default()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(
            config.enabled_sources,
            vec![SourceKind::Icecat, SourceKind::Gemini, SourceKind::Gs1]
        );
    }

    #[test]
    fn test_source_aliases() {
        assert_eq!("ai_search".parse::<SourceKind>().unwrap(), SourceKind::Gemini);
        assert_eq!("product_db".parse::<SourceKind>().unwrap(), SourceKind::Icecat);
        assert_eq!("Barcode_Registry".parse::<SourceKind>().unwrap(), SourceKind::Gs1);
        assert!("bing".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_duplicate_sources_rejected() {
        let toml = TomlConfig {
            enabled_sources: Some(vec!["gemini".into(), "google".into()]),
            ..Default::default()
        };
        assert!(Config::resolve(toml, no_env, &CliOverrides::default()).is_err());
    }

    #[test]
    fn test_env_overrides_toml() {
        let toml = TomlConfig::from_toml_str(
            r#"
            batch_limit = 10
            enabled_sources = ["icecat"]
            [icecat]
            username = "toml-user"
            "#,
        )
        .unwrap();

        let env: HashMap<&str, &str> = [
            ("PSF_BATCH_LIMIT", "3"),
            ("PSF_ICECAT_USERNAME", "env-user"),
            ("PSF_ENABLED_SOURCES", "gs1, icecat"),
        ]
        .into_iter()
        .collect();

        let config = Config::resolve(
            toml,
            |k| env.get(k).map(|v| v.to_string()),
            &CliOverrides::default(),
        )
        .unwrap();

        assert_eq!(config.batch_limit, 3);
        assert_eq!(config.icecat.username.as_deref(), Some("env-user"));
        assert_eq!(config.enabled_sources, vec![SourceKind::Gs1, SourceKind::Icecat]);
    }

    #[test]
    fn test_cli_overrides_everything() {
        let toml = TomlConfig {
            port: Some(9000),
            demo_mode: Some(false),
            ..Default::default()
        };
        let cli = CliOverrides {
            port: Some(9100),
            demo: true,
            ..Default::default()
        };
        let config = Config::resolve(toml, |k| (k == "PSF_PORT").then(|| "9050".to_string()), &cli).unwrap();
        assert_eq!(config.port, 9100);
        assert!(config.demo_mode);
    }

    #[test]
    fn test_zero_batch_limit_rejected() {
        let toml = TomlConfig {
            batch_limit: Some(0),
            ..Default::default()
        };
        assert!(Config::resolve(toml, no_env, &CliOverrides::default()).is_err());
    }

    #[test]
    fn test_short_gemini_key_rejected() {
        let toml = TomlConfig::from_toml_str("[gemini]\napi_key = \"short\"").unwrap();
        assert!(Config::resolve(toml, no_env, &CliOverrides::default()).is_err());
    }

    #[test]
    fn test_blank_secret_treated_as_absent() {
        let toml = TomlConfig::from_toml_str("[gs1]\napi_key = \"   \"").unwrap();
        let config = Config::resolve(toml, no_env, &CliOverrides::default()).unwrap();
        assert_eq!(config.gs1.api_key, None);
    }

    #[test]
    fn test_active_sources_skip_missing_credentials() {
        let mut config = Config::default();
        config.icecat.username = Some("user".into());
        assert_eq!(config.active_sources(), vec![SourceKind::Icecat, SourceKind::Gs1]);
    }
}
