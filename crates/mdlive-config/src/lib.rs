//! Configuration management for mdlive.
//!
//! Parses `mdlive.toml` with serde and discovers the file in the working
//! directory or its parents. CLI settings override file values via
//! [`CliSettings`].
//!
//! `diagrams.kroki_url` supports environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdlive.toml";

/// Polling floor applied by the change detector.
const MIN_RELOAD_INTERVAL_MS: u64 = 1000;

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub theme: Option<String>,
    pub gfm: Option<bool>,
    pub kroki_url: Option<String>,
    pub reload_enabled: Option<bool>,
    pub interval_ms: Option<u64>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    pub diagrams: DiagramsConfig,
    pub reload: ReloadConfig,
    pub tracker: TrackerConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Markdown rendering configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Built-in theme identifier.
    pub theme: String,
    /// Enable GitHub Flavored Markdown extensions.
    pub gfm: bool,
    /// Documents larger than this are shown as escaped text with an error banner.
    pub max_input_bytes: Option<usize>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            theme: "light".to_owned(),
            gfm: true,
            max_input_bytes: None,
        }
    }
}

/// Diagram rendering configuration.
///
/// Diagrams stay as code blocks unless `kroki_url` is set.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiagramsConfig {
    pub kroki_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            kroki_url: None,
            timeout_secs: 30,
        }
    }
}

impl DiagramsConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Change detection configuration for `watch`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    pub enabled: bool,
    /// Polling interval; values below one second are raised to it.
    pub interval_ms: u64,
    /// Hosts that may be polled over HTTP. `None` allows any host.
    pub allowed_hosts: Option<Vec<String>>,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 2000,
            allowed_hosts: None,
        }
    }
}

impl ReloadConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(MIN_RELOAD_INTERVAL_MS))
    }
}

/// Active-heading tracker configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Height of the fixed page header, in pixels.
    pub header_offset: f64,
    pub discovery_timeout_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            header_offset: 64.0,
            discovery_timeout_ms: 2000,
        }
    }
}

impl TrackerConfig {
    #[must_use]
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g. `diagrams.kroki_url`).
        field: String,
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `mdlive.toml` in the current directory and parents, falling back to
    /// defaults. CLI settings are applied last and the result is validated.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// the merged configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_from(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }
        config.validate()?;

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(theme) = &settings.theme {
            self.render.theme.clone_from(theme);
        }
        if let Some(gfm) = settings.gfm {
            self.render.gfm = gfm;
        }
        if let Some(kroki_url) = &settings.kroki_url {
            self.diagrams.kroki_url = Some(kroki_url.clone());
        }
        if let Some(enabled) = settings.reload_enabled {
            self.reload.enabled = enabled;
        }
        if let Some(interval_ms) = settings.interval_ms {
            self.reload.interval_ms = interval_ms;
        }
    }

    /// Search for the config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(url) = &self.diagrams.kroki_url {
            self.diagrams.kroki_url = Some(expand::expand_env(url, "diagrams.kroki_url")?);
        }
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.render.theme, "render.theme")?;
        if self.render.max_input_bytes == Some(0) {
            return Err(ConfigError::Validation(
                "render.max_input_bytes must be greater than 0".to_owned(),
            ));
        }

        if let Some(kroki_url) = &self.diagrams.kroki_url {
            require_non_empty(kroki_url, "diagrams.kroki_url")?;
            require_http_url(kroki_url, "diagrams.kroki_url")?;
        }
        if self.diagrams.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "diagrams.timeout_secs must be greater than 0".to_owned(),
            ));
        }

        if self.reload.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "reload.interval_ms must be greater than 0".to_owned(),
            ));
        }
        for host in self.reload.allowed_hosts.iter().flatten() {
            require_non_empty(host, "reload.allowed_hosts")?;
        }

        if !self.tracker.header_offset.is_finite() || self.tracker.header_offset < 0.0 {
            return Err(ConfigError::Validation(
                "tracker.header_offset must be a non-negative number".to_owned(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.render.theme, "light");
        assert!(config.render.gfm);
        assert_eq!(config.diagrams.kroki_url, None);
        assert_eq!(config.diagrams.timeout(), Duration::from_secs(30));
        assert!(config.reload.enabled);
        assert_eq!(config.reload.interval(), Duration::from_millis(2000));
        assert_eq!(config.tracker.header_offset, 64.0);
        assert_eq!(config.tracker.discovery_timeout(), Duration::from_secs(2));
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.render.theme, "light");
        assert_eq!(config.reload.interval_ms, 2000);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[render]
theme = "sepia"
gfm = false
max_input_bytes = 65536

[diagrams]
kroki_url = "https://kroki.io"
timeout_secs = 5

[reload]
enabled = false
interval_ms = 5000
allowed_hosts = ["docs.example.com"]

[tracker]
header_offset = 80.0
discovery_timeout_ms = 500
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.render.theme, "sepia");
        assert!(!config.render.gfm);
        assert_eq!(config.render.max_input_bytes, Some(65536));
        assert_eq!(config.diagrams.kroki_url.as_deref(), Some("https://kroki.io"));
        assert_eq!(config.diagrams.timeout_secs, 5);
        assert!(!config.reload.enabled);
        assert_eq!(config.reload.interval_ms, 5000);
        assert_eq!(
            config.reload.allowed_hosts,
            Some(vec!["docs.example.com".to_owned()])
        );
        assert_eq!(config.tracker.header_offset, 80.0);
        assert_eq!(config.tracker.discovery_timeout_ms, 500);
    }

    #[test]
    fn test_interval_floor() {
        let config: Config = toml::from_str("[reload]\ninterval_ms = 200\n").unwrap();
        assert_eq!(config.reload.interval(), Duration::from_millis(1000));
        config.validate().unwrap();
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings {
            theme: Some("dark".to_owned()),
            kroki_url: Some("http://localhost:8000".to_owned()),
            interval_ms: Some(1500),
            ..Default::default()
        });

        assert_eq!(config.render.theme, "dark");
        assert!(config.render.gfm);
        assert_eq!(
            config.diagrams.kroki_url.as_deref(),
            Some("http://localhost:8000")
        );
        assert_eq!(config.reload.interval_ms, 1500);
        assert!(config.reload.enabled);
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.render.theme, "light");
        assert_eq!(config.diagrams.kroki_url, None);
    }

    #[test]
    fn test_validate_kroki_url_scheme() {
        let mut config = Config::default();
        config.diagrams.kroki_url = Some("kroki.io".to_owned());
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: diagrams.kroki_url must start with http:// or https://"
        );
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = Config::default();
        config.reload.interval_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = Config::default();
        config.diagrams.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = Config::default();
        config.render.max_input_bytes = Some(0);
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_bad_header_offset() {
        let mut config = Config::default();
        config.tracker.header_offset = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_empty_theme() {
        let mut config = Config::default();
        config.render.theme = String::new();
        assert!(config.validate().unwrap_err().to_string().contains("render.theme"));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[render]\ntheme = \"dark\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.render.theme, "dark");
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load(Some(&path), None),
            Err(ConfigError::NotFound(p)) if p == path
        ));
    }

    #[test]
    fn test_load_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mdlive.toml");
        std::fs::write(&path, "[render\n").unwrap();
        assert!(matches!(
            Config::load(Some(&path), None),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_cli_settings_override_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mdlive.toml");
        std::fs::write(&path, "[render]\ntheme = \"dark\"\n").unwrap();

        let settings = CliSettings {
            theme: Some("sepia".to_owned()),
            ..Default::default()
        };
        let config = Config::load(Some(&path), Some(&settings)).unwrap();
        assert_eq!(config.render.theme, "sepia");
    }

    #[test]
    fn test_discover_in_parent() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("docs").join("guide");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            Config::discover_from(&nested),
            Some(dir.path().join(CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_expand_kroki_url() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("MDLIVE_TEST_KROKI_HOST", "kroki.internal");
        }
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mdlive.toml");
        std::fs::write(
            &path,
            "[diagrams]\nkroki_url = \"https://${MDLIVE_TEST_KROKI_HOST}\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(
            config.diagrams.kroki_url.as_deref(),
            Some("https://kroki.internal")
        );
        unsafe {
            std::env::remove_var("MDLIVE_TEST_KROKI_HOST");
        }
    }

    #[test]
    fn test_expand_missing_var_fails_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mdlive.toml");
        std::fs::write(
            &path,
            "[diagrams]\nkroki_url = \"${MDLIVE_TEST_KROKI_MISSING}\"\n",
        )
        .unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(
            matches!(&err, ConfigError::EnvVar { field, .. } if field == "diagrams.kroki_url"),
            "got {err:?}"
        );
    }
}
