//! Configuration management for umlpage.
//!
//! Parses `umlpage.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! `kroki.url` supports environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use umlpage_engine::ImageFormat;
use umlpage_render::{DEFAULT_PARTIAL_MARKER, DEFAULT_ZOOM};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "umlpage.toml";

/// Default Kroki server.
const DEFAULT_KROKI_URL: &str = "https://kroki.io";

/// Default Kroki request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override zoom percentage.
    pub zoom: Option<u32>,
    /// Override output format.
    pub format: Option<ImageFormat>,
    /// Override raster width.
    pub width: Option<u32>,
    /// Override Kroki URL.
    pub kroki_url: Option<String>,
    /// Additional include directories, searched after configured ones.
    pub include_dirs: Vec<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Render settings (raw, as parsed from TOML).
    render: RenderConfigRaw,
    /// Kroki server settings.
    pub kroki: KrokiConfig,
    /// Include directories (raw, relative to the config file).
    includes: IncludesConfigRaw,

    /// Resolved render configuration (set after loading).
    #[serde(skip)]
    pub render_resolved: RenderConfig,
    /// Resolved include directories (set after loading).
    #[serde(skip)]
    pub include_dirs: Vec<PathBuf>,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Raw render configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RenderConfigRaw {
    zoom: Option<u32>,
    format: Option<String>,
    width: Option<u32>,
    partial_marker: Option<String>,
}

/// Resolved render configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    /// Zoom in percent.
    pub zoom: u32,
    /// Output image format.
    pub format: ImageFormat,
    /// Raster width pages are resampled to.
    pub width: Option<u32>,
    /// Substring that opts a document into partial rendering.
    pub partial_marker: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            format: ImageFormat::Png,
            width: None,
            partial_marker: DEFAULT_PARTIAL_MARKER.to_owned(),
        }
    }
}

/// Kroki server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KrokiConfig {
    /// Kroki server URL.
    pub url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for KrokiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_KROKI_URL.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl KrokiConfig {
    /// Request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Raw include configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct IncludesConfigRaw {
    dirs: Option<Vec<String>>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`kroki.url`").
        field: String,
        /// Error message (e.g., "${`KROKI_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
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
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `umlpage.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, so CLI
    /// arguments take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
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
            .and_then(|cwd| Self::discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(zoom) = settings.zoom {
            self.render_resolved.zoom = zoom;
        }
        if let Some(format) = settings.format {
            self.render_resolved.format = format;
        }
        if let Some(width) = settings.width {
            self.render_resolved.width = Some(width);
        }
        if let Some(kroki_url) = &settings.kroki_url {
            self.kroki.url.clone_from(kroki_url);
        }
        self.include_dirs
            .extend(settings.include_dirs.iter().cloned());
    }

    /// Search for a config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after applying CLI
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_render()?;
        self.validate_kroki()?;
        Ok(())
    }

    /// Validate render configuration.
    fn validate_render(&self) -> Result<(), ConfigError> {
        let render = &self.render_resolved;
        if render.zoom == 0 {
            return Err(ConfigError::Validation(
                "render.zoom must be greater than 0".to_owned(),
            ));
        }
        if render.width == Some(0) {
            return Err(ConfigError::Validation(
                "render.width must be greater than 0".to_owned(),
            ));
        }
        require_non_empty(&render.partial_marker, "render.partial_marker")?;
        Ok(())
    }

    /// Validate Kroki configuration.
    fn validate_kroki(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.kroki.url, "kroki.url")?;
        require_http_url(&self.kroki.url, "kroki.url")?;
        if self.kroki.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "kroki.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.kroki.url = expand::expand_env(&self.kroki.url, "kroki.url")?;
        Ok(())
    }

    /// Resolve raw sections: parse the format and make include directories
    /// absolute against the config directory.
    fn resolve(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let format = match self.render.format.as_deref() {
            Some(format) => format
                .parse::<ImageFormat>()
                .map_err(|e| ConfigError::Validation(format!("render.format: {e}")))?,
            None => ImageFormat::Png,
        };

        self.render_resolved = RenderConfig {
            zoom: self.render.zoom.unwrap_or(DEFAULT_ZOOM),
            format,
            width: self.render.width,
            partial_marker: self
                .render
                .partial_marker
                .clone()
                .unwrap_or_else(|| DEFAULT_PARTIAL_MARKER.to_owned()),
        };

        self.include_dirs = self
            .includes
            .dirs
            .iter()
            .flatten()
            .map(|d| config_dir.join(d))
            .collect();

        Ok(())
    }
}
