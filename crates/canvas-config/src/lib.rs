//! Configuration management for the canvas host.
//!
//! Parses `canvas.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! The canvas host recognizes exactly four options: the canvas root
//! directory, the listen port, the bind host, and an escape hatch that
//! keeps the host from starting under automated-test/CI execution.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override bind host.
    pub host: Option<String>,
    /// Override listen port.
    pub port: Option<u16>,
    /// Override canvas root directory.
    pub root_dir: Option<PathBuf>,
    /// Override the test/CI escape hatch.
    pub allow_in_tests: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "canvas.toml";

/// Default canvas root, relative to the user's home directory.
const DEFAULT_ROOT: &str = "~/canvas";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener configuration.
    pub server: ServerConfig,
    /// Canvas root configuration (path is a raw string from TOML).
    canvas: CanvasConfigRaw,
    /// Start the host even under automated-test/CI execution.
    pub allow_in_tests: bool,

    /// Resolved canvas root directory (set after loading).
    #[serde(skip)]
    pub root_dir: PathBuf,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            canvas: CanvasConfigRaw::default(),
            allow_in_tests: false,
            root_dir: default_root_dir(),
            config_path: None,
        }
    }
}

/// The default canvas root (`~/canvas`), expanded and absolutized.
#[must_use]
pub fn default_root_dir() -> PathBuf {
    resolve_user_path(Path::new(DEFAULT_ROOT))
}

/// Listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host address.
    pub host: String,
    /// Listen port (0 = OS-assigned ephemeral port).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 0,
        }
    }
}

/// Raw canvas section as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CanvasConfigRaw {
    root_dir: Option<String>,
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
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `canvas.toml` in the current directory and
    /// parents, falling back to built-in defaults.
    ///
    /// CLI settings are applied after loading and path resolution, allowing
    /// CLI arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
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

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.root_dir = config
            .canvas
            .root_dir
            .as_deref()
            .map_or_else(default_root_dir, |raw| resolve_user_path(Path::new(raw)));
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(root_dir) = &settings.root_dir {
            self.root_dir = resolve_user_path(root_dir);
        }
        if let Some(allow_in_tests) = settings.allow_in_tests {
            self.allow_in_tests = allow_in_tests;
        }
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "server.host cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
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
}

/// Expand `~` and make a user-supplied path absolute against the CWD.
///
/// Does not touch the filesystem; the path may not exist yet.
#[must_use]
pub fn resolve_user_path(path: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let expanded = PathBuf::from(expanded);
    if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir().unwrap_or_default().join(expanded)
    }
}

/// Whether the environment requests skipping the canvas host.
///
/// True when `CANVAS_HOST_SKIP=1` is set or a test/CI environment
/// (`NEXTEST`, `CI`) is detected. The caller decides whether
/// `allow_in_tests` overrides the request.
#[must_use]
pub fn skip_requested() -> bool {
    if std::env::var("CANVAS_HOST_SKIP").as_deref() == Ok("1") {
        return true;
    }
    std::env::var_os("NEXTEST").is_some() || std::env::var_os("CI").is_some()
}
