//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/phyphox-mqtt/phyphox-mqtt.toml`
//! 3. Explicit config file passed with `--config`
//! 4. Environment variables: `PHYPHOX_MQTT_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{expand_env_vars, PHYPHOX_NAMESPACE};

/// Default location of the base template, relative to the working directory.
pub const DEFAULT_TEMPLATE_PATH: &str = "templates/mqtt_connector_base.phyphox";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "PHYPHOX_MQTT";

/// Raw settings for intermediate parsing (`None` → not specified, inherit).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub template_path: Option<PathBuf>,
    pub namespace: Option<String>,
    pub output_dir: Option<PathBuf>,
}

/// Unified configuration for phyphox-mqtt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Base template every experiment file is derived from
    pub template_path: PathBuf,
    /// Namespace the template root must be in
    pub namespace: String,
    /// Directory generated files are written to (default: cwd)
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            namespace: PHYPHOX_NAMESPACE.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Get the XDG config directory for phyphox-mqtt.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "phyphox-mqtt").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("phyphox-mqtt.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    ///
    /// Handles `~`, `$VAR`, and `${VAR}` syntax.
    fn expand_paths(&mut self) {
        self.template_path = PathBuf::from(expand_env_vars(
            self.template_path.to_string_lossy().as_ref(),
        ));
        self.output_dir = PathBuf::from(expand_env_vars(
            self.output_dir.to_string_lossy().as_ref(),
        ));
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            template_path: overlay
                .template_path
                .clone()
                .unwrap_or_else(|| self.template_path.clone()),
            namespace: overlay
                .namespace
                .clone()
                .unwrap_or_else(|| self.namespace.clone()),
            output_dir: overlay
                .output_dir
                .clone()
                .unwrap_or_else(|| self.output_dir.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Optional explicit config file; must exist if given
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(ApplicationError::Config {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            let raw = load_raw_settings(path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply PHYPHOX_MQTT_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("template_path") {
            settings.template_path = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("namespace") {
            settings.namespace = val;
        }
        if let Ok(val) = config.get_string("output_dir") {
            settings.output_dir = PathBuf::from(val);
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# phyphox-mqtt configuration
#
# Locations (by precedence, lowest to highest):
#   Global:   ~/.config/phyphox-mqtt/phyphox-mqtt.toml
#   Explicit: file passed with --config
#   Env:      PHYPHOX_MQTT_* environment variables (e.g. PHYPHOX_MQTT_TEMPLATE_PATH)

# Base template all experiment files are derived from
# template_path = "templates/mqtt_connector_base.phyphox"

# Namespace of the template root element
# namespace = "http://phyphox.org/xml"

# Directory generated files are written to
# output_dir = "."
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
