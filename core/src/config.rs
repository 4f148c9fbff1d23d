use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Main configuration structure for Tracelane.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub viewer: ViewerConfig,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file is missing.
    /// A file that exists but does not parse is still an error.
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config file at {:?}, using defaults", path.as_ref());
            Ok(Self::default())
        }
    }

    /// Get the default configuration as a TOML string.
    pub fn default_toml() -> Result<String> {
        let config = Self::default();
        toml::to_string_pretty(&config).context("Failed to serialize default config")
    }

    /// Validate the configuration for obvious misconfiguration.
    pub fn validate(&self) -> Result<()> {
        if !is_positive(self.layout.margin) {
            anyhow::bail!("layout.margin must be greater than 0");
        }

        if !is_positive(self.layout.min_lane_height) {
            anyhow::bail!("layout.min_lane_height must be greater than 0");
        }

        if !is_positive(self.viewer.pan_step) {
            anyhow::bail!("viewer.pan_step must be greater than 0");
        }

        if !is_positive(self.viewer.zoom_in) || !is_positive(self.viewer.zoom_out) {
            anyhow::bail!("viewer zoom factors must be greater than 0");
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => anyhow::bail!("Invalid log level: {}", other),
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("Failed to parse config")?;
        Ok(config)
    }
}

/// Spacing used by the lane layout engine, in renderer units.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayoutConfig {
    #[serde(default = "default_margin")]
    pub margin: f64,

    #[serde(default = "default_min_lane_height")]
    pub min_lane_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: default_margin(),
            min_lane_height: default_min_lane_height(),
        }
    }
}

/// Interactive viewer behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewerConfig {
    #[serde(default = "default_pan_step")]
    pub pan_step: f64,

    #[serde(default = "default_zoom_in")]
    pub zoom_in: f64,

    #[serde(default = "default_zoom_out")]
    pub zoom_out: f64,

    #[serde(default = "default_true")]
    pub show_tree: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            pan_step: default_pan_step(),
            zoom_in: default_zoom_in(),
            zoom_out: default_zoom_out(),
            show_tree: true,
        }
    }
}

/// Event log reading.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SourceConfig {
    /// Binary paths under this directory are shown relative to it
    pub project_root: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub include_modules: bool,

    /// Where logs go while the terminal viewer owns the screen
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            include_modules: false,
            file: None,
        }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

// Default providers ---------------------------------------------------------

fn default_margin() -> f64 {
    2.0
}

fn default_min_lane_height() -> f64 {
    4.0
}

fn default_pan_step() -> f64 {
    5.0
}

fn default_zoom_in() -> f64 {
    1.25
}

fn default_zoom_out() -> f64 {
    0.75
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

// Tests ---------------------------------------------------------------------
