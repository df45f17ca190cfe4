//! Configuration file support for the dose log.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/doses/config.toml`.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub units: UnitsConfig,
}

/// Where the log lives
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Remote JSON file served over fs-over-http; takes precedence over `data_dir`
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Token attached to remote writes
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            data_dir: default_data_dir(),
            token: None,
        }
    }
}

/// Defaults applied when displaying or adding doses
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_route")]
    pub default_route: String,

    /// Number of doses shown by non-statistics commands when `-n` is not given
    #[serde(default = "default_show")]
    pub show: i64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_route: default_route(),
            show: default_show(),
        }
    }
}

/// Substance-specific conversion constants
///
/// Densities are milligrams per millilitre; one Alcohol unit is expressed as
/// millilitres of pure ethanol.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UnitsConfig {
    #[serde(default = "default_ethanol_density")]
    pub ethanol_mg_per_ml: f64,

    #[serde(default = "default_ghb_density")]
    pub ghb_mg_per_ml: f64,

    #[serde(default = "default_gbl_density")]
    pub gbl_mg_per_ml: f64,

    #[serde(default = "default_bdo_density")]
    pub bdo_mg_per_ml: f64,

    #[serde(default = "default_alcohol_unit_ml")]
    pub alcohol_unit_ml: f64,
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            ethanol_mg_per_ml: default_ethanol_density(),
            ghb_mg_per_ml: default_ghb_density(),
            gbl_mg_per_ml: default_gbl_density(),
            bdo_mg_per_ml: default_bdo_density(),
            alcohol_unit_ml: default_alcohol_unit_ml(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("doses")
}

fn default_route() -> String {
    "Oral".into()
}

fn default_show() -> i64 {
    5
}

// at 20°C
fn default_ethanol_density() -> f64 {
    789.45
}

// at 25°C
fn default_ghb_density() -> f64 {
    1120.0
}

// at 20°C
fn default_gbl_density() -> f64 {
    1129.6
}

// at 25°C
fn default_bdo_density() -> f64 {
    1017.3
}

fn default_alcohol_unit_ml() -> f64 {
    0.1
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("doses").join("config.toml")
    }
}
