//! Game configuration.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;
use tracing::info;

use crate::SessionError;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub palette: PaletteConfig,
    #[serde(default)]
    pub guest: GuestConfig,
}

impl Config {
    /// Load configuration from `culture.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("culture.toml"))
    }

    /// Load configuration from `path`, writing the defaults there if it is
    /// missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            config.palette.validate()?;
            Ok(config)
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }
}

/// Host networking settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    14650
}

/// Board dimensions the host may choose from.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoardConfig {
    #[serde(default = "default_board_size")]
    pub default_size: usize,
    #[serde(default = "default_min_size")]
    pub min_size: usize,
    #[serde(default = "default_max_size")]
    pub max_size: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            default_size: default_board_size(),
            min_size: default_min_size(),
            max_size: default_max_size(),
        }
    }
}

impl BoardConfig {
    /// Pick the requested size or the default, checking it against the limits.
    pub fn resolve(&self, requested: Option<usize>) -> Result<usize, SessionError> {
        let size = requested.unwrap_or(self.default_size);
        if size < self.min_size || size > self.max_size.min(protocol::MAX_BOARD_SIZE) {
            return Err(SessionError::InvalidBoardSize {
                size,
                min: self.min_size,
                max: self.max_size,
            });
        }
        Ok(size)
    }
}

fn default_board_size() -> usize {
    8
}
fn default_min_size() -> usize {
    2
}
fn default_max_size() -> usize {
    64
}

/// Custom colors synthesised once the presets run out.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaletteConfig {
    /// Lowest channel value (inclusive).
    #[serde(default = "default_custom_min")]
    pub custom_min: u8,
    /// Highest channel value (exclusive).
    #[serde(default = "default_custom_max")]
    pub custom_max: u8,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            custom_min: default_custom_min(),
            custom_max: default_custom_max(),
        }
    }
}

impl PaletteConfig {
    pub fn channel_range(&self) -> Range<u8> {
        self.custom_min..self.custom_max
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.custom_min < self.custom_max,
            "palette.custom_min ({}) must be below palette.custom_max ({})",
            self.custom_min,
            self.custom_max
        );
        Ok(())
    }
}

fn default_custom_min() -> u8 {
    150
}
fn default_custom_max() -> u8 {
    200
}

/// Settings used when joining someone else's game.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GuestConfig {
    /// Message shown to the host with the join request.
    #[serde(default)]
    pub join_message: Option<String>,
}
