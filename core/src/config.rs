use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::PuzzleError;
use crate::game::{
    OrientationMode, PUZZLE_SEED, ROTATION_DURATION_MS_DEFAULT, SNAP_TOLERANCE_RATIO_DEFAULT,
    SNAP_TOLERANCE_RATIO_MAX, SNAP_TOLERANCE_RATIO_MIN,
};

/// Puzzle session settings, usually read from a TOML file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PuzzleConfig {
    /// Source image width in board units.
    pub width: f64,
    pub height: f64,
    pub rows: u32,
    pub cols: u32,
    pub orientation: OrientationMode,
    pub seed: u32,
    /// Fraction of the smaller cell side.
    pub snap_tolerance_ratio: f64,
    pub rotation_duration_ms: f64,
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            rows: 6,
            cols: 9,
            orientation: OrientationMode::Fixed,
            seed: PUZZLE_SEED,
            snap_tolerance_ratio: SNAP_TOLERANCE_RATIO_DEFAULT,
            rotation_duration_ms: ROTATION_DURATION_MS_DEFAULT,
        }
    }
}

impl PuzzleConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: PuzzleConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("loaded puzzle config from {}", path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), PuzzleError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(PuzzleError::InvalidGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
        {
            return Err(PuzzleError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        validate_snap_ratio(self.snap_tolerance_ratio)?;
        validate_duration(self.rotation_duration_ms)?;
        Ok(())
    }
}

pub(crate) fn validate_snap_ratio(ratio: f64) -> Result<(), PuzzleError> {
    if !(SNAP_TOLERANCE_RATIO_MIN..=SNAP_TOLERANCE_RATIO_MAX).contains(&ratio) {
        return Err(PuzzleError::InvalidSnapTolerance { ratio });
    }
    Ok(())
}

pub(crate) fn validate_duration(ms: f64) -> Result<(), PuzzleError> {
    if !ms.is_finite() || ms < 0.0 {
        return Err(PuzzleError::InvalidDuration { ms });
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] PuzzleError),
}
