//! Generation run configuration.
//!
//! Stored as JSON so runs can be reproduced from a file:
//!
//! ```json
//! { "rows": 12, "cols": 16, "cell_size": 2.0, "seed": 7, "max_iterations": 0 }
//! ```
//!
//! Missing fields take their `Default` values.

use crate::level::LevelData;
use crate::wfc::WorldPos;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Errors that can occur while loading, saving or validating a config.
#[derive(Debug)]
pub enum ConfigError {
    /// File system error
    Io(std::io::Error),
    /// JSON (de)serialization error
    Json(String),
    /// Values that cannot drive a run
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "JSON error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e.to_string())
    }
}

/// Parameters of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub rows: usize,
    pub cols: usize,
    /// World-space edge length of one cell
    pub cell_size: f32,
    /// World-space position of the lower-left corner of cell (0, 0)
    pub origin: WorldPos,
    pub seed: u64,
    /// Step budget (0 = no limit)
    pub max_iterations: usize,
    /// Pause between steps for animated runs
    pub step_delay_ms: u64,
    /// Attempts a caller should make, with successive seeds, before giving up
    pub tries: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            rows: 10,
            cols: 10,
            cell_size: 1.0,
            origin: WorldPos::default(),
            seed: 0,
            max_iterations: 0,
            step_delay_ms: 0,
            tries: 10,
        }
    }
}

impl GenerationConfig {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            ..Default::default()
        }
    }

    /// Grid size and cell size taken from a loaded level.
    pub fn from_level(level: &LevelData) -> Self {
        Self {
            rows: level.rows,
            cols: level.cols,
            cell_size: level.cell_size,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_origin(mut self, origin: WorldPos) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_step_delay_ms(mut self, step_delay_ms: u64) -> Self {
        self.step_delay_ms = step_delay_ms;
        self
    }

    pub fn with_tries(mut self, tries: usize) -> Self {
        self.tries = tries;
        self
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must be at least 1x1, got {}x{}",
                self.rows, self.cols
            )));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "cell_size must be positive, got {}",
                self.cell_size
            )));
        }
        if self.tries == 0 {
            return Err(ConfigError::Invalid("tries must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Load and validate a config from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: GenerationConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_validate() {
        let config = GenerationConfig::new(4, 6)
            .with_seed(99)
            .with_max_iterations(3)
            .with_cell_size(2.5)
            .with_step_delay_ms(16);
        assert!(config.validate().is_ok());
        assert_eq!(config.cell_count(), 24);
        assert_eq!(config.step_delay(), Duration::from_millis(16));

        assert!(matches!(
            GenerationConfig::new(0, 3).validate(),
            Err(ConfigError::Invalid(_))
        ));
        assert!(GenerationConfig::new(3, 3).with_cell_size(-1.0).validate().is_err());
        assert!(GenerationConfig::new(3, 3).with_tries(0).validate().is_err());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: GenerationConfig = serde_json::from_str(r#"{ "rows": 3, "seed": 5 }"#).unwrap();
        assert_eq!(config.rows, 3);
        assert_eq!(config.cols, 10);
        assert_eq!(config.seed, 5);
        assert_eq!(config.max_iterations, 0);
    }

    #[test]
    fn test_save_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");

        let config = GenerationConfig::new(7, 9)
            .with_seed(1234)
            .with_origin(WorldPos::new(-3.0, 2.0));
        config.save(&path).unwrap();

        let loaded = GenerationConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "rows": 0 }"#).unwrap();
        assert!(matches!(
            GenerationConfig::load(&path),
            Err(ConfigError::Invalid(_))
        ));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(GenerationConfig::load(&path), Err(ConfigError::Json(_))));

        assert!(matches!(
            GenerationConfig::load(dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
