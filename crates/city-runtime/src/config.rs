//! Runtime configuration: grid size, tick pacing, history window and
//! economic coefficients.

use crate::history::DEFAULT_HISTORY_LEN;
use crate::City;
use city_core::ValidationError;
use city_econ::{EconError, EconParams};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },
    #[error("grid {width}x{height} exceeds the addressable {max}x{max} cells")]
    GridTooLarge { width: u32, height: u32, max: u32 },
    #[error("history window must hold at least one sample")]
    EmptyHistory,
    #[error("invalid economic parameters: {0}")]
    Econ(#[from] EconError),
    #[error("invalid starting statistics: {0}")]
    Statistics(#[from] ValidationError),
}

/// Largest grid side; cells are addressed with signed `i32` coordinates.
pub const MAX_GRID_SIDE: u32 = i32::MAX as u32;

/// Settings for a simulation session. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub width: u32,
    pub height: u32,
    /// Milliseconds between ticks; raised to the controller minimum.
    pub tick_interval_ms: u64,
    pub history_len: usize,
    pub econ: EconParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: City::DEFAULT_WIDTH,
            height: City::DEFAULT_HEIGHT,
            tick_interval_ms: 1000,
            history_len: DEFAULT_HISTORY_LEN,
            econ: EconParams::default(),
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if self.width > MAX_GRID_SIDE || self.height > MAX_GRID_SIDE {
            return Err(ConfigError::GridTooLarge {
                width: self.width,
                height: self.height,
                max: MAX_GRID_SIDE,
            });
        }
        if self.history_len == 0 {
            return Err(ConfigError::EmptyHistory);
        }
        self.econ.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = SimulationConfig::default();
        assert_eq!((cfg.width, cfg.height), (20, 15));
        cfg.validate().unwrap();
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let cfg: SimulationConfig = serde_yaml::from_str(
            "width: 8\nhistory_len: 10\necon:\n  growth_step: 2\n",
        )
        .unwrap();
        assert_eq!(cfg.width, 8);
        assert_eq!(cfg.height, 15);
        assert_eq!(cfg.history_len, 10);
        assert_eq!(cfg.econ.growth_step, 2);
        assert_eq!(cfg.econ.decline_step, 10);
        cfg.validate().unwrap();
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res: Result<SimulationConfig, _> = serde_yaml::from_str("widht: 8\n");
        assert!(res.is_err());
    }

    #[test]
    fn rejects_degenerate_values() {
        let cfg = SimulationConfig {
            height: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyGrid { width: 20, height: 0 }));

        let cfg = SimulationConfig {
            history_len: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::EmptyHistory));

        let cfg = SimulationConfig {
            width: MAX_GRID_SIDE + 1,
            ..SimulationConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::GridTooLarge {
                width: MAX_GRID_SIDE + 1,
                height: 15,
                max: MAX_GRID_SIDE,
            })
        );
        let cfg = SimulationConfig {
            width: MAX_GRID_SIDE,
            height: MAX_GRID_SIDE,
            ..SimulationConfig::default()
        };
        cfg.validate().unwrap();

        let mut cfg = SimulationConfig::default();
        cfg.econ.residents_per_leisure = 0.0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::Econ(EconError::ZeroDivisor("residents_per_leisure")))
        );
    }
}
