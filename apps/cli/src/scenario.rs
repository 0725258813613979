//! YAML scenario files: grid, starting economy, initial layout and run length.

use anyhow::{bail, Context, Result};
use city_core::{BuildingCategory, CityStatistics, DEFAULT_FUNDS, DEFAULT_TAX_RATE};
use city_econ::EconParams;
use city_runtime::{City, ConfigError, SimulationConfig, SimulationController, DEFAULT_HISTORY_LEN};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl Default for GridSize {
    fn default() -> Self {
        Self {
            width: City::DEFAULT_WIDTH,
            height: City::DEFAULT_HEIGHT,
        }
    }
}

/// One building to place before the run starts.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Placement {
    pub x: i32,
    pub y: i32,
    /// Category name; aliases such as "house" are accepted.
    pub category: String,
}

/// Seeded random placement attempts on top of the explicit layout.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RandomFill {
    pub count: usize,
    pub seed: u64,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    pub grid: GridSize,
    pub funds: Option<i64>,
    pub tax_rate: Option<f64>,
    pub ticks: u64,
    /// 0 runs ticks back to back.
    pub interval_ms: u64,
    pub history_len: usize,
    pub placements: Vec<Placement>,
    pub random_fill: Option<RandomFill>,
    pub econ: EconParams,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "sandbox".to_string(),
            grid: GridSize::default(),
            funds: None,
            tax_rate: None,
            ticks: 0,
            interval_ms: 0,
            history_len: DEFAULT_HISTORY_LEN,
            placements: Vec::new(),
            random_fill: None,
            econ: EconParams::default(),
        }
    }
}

/// Outcome of laying out the initial city.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutReport {
    pub placed: usize,
    pub rejected: usize,
}

impl Scenario {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn config(&self) -> SimulationConfig {
        SimulationConfig {
            width: self.grid.width,
            height: self.grid.height,
            tick_interval_ms: self.interval_ms,
            history_len: self.history_len,
            econ: self.econ.clone(),
        }
    }

    pub fn starting_statistics(&self) -> CityStatistics {
        CityStatistics {
            funds: self.funds.unwrap_or(DEFAULT_FUNDS),
            tax_rate: self.tax_rate.unwrap_or(DEFAULT_TAX_RATE),
            ..CityStatistics::default()
        }
    }

    /// A stopped controller around an empty city built from this scenario.
    pub fn controller(&self) -> Result<SimulationController, ConfigError> {
        SimulationController::from_config_seeded(&self.config(), self.starting_statistics())
    }

    /// Place the explicit layout, then the random fill. Unknown category
    /// names abort; refused placements are logged and counted.
    pub fn populate(&self, controller: &mut SimulationController) -> Result<LayoutReport> {
        let mut report = LayoutReport::default();
        for p in &self.placements {
            let category: BuildingCategory = p
                .category
                .parse()
                .with_context(|| format!("placement at ({}, {})", p.x, p.y))?;
            match controller.city_mut().try_place_building(p.x, p.y, category) {
                Ok(_) => report.placed += 1,
                Err(err) => {
                    warn!(%err, %category, "scenario placement refused");
                    report.rejected += 1;
                }
            }
        }

        if let Some(fill) = &self.random_fill {
            let mut rng = ChaCha8Rng::seed_from_u64(fill.seed);
            let city = controller.city();
            let width = i32::try_from(city.width()).context("grid width exceeds cell coordinates")?;
            let height =
                i32::try_from(city.height()).context("grid height exceeds cell coordinates")?;
            if width == 0 || height == 0 {
                bail!("random fill needs a non-empty grid, got {width}x{height}");
            }
            for _ in 0..fill.count {
                let x = rng.gen_range(0..width);
                let y = rng.gen_range(0..height);
                let category = BuildingCategory::ALL[rng.gen_range(0..BuildingCategory::ALL.len())];
                if controller.place_building(x, y, category) {
                    report.placed += 1;
                } else {
                    report.rejected += 1;
                }
            }
            debug!(seed = fill.seed, attempts = fill.count, "random fill done");
        }
        Ok(report)
    }
}
