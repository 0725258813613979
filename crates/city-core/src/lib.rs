#![deny(warnings)]

//! Core domain models for the city economy simulation.
//!
//! This crate defines the building catalog and the serializable values shared
//! by the economic model and the runtime, with validation helpers for
//! externally supplied state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Starting treasury of a freshly founded city.
pub const DEFAULT_FUNDS: i64 = 1000;
/// Starting tax rate of a freshly founded city (10%).
pub const DEFAULT_TAX_RATE: f64 = 0.10;
/// Neutral value used for happiness and every satisfaction before the first recompute.
pub const NEUTRAL_SATISFACTION: f64 = 0.5;

/// Kinds of buildings a player can place on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingCategory {
    /// Housing; the only source of population capacity.
    Residential,
    /// Shops: a few jobs and modest income.
    Commercial,
    /// Factories: many jobs, high income, unpopular neighbours.
    Industrial,
    /// Parks and venues; drives leisure satisfaction.
    Leisure,
}

impl BuildingCategory {
    /// Every category, in declaration order.
    pub const ALL: [BuildingCategory; 4] = [
        BuildingCategory::Residential,
        BuildingCategory::Commercial,
        BuildingCategory::Industrial,
        BuildingCategory::Leisure,
    ];

    /// Catalog entry for this category.
    pub const fn properties(self) -> BuildingProperties {
        properties_of(self)
    }

    /// Human-readable name.
    pub const fn label(self) -> &'static str {
        match self {
            BuildingCategory::Residential => "Residential",
            BuildingCategory::Commercial => "Commercial",
            BuildingCategory::Industrial => "Industrial",
            BuildingCategory::Leisure => "Leisure",
        }
    }
}

impl fmt::Display for BuildingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BuildingCategory {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "residential" | "house" => Ok(BuildingCategory::Residential),
            "commercial" | "commerce" => Ok(BuildingCategory::Commercial),
            "industrial" | "industry" => Ok(BuildingCategory::Industrial),
            "leisure" => Ok(BuildingCategory::Leisure),
            _ => Err(CatalogError::InvalidCategory(s.to_string())),
        }
    }
}

/// Fixed economic properties of a building category.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildingProperties {
    /// Construction cost, deducted from funds on placement.
    pub cost: i64,
    /// Space occupied (informational).
    pub space: u32,
    /// Residents housed.
    pub capacity: u32,
    /// Satisfaction impact (informational, not used by the recompute).
    pub satisfaction_delta: f64,
    /// Jobs provided.
    pub jobs: u32,
    /// Income added to funds every recompute.
    pub income: i64,
}

/// Look up the catalog entry for a category.
pub const fn properties_of(category: BuildingCategory) -> BuildingProperties {
    match category {
        BuildingCategory::Residential => BuildingProperties {
            cost: 100,
            space: 1,
            capacity: 4,
            satisfaction_delta: 0.2,
            jobs: 0,
            income: 0,
        },
        BuildingCategory::Commercial => BuildingProperties {
            cost: 200,
            space: 2,
            capacity: 0,
            satisfaction_delta: 0.1,
            jobs: 5,
            income: 50,
        },
        BuildingCategory::Industrial => BuildingProperties {
            cost: 500,
            space: 4,
            capacity: 0,
            satisfaction_delta: -0.1,
            jobs: 20,
            income: 200,
        },
        BuildingCategory::Leisure => BuildingProperties {
            cost: 300,
            space: 3,
            capacity: 0,
            satisfaction_delta: 0.3,
            jobs: 8,
            income: 100,
        },
    }
}

/// A cell coordinate on the city grid. Signed so that callers can pass
/// off-grid positions and get a rejection instead of a wrap-around.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPos {
    /// Column, 0 at the left edge.
    pub x: i32,
    /// Row, 0 at the top edge.
    pub y: i32,
}

impl GridPos {
    /// Position at column `x`, row `y`.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether the position lies on a `width` x `height` grid.
    pub fn within(self, width: u32, height: u32) -> bool {
        self.x >= 0 && self.y >= 0 && (self.x as u32) < width && (self.y as u32) < height
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A building standing on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacedBuilding {
    /// Cell the building occupies.
    pub position: GridPos,
    /// What was built there.
    pub category: BuildingCategory,
}

impl PlacedBuilding {
    /// A building of `category` standing at `position`.
    pub const fn new(position: GridPos, category: BuildingCategory) -> Self {
        Self { position, category }
    }

    /// Catalog entry for this building's category.
    pub const fn properties(&self) -> BuildingProperties {
        properties_of(self.category)
    }
}

/// Aggregate statistics of a city, recomputed after every mutation and tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CityStatistics {
    /// Current residents.
    pub population: u32,
    /// Total residential capacity.
    pub max_population: u32,
    /// Residents holding a job.
    pub employed: u32,
    /// Feedback term for population growth, in [0.1, 1] once recomputed.
    pub happiness: f64,
    /// Treasury. May go negative.
    pub funds: i64,
    /// Tax rate in [0, 1].
    pub tax_rate: f64,
    /// 1 until occupancy passes the crowding threshold, then falls off.
    pub space_satisfaction: f64,
    /// Share of residents holding a job.
    pub job_satisfaction: f64,
    /// Leisure buildings relative to what the population wants.
    pub leisure_satisfaction: f64,
    /// Per-capita building income net of the tax burden.
    pub wealth_satisfaction: f64,
    /// Display-only average of the four satisfactions.
    pub mayor_rating: f64,
}

impl Default for CityStatistics {
    fn default() -> Self {
        Self {
            population: 0,
            max_population: 0,
            employed: 0,
            happiness: NEUTRAL_SATISFACTION,
            funds: DEFAULT_FUNDS,
            tax_rate: DEFAULT_TAX_RATE,
            space_satisfaction: NEUTRAL_SATISFACTION,
            job_satisfaction: NEUTRAL_SATISFACTION,
            leisure_satisfaction: NEUTRAL_SATISFACTION,
            wealth_satisfaction: NEUTRAL_SATISFACTION,
            mayor_rating: NEUTRAL_SATISFACTION,
        }
    }
}

/// Errors produced by catalog lookups at text boundaries.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// Text does not name a known building category.
    #[error("unknown building category: {0:?}")]
    InvalidCategory(String),
}

/// Validation errors for externally supplied statistics.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Numeric field must be finite.
    #[error("non-finite value in field {0}")]
    NonFinite(&'static str),
    /// Ratio field must lie within [0, 1].
    #[error("field {field} must be within [0,1], got {value}")]
    RatioOutOfRange { field: &'static str, value: f64 },
}

/// Validate a statistics record used to seed a city.
pub fn validate_statistics(stats: &CityStatistics) -> Result<(), ValidationError> {
    let ratios = [
        ("happiness", stats.happiness),
        ("tax_rate", stats.tax_rate),
        ("space_satisfaction", stats.space_satisfaction),
        ("job_satisfaction", stats.job_satisfaction),
        ("leisure_satisfaction", stats.leisure_satisfaction),
        ("wealth_satisfaction", stats.wealth_satisfaction),
        ("mayor_rating", stats.mayor_rating),
    ];
    for (field, value) in ratios {
        if !value.is_finite() {
            return Err(ValidationError::NonFinite(field));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::RatioOutOfRange { field, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn catalog_matches_table() {
        let r = properties_of(BuildingCategory::Residential);
        assert_eq!((r.cost, r.space, r.capacity, r.jobs, r.income), (100, 1, 4, 0, 0));
        assert_eq!(r.satisfaction_delta, 0.2);

        let c = properties_of(BuildingCategory::Commercial);
        assert_eq!((c.cost, c.space, c.capacity, c.jobs, c.income), (200, 2, 0, 5, 50));

        let i = properties_of(BuildingCategory::Industrial);
        assert_eq!((i.cost, i.space, i.capacity, i.jobs, i.income), (500, 4, 0, 20, 200));
        assert_eq!(i.satisfaction_delta, -0.1);

        let l = properties_of(BuildingCategory::Leisure);
        assert_eq!((l.cost, l.space, l.capacity, l.jobs, l.income), (300, 3, 0, 8, 100));
    }

    #[test]
    fn only_residential_houses_people() {
        for category in BuildingCategory::ALL {
            let housed = category.properties().capacity > 0;
            assert_eq!(housed, category == BuildingCategory::Residential);
        }
    }

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("residential".parse::<BuildingCategory>(), Ok(BuildingCategory::Residential));
        assert_eq!(" House ".parse::<BuildingCategory>(), Ok(BuildingCategory::Residential));
        assert_eq!("COMMERCE".parse::<BuildingCategory>(), Ok(BuildingCategory::Commercial));
        assert_eq!("industry".parse::<BuildingCategory>(), Ok(BuildingCategory::Industrial));
        assert_eq!("Leisure".parse::<BuildingCategory>(), Ok(BuildingCategory::Leisure));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = "airport".parse::<BuildingCategory>().unwrap_err();
        assert_eq!(err, CatalogError::InvalidCategory("airport".into()));
    }

    #[test]
    fn category_serializes_lowercase() {
        let s = serde_json::to_string(&BuildingCategory::Industrial).unwrap();
        assert_eq!(s, "\"industrial\"");
        let back: BuildingCategory = serde_json::from_str("\"leisure\"").unwrap();
        assert_eq!(back, BuildingCategory::Leisure);
    }

    #[test]
    fn default_statistics() {
        let s = CityStatistics::default();
        assert_eq!(s.funds, 1000);
        assert_eq!(s.tax_rate, 0.10);
        assert_eq!(s.population, 0);
        assert_eq!(s.happiness, 0.5);
        assert_eq!(s.mayor_rating, 0.5);
        validate_statistics(&s).unwrap();
    }

    #[test]
    fn statistics_snapshot_roundtrip() {
        let stats = CityStatistics {
            population: 12,
            funds: -40,
            ..CityStatistics::default()
        };
        let s = serde_json::to_string(&stats).unwrap();
        let back: CityStatistics = serde_json::from_str(&s).unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn grid_bounds() {
        assert!(GridPos::new(0, 0).within(20, 15));
        assert!(GridPos::new(19, 14).within(20, 15));
        assert!(!GridPos::new(20, 0).within(20, 15));
        assert!(!GridPos::new(0, 15).within(20, 15));
        assert!(!GridPos::new(-1, 3).within(20, 15));
        assert!(!GridPos::new(0, 0).within(0, 0));
    }

    #[test]
    fn nan_happiness_is_rejected() {
        let s = CityStatistics {
            happiness: f64::NAN,
            ..CityStatistics::default()
        };
        assert_eq!(validate_statistics(&s), Err(ValidationError::NonFinite("happiness")));
    }

    proptest! {
        #[test]
        fn ratios_in_unit_interval_validate(h in 0.0f64..=1.0, t in 0.0f64..=1.0, funds in -1_000_000i64..1_000_000) {
            let s = CityStatistics { happiness: h, tax_rate: t, funds, ..CityStatistics::default() };
            prop_assert!(validate_statistics(&s).is_ok());
        }

        #[test]
        fn tax_rate_above_one_is_rejected(t in 1.0001f64..100.0) {
            let s = CityStatistics { tax_rate: t, ..CityStatistics::default() };
            let rejected = matches!(validate_statistics(&s), Err(ValidationError::RatioOutOfRange { field: "tax_rate", .. }));
            prop_assert!(rejected);
        }
    }
}
