#![deny(warnings)]

//! Economic model: the per-tick statistics recompute for a city.
//!
//! This crate provides:
//! - Tunable economic constants (`EconParams`) with validation
//! - Aggregation of the placed buildings into totals
//! - The deterministic recompute of `CityStatistics` from the previous record
//!
//! Population and funds are path-dependent; every satisfaction is rebuilt from
//! scratch on each call.

use city_core::{BuildingCategory, CityStatistics, PlacedBuilding};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced when validating economic parameters.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Parameter must be a finite number.
    #[error("parameter {0} is not finite")]
    NonFinite(&'static str),
    /// Parameter must be non-negative.
    #[error("parameter {0} must be >= 0, got {1}")]
    Negative(&'static str, f64),
    /// Divisor must be strictly positive.
    #[error("divisor {0} must be > 0")]
    ZeroDivisor(&'static str),
    /// Happiness floor must not exceed 1.
    #[error("happiness floor {0} exceeds 1")]
    FloorAboveOne(f64),
}

/// Weights of each satisfaction in the happiness feedback term.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HappinessWeights {
    pub space: f64,
    pub job: f64,
    pub leisure: f64,
    pub wealth: f64,
}

impl Default for HappinessWeights {
    fn default() -> Self {
        Self {
            space: 0.3,
            job: 0.3,
            leisure: 0.2,
            wealth: 0.2,
        }
    }
}

/// Constants of the recompute. The defaults are the shipped balance; the
/// formula shapes never change, only these coefficients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EconParams {
    /// Maximum residents gained per tick.
    pub growth_step: u32,
    /// Maximum residents lost per tick.
    pub decline_step: u32,
    /// Tax collected per resident at a 100% rate.
    pub tax_yield: f64,
    /// Occupancy ratio above which crowding hurts space satisfaction.
    pub crowding_threshold: f64,
    /// Residents served by one leisure building.
    pub residents_per_leisure: f64,
    /// Per-capita income that adds a full point of wealth satisfaction.
    pub wealth_divisor: f64,
    /// Wealth satisfaction lost per unit of tax rate.
    pub wealth_tax_penalty: f64,
    /// Wealth satisfaction with no income and no tax.
    pub wealth_baseline: f64,
    /// Happiness lost per unit of tax rate.
    pub happiness_tax_penalty: f64,
    /// Lower bound of happiness.
    pub happiness_floor: f64,
    pub happiness_weights: HappinessWeights,
}

impl Default for EconParams {
    fn default() -> Self {
        Self {
            growth_step: 5,
            decline_step: 10,
            tax_yield: 10.0,
            crowding_threshold: 0.5,
            residents_per_leisure: 20.0,
            wealth_divisor: 50.0,
            wealth_tax_penalty: 2.0,
            wealth_baseline: 0.5,
            happiness_tax_penalty: 0.5,
            happiness_floor: 0.1,
            happiness_weights: HappinessWeights::default(),
        }
    }
}

impl EconParams {
    /// Reject coefficients that would make the recompute meaningless.
    pub fn validate(&self) -> Result<(), EconError> {
        let w = &self.happiness_weights;
        let fields = [
            ("tax_yield", self.tax_yield),
            ("crowding_threshold", self.crowding_threshold),
            ("residents_per_leisure", self.residents_per_leisure),
            ("wealth_divisor", self.wealth_divisor),
            ("wealth_tax_penalty", self.wealth_tax_penalty),
            ("wealth_baseline", self.wealth_baseline),
            ("happiness_tax_penalty", self.happiness_tax_penalty),
            ("happiness_floor", self.happiness_floor),
            ("happiness_weights.space", w.space),
            ("happiness_weights.job", w.job),
            ("happiness_weights.leisure", w.leisure),
            ("happiness_weights.wealth", w.wealth),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(EconError::NonFinite(name));
            }
            if value < 0.0 {
                return Err(EconError::Negative(name, value));
            }
        }
        if self.residents_per_leisure == 0.0 {
            return Err(EconError::ZeroDivisor("residents_per_leisure"));
        }
        if self.wealth_divisor == 0.0 {
            return Err(EconError::ZeroDivisor("wealth_divisor"));
        }
        if self.happiness_floor > 1.0 {
            return Err(EconError::FloorAboveOne(self.happiness_floor));
        }
        Ok(())
    }
}

/// Sums over the placed buildings that the recompute needs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildingTotals {
    pub capacity: u64,
    pub jobs: u64,
    pub income: i64,
    pub leisure_count: u64,
}

impl BuildingTotals {
    /// Aggregate catalog properties over a set of buildings.
    pub fn tally<'a, I>(buildings: I) -> Self
    where
        I: IntoIterator<Item = &'a PlacedBuilding>,
    {
        let mut totals = Self::default();
        for b in buildings {
            let p = b.properties();
            totals.capacity += u64::from(p.capacity);
            totals.jobs += u64::from(p.jobs);
            totals.income = totals.income.saturating_add(p.income);
            if b.category == BuildingCategory::Leisure {
                totals.leisure_count += 1;
            }
        }
        totals
    }
}

/// The four satisfaction components of a recompute.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Satisfactions {
    pub space: f64,
    pub job: f64,
    pub leisure: f64,
    pub wealth: f64,
}

impl Satisfactions {
    /// Unweighted mean, reported as the mayor rating.
    pub fn mean(&self) -> f64 {
        (self.space + self.job + self.leisure + self.wealth) / 4.0
    }
}

/// Clamp a ratio into [0, 1]. NaN maps to 0.
pub fn clamp_ratio(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Clamp a requested tax rate into [0, 1]. NaN maps to 0.
pub fn clamp_tax_rate(rate: f64) -> f64 {
    clamp_ratio(rate)
}

/// Population the city is drawn towards: floor(capacity * happiness).
///
/// ```
/// assert_eq!(city_econ::target_population(4, 0.5), 2);
/// ```
pub fn target_population(max_population: u32, happiness: f64) -> u32 {
    // `as` saturates: negatives and NaN become 0.
    (f64::from(max_population) * happiness).floor() as u32
}

/// Move `current` towards `target`, growing by at most `growth_step` and
/// shrinking by at most `decline_step`.
pub fn step_population(current: u32, target: u32, params: &EconParams) -> u32 {
    if target > current {
        target.min(current.saturating_add(params.growth_step))
    } else {
        target.max(current.saturating_sub(params.decline_step))
    }
}

/// Tax collected in one recompute: floor(population * rate * tax_yield).
pub fn tax_income(population: u32, tax_rate: f64, params: &EconParams) -> i64 {
    (f64::from(population) * tax_rate * params.tax_yield).floor() as i64
}

/// Rebuild every satisfaction component. Zero population or capacity yields
/// the documented neutral values instead of dividing by zero.
pub fn satisfactions(
    population: u32,
    max_population: u32,
    employed: u32,
    totals: &BuildingTotals,
    tax_rate: f64,
    params: &EconParams,
) -> Satisfactions {
    let pop = f64::from(population);

    let space = if max_population > 0 {
        let ratio = pop / f64::from(max_population);
        1.0 - (ratio - params.crowding_threshold).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let job = if population > 0 {
        f64::from(employed) / pop
    } else {
        0.5
    };

    let leisure = if population > 0 {
        let wanted = pop / params.residents_per_leisure + 1.0;
        (totals.leisure_count as f64 / wanted).min(1.0)
    } else {
        0.5
    };

    let per_capita = totals.income as f64 / (pop + 1.0);
    let wealth = (per_capita / params.wealth_divisor - tax_rate * params.wealth_tax_penalty
        + params.wealth_baseline)
        .clamp(0.0, 1.0);

    Satisfactions {
        space,
        job,
        leisure,
        wealth,
    }
}

/// Happiness feedback term, weighted differently from the mayor rating.
pub fn happiness(s: &Satisfactions, tax_rate: f64, params: &EconParams) -> f64 {
    let w = &params.happiness_weights;
    let raw = (s.space * w.space + s.job * w.job + s.leisure * w.leisure + s.wealth * w.wealth)
        - tax_rate * params.happiness_tax_penalty;
    raw.max(params.happiness_floor).min(1.0)
}

/// Compute the next statistics record from the previous one and the current
/// building totals.
pub fn recompute(
    prev: &CityStatistics,
    totals: &BuildingTotals,
    params: &EconParams,
) -> CityStatistics {
    let max_population = u32::try_from(totals.capacity).unwrap_or(u32::MAX);
    let target = target_population(max_population, prev.happiness);
    let population = step_population(prev.population, target, params);

    let total_jobs = u32::try_from(totals.jobs).unwrap_or(u32::MAX);
    let employed = population.min(total_jobs);

    let tax_rate = prev.tax_rate;
    let funds = prev
        .funds
        .saturating_add(totals.income)
        .saturating_add(tax_income(population, tax_rate, params));

    let s = satisfactions(population, max_population, employed, totals, tax_rate, params);

    CityStatistics {
        population,
        max_population,
        employed,
        happiness: happiness(&s, tax_rate, params),
        funds,
        tax_rate,
        space_satisfaction: s.space,
        job_satisfaction: s.job,
        leisure_satisfaction: s.leisure,
        wealth_satisfaction: s.wealth,
        mayor_rating: s.mean(),
    }
}

/// Convenience wrapper: tally `buildings` and recompute.
pub fn recompute_from<'a, I>(prev: &CityStatistics, buildings: I, params: &EconParams) -> CityStatistics
where
    I: IntoIterator<Item = &'a PlacedBuilding>,
{
    recompute(prev, &BuildingTotals::tally(buildings), params)
}
