//! The city aggregate: a sparse building grid plus one statistics record.

use crate::events::{CityEvent, EventBus, ListenerId};
use city_core::{BuildingCategory, CityStatistics, GridPos, PlacedBuilding};
use city_econ::{clamp_ratio, clamp_tax_rate, recompute, BuildingTotals, EconParams};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, trace};

/// Why a placement or removal was refused. The city is left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlacementError {
    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },
    #[error("cell ({x}, {y}) is already occupied")]
    Occupied { x: i32, y: i32 },
    #[error("cell ({x}, {y}) is empty")]
    Vacant { x: i32, y: i32 },
    #[error("insufficient funds: cost {cost}, available {funds}")]
    InsufficientFunds { cost: i64, funds: i64 },
}

/// Serializable view of a city at one instant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CitySnapshot {
    pub width: u32,
    pub height: u32,
    /// Ordered by position.
    pub buildings: Vec<PlacedBuilding>,
    pub statistics: CityStatistics,
}

/// A city: fixed-size grid, placed buildings, statistics and observers.
#[derive(Debug)]
pub struct City {
    width: u32,
    height: u32,
    buildings: BTreeMap<GridPos, PlacedBuilding>,
    stats: CityStatistics,
    params: EconParams,
    events: EventBus<CityEvent>,
}

impl Default for City {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT)
    }
}

impl City {
    pub const DEFAULT_WIDTH: u32 = 20;
    pub const DEFAULT_HEIGHT: u32 = 15;

    /// An empty city with default statistics.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_statistics(width, height, CityStatistics::default())
    }

    /// An empty city seeded with `stats`. The tax rate and happiness are
    /// clamped into [0, 1] so growth never targets more than the capacity.
    pub fn with_statistics(width: u32, height: u32, mut stats: CityStatistics) -> Self {
        stats.tax_rate = clamp_tax_rate(stats.tax_rate);
        stats.happiness = clamp_ratio(stats.happiness);
        Self {
            width,
            height,
            buildings: BTreeMap::new(),
            stats,
            params: EconParams::default(),
            events: EventBus::new(),
        }
    }

    /// Replace the economic coefficients used by every later recompute.
    pub fn with_params(mut self, params: EconParams) -> Self {
        self.params = params;
        self
    }

    /// Grid columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Record produced by the latest recompute.
    pub fn statistics(&self) -> &CityStatistics {
        &self.stats
    }

    /// Economic coefficients used by every recompute.
    pub fn params(&self) -> &EconParams {
        &self.params
    }

    /// Building at a cell; `None` when empty or off-grid.
    pub fn building_at(&self, x: i32, y: i32) -> Option<&PlacedBuilding> {
        self.buildings.get(&GridPos::new(x, y))
    }

    /// Placed buildings ordered by position.
    pub fn buildings(&self) -> impl Iterator<Item = &PlacedBuilding> + '_ {
        self.buildings.values()
    }

    /// Number of occupied cells.
    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    /// Place a building, reporting why it was refused.
    ///
    /// Checks run in order: bounds, occupancy, funds. On success the cost is
    /// deducted, statistics are recomputed (emitting `StatisticsUpdated`), and
    /// `BuildingAdded` is emitted.
    pub fn try_place_building(
        &mut self,
        x: i32,
        y: i32,
        category: BuildingCategory,
    ) -> Result<PlacedBuilding, PlacementError> {
        let pos = GridPos::new(x, y);
        if !pos.within(self.width, self.height) {
            return Err(PlacementError::OutOfBounds { x, y });
        }
        if self.buildings.contains_key(&pos) {
            return Err(PlacementError::Occupied { x, y });
        }
        let cost = category.properties().cost;
        if self.stats.funds < cost {
            return Err(PlacementError::InsufficientFunds {
                cost,
                funds: self.stats.funds,
            });
        }

        let building = PlacedBuilding::new(pos, category);
        self.buildings.insert(pos, building);
        self.stats.funds -= cost;
        debug!(%pos, %category, cost, funds = self.stats.funds, "building placed");

        self.refresh_statistics();
        self.events.emit(&CityEvent::BuildingAdded(building));
        Ok(building)
    }

    /// Place a building; `false` when any precondition fails.
    pub fn place_building(&mut self, x: i32, y: i32, category: BuildingCategory) -> bool {
        match self.try_place_building(x, y, category) {
            Ok(_) => true,
            Err(err) => {
                debug!(%err, "placement rejected");
                false
            }
        }
    }

    /// Demolish the building at a cell. No refund.
    pub fn try_remove_building(&mut self, x: i32, y: i32) -> Result<PlacedBuilding, PlacementError> {
        let pos = GridPos::new(x, y);
        if !pos.within(self.width, self.height) {
            return Err(PlacementError::OutOfBounds { x, y });
        }
        let building = self
            .buildings
            .remove(&pos)
            .ok_or(PlacementError::Vacant { x, y })?;
        debug!(%pos, category = %building.category, "building removed");

        self.refresh_statistics();
        self.events.emit(&CityEvent::BuildingRemoved(pos));
        Ok(building)
    }

    /// Demolish the building at a cell; `false` when out of bounds or empty.
    pub fn remove_building(&mut self, x: i32, y: i32) -> bool {
        match self.try_remove_building(x, y) {
            Ok(_) => true,
            Err(err) => {
                debug!(%err, "removal rejected");
                false
            }
        }
    }

    /// Store a clamped tax rate and recompute.
    pub fn set_tax_rate(&mut self, rate: f64) {
        self.stats.tax_rate = clamp_tax_rate(rate);
        debug!(requested = rate, stored = self.stats.tax_rate, "tax rate set");
        self.refresh_statistics();
    }

    /// Advance one simulated time step.
    pub fn tick(&mut self) {
        self.refresh_statistics();
    }

    /// Register an observer; it runs before every mutator returns.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&CityEvent) + 'static,
    {
        self.events.subscribe(listener)
    }

    /// Remove an observer; `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Copy of the grid and statistics.
    pub fn snapshot(&self) -> CitySnapshot {
        CitySnapshot {
            width: self.width,
            height: self.height,
            buildings: self.buildings.values().copied().collect(),
            statistics: self.stats.clone(),
        }
    }

    /// Detach the observers so they can follow a replacement city.
    pub(crate) fn take_events(&mut self) -> EventBus<CityEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn install_events(&mut self, events: EventBus<CityEvent>) {
        self.events = events;
    }

    fn refresh_statistics(&mut self) {
        let totals = BuildingTotals::tally(self.buildings.values());
        self.stats = recompute(&self.stats, &totals, &self.params);
        let s = &self.stats;
        trace!(
            population = s.population,
            max_population = s.max_population,
            employed = s.employed,
            funds = s.funds,
            happiness = s.happiness,
            mayor_rating = s.mayor_rating,
            "statistics recomputed"
        );
        self.events.emit(&CityEvent::StatisticsUpdated(self.stats.clone()));
    }
}
