//! Session controller: owns the current city and the tick source state.
//!
//! The controller never sleeps or spawns; a driver asks for the interval via
//! [`SimulationController::tick_interval`] and calls
//! [`SimulationController::advance`] whenever it elapses.

use crate::config::{ConfigError, SimulationConfig};
use crate::events::{ControlEvent, EventBus, ListenerId};
use crate::City;
use city_core::{validate_statistics, BuildingCategory, CityStatistics};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Shortest accepted interval between ticks.
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(100);
/// Interval used until the driver picks another speed.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Named simulation speeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedPreset {
    Slow,
    Normal,
    Fast,
    VeryFast,
}

impl SpeedPreset {
    pub const ALL: [SpeedPreset; 4] = [
        SpeedPreset::Slow,
        SpeedPreset::Normal,
        SpeedPreset::Fast,
        SpeedPreset::VeryFast,
    ];

    /// Tick interval of this preset.
    pub const fn interval(self) -> Duration {
        match self {
            SpeedPreset::Slow => Duration::from_millis(2000),
            SpeedPreset::Normal => Duration::from_millis(1000),
            SpeedPreset::Fast => Duration::from_millis(500),
            SpeedPreset::VeryFast => Duration::from_millis(200),
        }
    }

    /// Human-readable name.
    pub const fn label(self) -> &'static str {
        match self {
            SpeedPreset::Slow => "Slow",
            SpeedPreset::Normal => "Normal",
            SpeedPreset::Fast => "Fast",
            SpeedPreset::VeryFast => "Very fast",
        }
    }

    /// Nearest preset for an arbitrary interval.
    pub fn classify(interval: Duration) -> Self {
        match interval.as_millis() {
            ms if ms > 1500 => SpeedPreset::Slow,
            ms if ms > 750 => SpeedPreset::Normal,
            ms if ms > 350 => SpeedPreset::Fast,
            _ => SpeedPreset::VeryFast,
        }
    }
}

/// Owns the city for one session and decides whether ticks run.
#[derive(Debug)]
pub struct SimulationController {
    city: City,
    running: bool,
    tick_interval: Duration,
    ticks: u64,
    events: EventBus<ControlEvent>,
}

impl Default for SimulationController {
    fn default() -> Self {
        Self::new(City::default())
    }
}

impl SimulationController {
    /// A stopped controller around `city`.
    pub fn new(city: City) -> Self {
        Self {
            city,
            running: false,
            tick_interval: DEFAULT_TICK_INTERVAL,
            ticks: 0,
            events: EventBus::new(),
        }
    }

    /// Build a fresh city and controller from validated settings.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, ConfigError> {
        Self::from_config_seeded(config, CityStatistics::default())
    }

    /// Like [`Self::from_config`], starting the city from `stats` instead of
    /// the default record. The interval is clamped like any other.
    pub fn from_config_seeded(
        config: &SimulationConfig,
        stats: CityStatistics,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        validate_statistics(&stats)?;
        let city = City::with_statistics(config.width, config.height, stats)
            .with_params(config.econ.clone());
        let mut controller = Self::new(city);
        controller.set_tick_interval(Duration::from_millis(config.tick_interval_ms));
        Ok(controller)
    }

    /// The city currently simulated.
    pub fn city(&self) -> &City {
        &self.city
    }

    /// Direct access, e.g. to subscribe to city events.
    pub fn city_mut(&mut self) -> &mut City {
        &mut self.city
    }

    /// Whether `advance` ticks the city.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ticks advanced on the current city.
    pub fn ticks_elapsed(&self) -> u64 {
        self.ticks
    }

    /// Interval the driver should wait between ticks.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Set the tick interval, raised to [`MIN_TICK_INTERVAL`]. Returns the
    /// stored value.
    pub fn set_tick_interval(&mut self, interval: Duration) -> Duration {
        self.tick_interval = interval.max(MIN_TICK_INTERVAL);
        info!(
            interval_ms = self.tick_interval.as_millis() as u64,
            speed = self.speed().label(),
            "tick interval set"
        );
        self.tick_interval
    }

    /// Switch to a preset interval.
    pub fn set_speed(&mut self, preset: SpeedPreset) {
        self.set_tick_interval(preset.interval());
    }

    /// Preset closest to the current interval.
    pub fn speed(&self) -> SpeedPreset {
        SpeedPreset::classify(self.tick_interval)
    }

    /// Resume ticking; emits `SimulationStarted` if it was stopped.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        info!("simulation started");
        self.events.emit(&ControlEvent::SimulationStarted);
    }

    /// Pause ticking; emits `SimulationStopped` if it was running.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        info!(ticks = self.ticks, "simulation stopped");
        self.events.emit(&ControlEvent::SimulationStopped);
    }

    /// Flip between running and stopped.
    pub fn toggle(&mut self) {
        if self.running {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Called by the driver each time the interval elapses. Ticks the city
    /// only while running; returns whether a tick ran.
    pub fn advance(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.city.tick();
        self.ticks += 1;
        true
    }

    /// Forwarded to [`City::place_building`].
    pub fn place_building(&mut self, x: i32, y: i32, category: BuildingCategory) -> bool {
        self.city.place_building(x, y, category)
    }

    /// Forwarded to [`City::remove_building`].
    pub fn remove_building(&mut self, x: i32, y: i32) -> bool {
        self.city.remove_building(x, y)
    }

    /// Forwarded to [`City::set_tax_rate`].
    pub fn set_tax_rate(&mut self, rate: f64) {
        self.city.set_tax_rate(rate);
    }

    /// Discard the current city and start over on an empty grid.
    ///
    /// The simulation is stopped, the city replaced wholesale (economic
    /// coefficients and city observers carry over, buildings and statistics
    /// do not), then restarted.
    pub fn create_new_city(&mut self, width: u32, height: u32) {
        self.stop();
        let listeners = self.city.take_events();
        let mut fresh = City::new(width, height).with_params(self.city.params().clone());
        fresh.install_events(listeners);
        self.city = fresh;
        self.ticks = 0;
        info!(width, height, "new city created");
        self.events.emit(&ControlEvent::CityReplaced { width, height });
        self.start();
    }

    /// Register an observer of controller transitions.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&ControlEvent) + 'static,
    {
        self.events.subscribe(listener)
    }

    /// Remove a controller observer; `false` if unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CityEvent;
    use crate::StatsHistory;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn control_log(c: &mut SimulationController) -> Rc<RefCell<Vec<ControlEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        c.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        log
    }

    #[test]
    fn starts_stopped_at_normal_speed() {
        let c = SimulationController::default();
        assert!(!c.is_running());
        assert_eq!(c.tick_interval(), Duration::from_millis(1000));
        assert_eq!(c.speed(), SpeedPreset::Normal);
    }

    #[test]
    fn interval_has_a_floor() {
        let mut c = SimulationController::default();
        assert_eq!(c.set_tick_interval(Duration::from_millis(20)), MIN_TICK_INTERVAL);
        assert_eq!(c.set_tick_interval(Duration::from_millis(250)), Duration::from_millis(250));
        c.set_speed(SpeedPreset::Slow);
        assert_eq!(c.tick_interval(), Duration::from_millis(2000));
    }

    #[test]
    fn presets_classify_to_themselves() {
        for p in SpeedPreset::ALL {
            assert_eq!(SpeedPreset::classify(p.interval()), p);
        }
        assert_eq!(SpeedPreset::classify(Duration::from_millis(1501)), SpeedPreset::Slow);
        assert_eq!(SpeedPreset::classify(Duration::from_millis(1500)), SpeedPreset::Normal);
        assert_eq!(SpeedPreset::classify(Duration::from_millis(751)), SpeedPreset::Normal);
        assert_eq!(SpeedPreset::classify(Duration::from_millis(350)), SpeedPreset::VeryFast);
    }

    #[test]
    fn start_stop_emit_only_on_transition() {
        let mut c = SimulationController::default();
        let log = control_log(&mut c);
        c.start();
        c.start();
        c.stop();
        c.stop();
        c.toggle();
        assert_eq!(
            *log.borrow(),
            vec![
                ControlEvent::SimulationStarted,
                ControlEvent::SimulationStopped,
                ControlEvent::SimulationStarted,
            ]
        );
        assert!(c.is_running());
    }

    #[test]
    fn advance_only_ticks_while_running() {
        let mut c = SimulationController::default();
        assert!(c.place_building(0, 0, BuildingCategory::Industrial));
        let funds = c.city().statistics().funds;
        assert!(!c.advance());
        assert_eq!(c.city().statistics().funds, funds);
        assert_eq!(c.ticks_elapsed(), 0);

        c.start();
        assert!(c.advance());
        assert!(c.advance());
        assert_eq!(c.ticks_elapsed(), 2);
        assert_eq!(c.city().statistics().funds, funds + 400);
    }

    #[test]
    fn forwards_mutators() {
        let mut c = SimulationController::default();
        assert!(c.place_building(1, 1, BuildingCategory::Residential));
        assert!(!c.place_building(1, 1, BuildingCategory::Residential));
        c.set_tax_rate(2.0);
        assert_eq!(c.city().statistics().tax_rate, 1.0);
        assert!(c.remove_building(1, 1));
        assert_eq!(c.city().building_count(), 0);
    }

    #[test]
    fn new_city_discards_everything_but_observers() {
        let mut c = SimulationController::default();
        c.start();
        assert!(c.place_building(3, 3, BuildingCategory::Residential));
        c.advance();

        let history = Rc::new(RefCell::new(StatsHistory::new(5)));
        let sink = Rc::clone(&history);
        c.city_mut().subscribe(move |e| {
            if let CityEvent::StatisticsUpdated(s) = e {
                sink.borrow_mut().record(s);
            }
        });
        let log = control_log(&mut c);

        c.create_new_city(10, 8);
        assert_eq!((c.city().width(), c.city().height()), (10, 8));
        assert_eq!(c.city().building_count(), 0);
        assert_eq!(c.city().statistics(), &CityStatistics::default());
        assert_eq!(c.ticks_elapsed(), 0);
        assert!(c.is_running());
        assert_eq!(
            *log.borrow(),
            vec![
                ControlEvent::SimulationStopped,
                ControlEvent::CityReplaced { width: 10, height: 8 },
                ControlEvent::SimulationStarted,
            ]
        );

        // The subscription follows the new city.
        assert!(c.advance());
        assert_eq!(history.borrow().latest_population(), Some(0));
        assert_eq!(history.borrow().latest_mayor_rating_pct(), Some(c.city().statistics().mayor_rating * 100.0));
    }

    #[test]
    fn from_config_applies_settings() {
        let mut cfg = SimulationConfig {
            width: 6,
            height: 4,
            tick_interval_ms: 50,
            ..SimulationConfig::default()
        };
        cfg.econ.growth_step = 2;
        let c = SimulationController::from_config(&cfg).unwrap();
        assert_eq!((c.city().width(), c.city().height()), (6, 4));
        assert_eq!(c.tick_interval(), MIN_TICK_INTERVAL);
        assert_eq!(c.city().params().growth_step, 2);

        cfg.width = 0;
        assert!(SimulationController::from_config(&cfg).is_err());
    }

    #[test]
    fn seeded_config_keeps_statistics() {
        let cfg = SimulationConfig {
            tick_interval_ms: 0,
            ..SimulationConfig::default()
        };
        let stats = CityStatistics {
            funds: 42,
            tax_rate: 0.3,
            ..CityStatistics::default()
        };
        let c = SimulationController::from_config_seeded(&cfg, stats.clone()).unwrap();
        assert_eq!(c.city().statistics(), &stats);
        assert_eq!(c.tick_interval(), MIN_TICK_INTERVAL);
        assert!(!c.is_running());

        let bad = CityStatistics {
            happiness: f64::INFINITY,
            ..CityStatistics::default()
        };
        assert!(matches!(
            SimulationController::from_config_seeded(&cfg, bad),
            Err(ConfigError::Statistics(_))
        ));
    }
}
