#![deny(warnings)]

//! Headless driver: loads a scenario, lays out the city, runs ticks and
//! reports KPIs.

mod scenario;

use anyhow::{Context, Result};
use city_runtime::{CityEvent, CitySnapshot, SimulationController, StatsHistory};
use clap::Parser;
use scenario::Scenario;
use serde::Serialize;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless city economy simulation")]
struct Cli {
    /// Scenario YAML file; an empty default city when omitted
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Override the number of ticks to run
    #[arg(long)]
    ticks: Option<u64>,

    /// Pace ticks in real time (milliseconds, 0 = unpaced)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Print the final city and history as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct RunReport<'a> {
    scenario: &'a str,
    ticks: u64,
    city: CitySnapshot,
    history: &'a StatsHistory,
}

fn log_every(ticks: u64) -> u64 {
    (ticks / 10).max(1)
}

fn log_progress(controller: &SimulationController, every: u64) {
    let tick = controller.ticks_elapsed();
    if tick % every != 0 {
        return;
    }
    let s = controller.city().statistics();
    info!(
        tick,
        population = s.population,
        funds = s.funds,
        mayor_rating = format!("{:.1}%", s.mayor_rating * 100.0),
        "progress"
    );
}

fn run_unpaced(controller: &mut SimulationController, ticks: u64) {
    let every = log_every(ticks);
    for _ in 0..ticks {
        controller.advance();
        log_progress(controller, every);
    }
}

fn run_paced(controller: &mut SimulationController, ticks: u64) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building tick runtime")?;
    let every = log_every(ticks);
    runtime.block_on(async {
        let mut interval = tokio::time::interval(controller.tick_interval());
        // The first tick completes immediately.
        interval.tick().await;
        for _ in 0..ticks {
            interval.tick().await;
            controller.advance();
            log_progress(controller, every);
        }
    });
    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    info!(
        git_sha = env!("GIT_SHA"),
        build_date = env!("BUILD_DATE"),
        scenario = ?cli.scenario,
        "starting CLI"
    );

    let scenario = match &cli.scenario {
        Some(path) => Scenario::load(path)?,
        None => Scenario::default(),
    };
    let mut controller = scenario
        .controller()
        .with_context(|| format!("scenario '{}'", scenario.name))?;

    let history = Rc::new(RefCell::new(StatsHistory::new(scenario.history_len)));
    let sink = Rc::clone(&history);
    controller.city_mut().subscribe(move |event| {
        if let CityEvent::StatisticsUpdated(stats) = event {
            sink.borrow_mut().record(stats);
        }
    });

    let layout = scenario.populate(&mut controller)?;
    info!(
        placed = layout.placed,
        rejected = layout.rejected,
        "city laid out"
    );

    let ticks = cli.ticks.unwrap_or(scenario.ticks);
    let interval_ms = cli.interval_ms.unwrap_or(scenario.interval_ms);
    controller.start();
    if interval_ms == 0 {
        run_unpaced(&mut controller, ticks);
    } else {
        let stored = controller.set_tick_interval(Duration::from_millis(interval_ms));
        info!(interval_ms = stored.as_millis() as u64, "pacing ticks");
        run_paced(&mut controller, ticks)?;
    }
    controller.stop();

    let city = controller.city();
    let s = city.statistics();
    println!(
        "City '{}' | {}x{} | buildings: {} | ticks: {}",
        scenario.name,
        city.width(),
        city.height(),
        city.building_count(),
        controller.ticks_elapsed()
    );
    println!(
        "KPI | population: {}/{} | employed: {} | funds: {} | tax: {:.0}% | happiness: {:.2} | mayor: {:.1}%",
        s.population,
        s.max_population,
        s.employed,
        s.funds,
        s.tax_rate * 100.0,
        s.happiness,
        s.mayor_rating * 100.0
    );
    println!(
        "Satisfaction | space: {:.2} | jobs: {:.2} | leisure: {:.2} | wealth: {:.2}",
        s.space_satisfaction, s.job_satisfaction, s.leisure_satisfaction, s.wealth_satisfaction
    );

    if cli.json {
        let history = history.borrow();
        let report = RunReport {
            scenario: &scenario.name,
            ticks: controller.ticks_elapsed(),
            city: city.snapshot(),
            history: &history,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
