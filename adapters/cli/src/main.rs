#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Churn Defence simulation.

mod scenario;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use churn_defence_core::{MetricsReport, Point, TowerId, TowerKind};
use churn_defence_simulation::Simulation;
use churn_defence_world::query;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::scenario::{parse_point, Scenario};

/// Command-line arguments accepted by the Churn Defence runner.
#[derive(Debug, Parser)]
#[command(name = "churn-defence", about = "Runs a headless Churn Defence simulation")]
struct CliArgs {
    /// TOML scenario describing the configuration and starting towers.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 3_600)]
    ticks: u32,
    /// Overrides the seed from the scenario.
    #[arg(long)]
    seed: Option<u64>,
    /// Ticks advanced per step.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    speed: u32,
    /// Places a sales tower at `x,y`; may be repeated.
    #[arg(long = "sales", value_name = "X,Y", value_parser = parse_point)]
    sales: Vec<Point>,
    /// Places a customer success tower at `x,y`; may be repeated.
    #[arg(long = "csm", value_name = "X,Y", value_parser = parse_point)]
    csm: Vec<Point>,
    /// Ticks between progress reports; zero disables them.
    #[arg(long, default_value_t = 600)]
    report_every: u32,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = CliArgs::parse();
    let mut scenario = match &args.config {
        Some(path) => load_scenario(path)?,
        None => Scenario::default(),
    };
    if let Some(seed) = args.seed {
        scenario.simulation.rng_seed = seed;
    }

    let mut simulation = Simulation::new(scenario.simulation);
    println!("{}", query::welcome_banner(simulation.world()));
    info!(
        ticks = args.ticks,
        speed = args.speed,
        seed = scenario.simulation.rng_seed,
        "starting simulation"
    );

    place_towers(&mut simulation, &scenario, &args);
    run(&mut simulation, &scenario, &args);

    let snapshot = simulation.snapshot();
    println!(
        "Finished | ticks: {} | capital: {:.0} | towers: {} | customers: {} | ended: {}",
        snapshot.frame,
        snapshot.capital,
        snapshot.towers.len(),
        snapshot.customers.len(),
        snapshot.ended
    );
    println!("{}", format_metrics(&snapshot.metrics));
    Ok(())
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario {}", path.display()))?;
    Scenario::from_toml(&text)
        .with_context(|| format!("failed to load scenario {}", path.display()))
}

fn place_towers(simulation: &mut Simulation, scenario: &Scenario, args: &CliArgs) {
    for placement in &scenario.towers {
        let Some(tower) = place(simulation, placement.kind, placement.position()) else {
            continue;
        };
        if let Some(strategy) = placement.strategy {
            if let Err(error) = simulation.set_targeting_strategy(tower, strategy) {
                warn!(%tower, %error, "strategy rejected");
            }
        }
    }

    let flagged = args
        .sales
        .iter()
        .map(|&position| (TowerKind::Sales, position))
        .chain(args.csm.iter().map(|&position| (TowerKind::Csm, position)));
    for (kind, position) in flagged {
        let _ = place(simulation, kind, position);
    }
}

fn place(simulation: &mut Simulation, kind: TowerKind, position: Point) -> Option<TowerId> {
    match simulation.place_tower(kind, position) {
        Ok(tower) => Some(tower),
        Err(error) => {
            warn!(?kind, ?position, %error, "tower placement rejected");
            None
        }
    }
}

fn run(simulation: &mut Simulation, scenario: &Scenario, args: &CliArgs) {
    let mut elapsed = 0u32;
    let mut next_report = args.report_every;

    while elapsed < args.ticks {
        if scenario
            .product_upgrade_at
            .is_some_and(|tick| tick >= elapsed && tick < elapsed + args.speed)
        {
            if let Err(error) = simulation.start_product_upgrade() {
                warn!(%error, "product upgrade rejected");
            }
        }

        let step = args.speed.min(args.ticks - elapsed);
        let advanced = simulation.advance_by(step);
        elapsed += advanced;

        if args.report_every > 0 && elapsed >= next_report {
            next_report = next_report.saturating_add(args.report_every);
            let metrics = simulation.metrics();
            info!(
                tick = elapsed,
                capital = simulation.capital(),
                arr = metrics.arr,
                customers = metrics.customer_count,
                "progress"
            );
        }

        if advanced < step {
            info!(tick = elapsed, "simulation ended early");
            break;
        }
    }
}

fn format_metrics(metrics: &MetricsReport) -> String {
    format!(
        "KPI | ARR: {:.0} | MRR: {:.0} | NRR: {:.1}% | GRR: {:.1}% | CAC: {:.0} | LTV: {:.0} | accounts: {} | churn: {:.1}%",
        metrics.arr,
        metrics.mrr,
        metrics.nrr * 100.0,
        metrics.grr * 100.0,
        metrics.cac,
        metrics.ltv,
        metrics.customer_count,
        metrics.churn_rate * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_parse_repeated_points() {
        let args = CliArgs::try_parse_from([
            "churn-defence",
            "--ticks",
            "120",
            "--sales",
            "60,60",
            "--sales",
            "60,540",
            "--csm",
            "740,540",
            "--speed",
            "4",
        ])
        .expect("arguments parse");
        assert_eq!(args.ticks, 120);
        assert_eq!(args.speed, 4);
        assert_eq!(args.sales, vec![Point::new(60.0, 60.0), Point::new(60.0, 540.0)]);
        assert_eq!(args.csm, vec![Point::new(740.0, 540.0)]);
    }

    #[test]
    fn zero_speed_is_rejected() {
        assert!(CliArgs::try_parse_from(["churn-defence", "--speed", "0"]).is_err());
    }

    #[test]
    fn run_honours_tick_budget_and_speed() {
        let args = CliArgs::try_parse_from(["churn-defence", "--ticks", "10", "--speed", "3"])
            .expect("arguments parse");
        let scenario = Scenario {
            product_upgrade_at: Some(4),
            ..Scenario::default()
        };
        let mut simulation = Simulation::new(scenario.simulation);
        run(&mut simulation, &scenario, &args);
        assert_eq!(simulation.snapshot().frame, 10);
        assert!(simulation.snapshot().product_upgrade.active);
    }

    #[test]
    fn metrics_line_reports_percentages() {
        let line = format_metrics(&MetricsReport {
            nrr: 1.2,
            grr: 0.9,
            ..MetricsReport::default()
        });
        assert!(line.contains("NRR: 120.0%"));
        assert!(line.contains("GRR: 90.0%"));
    }
}
