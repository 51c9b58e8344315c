//! Cell Passage Sim - Entry point
//!
//! Runs the HEK293 scale-up train and prints the passage report.
//!
//! CLI Usage:
//!   cargo run                                  # Default parameters
//!   cargo run -- --params data/parameters      # Strict load from a directory
//!   cargo run -- --target 1e12 --export        # Custom target, write CSV/JSON

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use cell_passage_sim::{
    config::{NegativityPolicy, Parameters},
    export::{export_report_json, export_trajectories_csv},
    scaleup::{PassageDriver, ScaleUpReport},
};

/// Command-line options
#[derive(Debug, Default)]
struct Options {
    params_dir: Option<PathBuf>,
    target_cells: Option<f64>,
    abort_on_negative: bool,
    export: bool,
}

fn parse_args() -> Result<Options> {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-p" | "--params" => {
                i += 1;
                let Some(dir) = args.get(i) else {
                    bail!("--params requires a directory");
                };
                options.params_dir = Some(PathBuf::from(dir));
            }
            "-t" | "--target" => {
                i += 1;
                let Some(value) = args.get(i) else {
                    bail!("--target requires a cell count");
                };
                let target = value
                    .parse()
                    .with_context(|| format!("invalid target cell count '{}'", value))?;
                options.target_cells = Some(target);
            }
            "--abort-on-negative" => options.abort_on_negative = true,
            "-e" | "--export" => options.export = true,
            "--help" | "-h" => {
                println!("Cell Passage Sim");
                println!();
                println!("Usage: cell-passage-sim [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --params DIR       Load kinetics.json/process.json from DIR (strict)");
                println!("  -t, --target N         Target cell count (default: 2.16e12)");
                println!("  --abort-on-negative    Fail when a concentration goes negative");
                println!("  -e, --export           Write trajectory CSV and report JSON to exports/");
                println!("  --help, -h             Show this help");
                std::process::exit(0);
            }
            other => log::warn!("Ignoring unknown argument '{}'", other),
        }
        i += 1;
    }

    Ok(options)
}

fn print_report(report: &ScaleUpReport) {
    println!("=== Scale-up Report ===\n");
    for p in &report.passages {
        println!(
            "Passage {}: {:>6} L, {:>4} h | Xv {:.3e} -> {:.3e} cells/L (x{:.3}) | Xd {:.3e} cells/L | {:.3e} cells",
            p.index + 1,
            p.volume_L,
            p.duration_h,
            p.initial_viable_density,
            p.final_viable_density,
            p.multiplier,
            p.final_dead_density,
            p.total_cell_count
        );
    }

    let fmt = |values: Vec<f64>| {
        values
            .iter()
            .map(|v| format!("{:.3e}", v))
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!();
    println!("Multipliers:        [{}]", fmt(report.multipliers()));
    println!("Inoculum densities: [{}] cells/L", fmt(report.inoculum_densities()));
    println!("Cell counts:        [{}]", fmt(report.cell_counts()));
    println!();
    println!(
        "Total time: {} h ({:.2} days)",
        report.total_elapsed_h,
        report.total_elapsed_days()
    );
    println!(
        "Final cell count: {:.3e} (target {:.3e})",
        report.final_cell_count, report.target_cell_count
    );
    println!("Target reached: {}", report.target_reached);
    println!(
        "Max viable density in last passage at t = {:.2} h",
        report.peak_viable_time_h
    );
}

fn main() -> Result<()> {
    env_logger::init();

    let options = parse_args()?;

    log::info!("Cell Passage Sim starting...");

    let mut params = match &options.params_dir {
        Some(dir) => Parameters::load_strict(dir)
            .with_context(|| format!("loading parameters from {}", dir.display()))?,
        None => Parameters::load_or_default(),
    };
    if let Some(target) = options.target_cells {
        params.process.target_cell_count = target;
    }
    if options.abort_on_negative {
        params.process.negativity_policy = NegativityPolicy::Abort;
    }

    let driver = PassageDriver::from_parameters(&params)?;

    let start_time = Instant::now();
    let report = driver.run()?;
    log::info!("Scale-up simulated in {:.2?}", start_time.elapsed());

    print_report(&report);

    if options.export {
        let csv_path = export_trajectories_csv(&report)?;
        let json_path = export_report_json(&report)?;
        println!();
        println!("Trajectories written to {}", csv_path.display());
        println!("Report written to {}", json_path.display());
    }

    Ok(())
}
