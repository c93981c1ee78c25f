//! Command-line front end: load a case, solve it, export the result tables.

use anyhow::{bail, Result};
use clap::Parser;
use sdom_model::{build_model, export_results, solve, SolveStatus, SolverConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sdom", about = "Storage deployment optimization model", version)]
struct Args {
    /// Case directory containing the input tables.
    #[arg(long, short = 'i')]
    input_dir: PathBuf,

    /// Planning horizon in hours.
    #[arg(long, default_value_t = 8760)]
    hours: usize,

    /// Run the two-stage resilience workflow.
    #[arg(long)]
    resilience: bool,

    /// Case name used in output file names.
    #[arg(long, default_value = "base")]
    case: String,

    /// Directory for the Output*.csv files.
    #[arg(long, short = 'o', default_value = "results")]
    output_dir: PathBuf,

    /// Solver backend.
    #[arg(long, default_value = "cbc")]
    solver: String,

    /// Wall-clock solver limit, seconds.
    #[arg(long)]
    time_limit: Option<f64>,

    /// Relative MIP optimality gap.
    #[arg(long)]
    mip_gap: Option<f64>,

    /// Branch-and-bound worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Extra solver-native option, `key=value`; repeatable.
    #[arg(long = "solver-option", value_parser = parse_key_value)]
    solver_options: Vec<(String, String)>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("'{raw}' is not a key=value pair"))
}

fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!(
        case = args.case,
        hours = args.hours,
        resilience = args.resilience,
        "building model"
    );

    let mut model = build_model(&args.input_dir, args.hours, args.resilience, &args.case)?;
    let config = SolverConfig {
        solver: args.solver,
        time_limit_seconds: args.time_limit,
        mip_gap: args.mip_gap,
        threads: args.threads,
        options: args.solver_options,
    };

    let results = solve(&mut model, &config)?;
    match results.status {
        SolveStatus::Optimal => {
            let solution = results
                .solution
                .as_ref()
                .expect("optimal results carry a solution");
            println!("Status: optimal");
            println!("Total cost: ${:.2}", solution.total_cost);
            println!(
                "Problem size: {} rows, {} columns ({} binary)",
                results.stats.rows, results.stats.columns, results.stats.binaries
            );
            println!("Solve time: {:.2?}", results.solve_time);
            for (label, value) in &solution.cost_decomposition {
                if value.abs() > 1e-9 {
                    println!("  {label}: ${value:.2}");
                }
            }
            export_results(&results, &args.output_dir)?;
            println!("Results written to {}", args.output_dir.display());
        }
        SolveStatus::Infeasible => bail!("model is infeasible; no results extracted"),
        SolveStatus::Unbounded => bail!("model is unbounded; no results extracted"),
        SolveStatus::TimeLimit => {
            bail!(
                "solver hit the time limit (incumbent available: {})",
                results.has_incumbent()
            )
        }
    }
    Ok(())
}
