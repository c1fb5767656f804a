//! tap-sue — stochastic user equilibrium assignment on TNTP networks.
//!
//! Reads a TNTP link file and trip file, runs logit-based assignment with
//! Dial loading under MSA, and prints a run summary.  Set `RUST_LOG=info`
//! (or `debug`) to watch per-iteration progress.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use tap_assign::{SolveStats, SueSolver};
use tap_core::SolverConfig;
use tap_network::tntp;

// ── Command line ──────────────────────────────────────────────────────────────

/// Logit-based stochastic user equilibrium (Dial loading + MSA).
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// TNTP link (network) file.
    link_file: PathBuf,

    /// TNTP trip (demand) file.
    trip_file: PathBuf,

    /// Logit dispersion θ (> 0); higher is closer to all-or-nothing.
    theta: f64,

    /// MSA step size λ in (0, 1].
    lambda: f64,

    /// Iteration cap.
    #[arg(long, default_value_t = 100)]
    max_iterations: u32,

    /// Wall-clock budget in seconds.
    #[arg(long, default_value_t = 3600.0)]
    max_time: f64,

    /// Convergence threshold on the average link-flow gap.
    #[arg(long, default_value_t = 1e-3)]
    tolerance: f64,

    /// Write the final link flows to this CSV file.
    #[arg(long)]
    flows_out: Option<PathBuf>,
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    // 1. Load network and demand.
    let (network, demand) = tntp::load(&args.link_file, &args.trip_file)
        .with_context(|| format!("loading {} / {}", args.link_file.display(), args.trip_file.display()))?;
    println!(
        "Network: {} nodes ({} zones, first through node {}), {} arcs",
        network.node_count(),
        network.num_zones,
        network.first_through_node + 1,
        network.arc_count()
    );
    println!("Demand : {:.1} trips over {} zones", demand.total(), demand.num_zones());

    // 2. Build the solver (bushes + iteration-0 loading happen here).
    let config = SolverConfig {
        max_iterations: args.max_iterations,
        max_time_secs: args.max_time,
        flow_tolerance: args.tolerance,
        ..SolverConfig::new(args.theta, args.lambda)
    };
    let mut solver = SueSolver::new(network, demand, config).context("building solver")?;

    let total_links: usize = solver.bushes.iter().map(|b| b.num_links).sum();
    let total_paths: u64 = solver.bushes.iter().map(|b| b.num_paths).sum();
    println!(
        "Bushes : {} origins, {} reasonable links, {} routes in use",
        solver.bushes.len(),
        total_links,
        total_paths
    );
    println!();

    // 3. Solve.
    let stats = solver.solve();
    print_summary(&stats, &solver);

    // 4. Optional flow dump.
    if let Some(path) = &args.flows_out {
        write_flows(path, &solver)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Link flows written to {}", path.display());
    }

    Ok(())
}

fn print_summary(stats: &SolveStats, solver: &SueSolver) {
    println!(
        "{} after {} iterations in {:.3} s",
        if stats.converged { "Converged" } else { "Stopped" },
        stats.iterations,
        stats.elapsed.as_secs_f64()
    );
    println!("  avg link-flow gap : {:.6}", stats.avg_flow_diff);
    println!("  total system cost : {:.3}", solver.network.total_cost());
}

/// Dump per-arc flows and costs, with 1-based node numbers to match the
/// TNTP input convention.
fn write_flows(path: &std::path::Path, solver: &SueSolver) -> Result<()> {
    let net = &solver.network;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["tail", "head", "flow", "cost"])?;
    for a in 0..net.arc_count() {
        writer.write_record(&[
            (net.tail[a].0 + 1).to_string(),
            (net.head[a].0 + 1).to_string(),
            format!("{:.6}", net.flow[a]),
            format!("{:.6}", net.cost[a]),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
