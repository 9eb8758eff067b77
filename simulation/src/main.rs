//! Revmesh - Revocation Propagation Simulation
//!
//! Simulates how accumulator updates and membership witnesses diffuse
//! through a device population via issuer broadcast and pairwise gossip.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use revmesh_simulation::report::{
    IssuerRecord, IssuerSummary, PropagationRecord, PropagationSummary, append_csv, summarize,
    summarize_issuer,
};
use revmesh_simulation::{Network, SimConfig, Simulation, scenarios};

#[derive(Parser)]
#[command(
    name = "revmesh",
    about = "Revocation propagation simulation over gossiping device populations",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single simulation and print its per-day reports
    Run {
        /// Population size
        #[arg(short, long, default_value = "100")]
        devices: usize,

        /// Devices unreachable by the issuer broadcast
        #[arg(short, long, default_value = "0")]
        missing: usize,

        /// Pairwise interactions per device per hour
        #[arg(long, default_value = "5")]
        per_hour: u32,

        /// Daily interaction budget, consumed in hourly increments
        #[arg(long, default_value = "600")]
        per_day: u32,

        /// Simulated days
        #[arg(long, default_value = "1")]
        days: u32,

        /// Credentials revoked at the start of each day
        #[arg(short, long, default_value = "0")]
        revoke: usize,

        /// Fixed seed for a reproducible run
        #[arg(short, long)]
        seed: Option<u64>,

        /// Print the reports as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Sweep population sizes and missing-update fractions, appending
    /// averaged propagation overheads to a CSV file
    Sweep {
        /// Population sizes to sweep
        #[arg(short, long, value_delimiter = ',', default_value = "1000,5000")]
        devices: Vec<usize>,

        /// Percentages of the population missing broadcast updates
        #[arg(short, long, value_delimiter = ',', default_value = "10,30,50")]
        missing_pct: Vec<usize>,

        /// Credentials revoked per day, as a percentage of the population
        #[arg(long, default_value = "0.028")]
        revoke_pct: f64,

        /// Repeated executions per parameter tuple
        #[arg(short, long, default_value = "10")]
        executions: u64,

        /// Base seed; each execution offsets it for independence
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output CSV file
        #[arg(short, long, default_value = "results/propagation.csv")]
        out: PathBuf,
    },

    /// Measure issuer-side accumulator and witness generation overheads
    /// across revocation rates, appending averages to a CSV file
    Issuer {
        /// Population sizes to sweep
        #[arg(short, long, value_delimiter = ',', default_value = "1000,5000")]
        devices: Vec<usize>,

        /// Revocation rates to sweep, as percentages of the population
        #[arg(short, long, value_delimiter = ',', default_value = "10,25,50")]
        revoke_pct: Vec<usize>,

        /// Repeated executions per parameter tuple
        #[arg(short, long, default_value = "10")]
        executions: u64,

        /// Base seed; each execution offsets it for independence
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output CSV file
        #[arg(short, long, default_value = "results/issuer_overhead.csv")]
        out: PathBuf,
    },

    /// Run a pre-defined scenario: broadcast, gossip, starved, revocation
    Scenario {
        /// Scenario name
        name: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            devices,
            missing,
            per_hour,
            per_day,
            days,
            revoke,
            seed,
            json,
        } => {
            let config = SimConfig {
                device_count: devices,
                missing_updates: missing,
                interactions_per_hour: per_hour,
                interactions_per_day: per_day,
                days,
                revocations_per_day: revoke,
                seed,
            };
            run_single(config, json)?;
        }
        Commands::Sweep {
            devices,
            missing_pct,
            revoke_pct,
            executions,
            seed,
            out,
        } => {
            run_sweep(&devices, &missing_pct, revoke_pct, executions, seed, &out)?;
        }
        Commands::Issuer {
            devices,
            revoke_pct,
            executions,
            seed,
            out,
        } => {
            run_issuer_sweep(&devices, &revoke_pct, executions, seed, &out)?;
        }
        Commands::Scenario { name } => match name.as_str() {
            "broadcast" => {
                scenarios::run_broadcast_scenario()?;
            }
            "gossip" => {
                scenarios::run_gossip_scenario()?;
            }
            "starved" => {
                scenarios::run_starved_scenario()?;
            }
            "revocation" => {
                scenarios::run_revocation_scenario()?;
            }
            other => {
                anyhow::bail!(
                    "Unknown scenario: {other}. \
                     Available: broadcast, gossip, starved, revocation"
                );
            }
        },
    }

    Ok(())
}

fn run_single(config: SimConfig, json: bool) -> anyhow::Result<()> {
    let mut sim = Simulation::new(config)?;
    let reports = sim.run()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!("\n=== Per-day reports ===");
    for report in &reports {
        println!(
            "  Day {}: revoked {}, accumulator exchanges {}, witness exchanges {}, \
             updated by gossip {}, converged {}",
            report.day,
            report.revoked,
            report.accumulator_exchanges,
            report.witness_exchanges,
            report.devices_updated,
            report.converged
        );
    }

    let record = PropagationRecord::from_run(&sim);
    println!("\n=== Communication overhead ===");
    println!("  Accumulator overhead: {} bytes", record.accumulator_overhead_bytes);
    println!("  Witness overhead: {} bytes", record.witness_overhead_bytes);
    println!("  Total overhead: {} bytes", record.total_overhead_bytes);
    println!("  Interactions: {}", record.interactions);
    Ok(())
}

fn run_sweep(
    devices: &[usize],
    missing_pct: &[usize],
    revoke_pct: f64,
    executions: u64,
    seed: Option<u64>,
    out: &std::path::Path,
) -> anyhow::Result<()> {
    for &device_count in devices {
        let revocations = ((device_count as f64) * revoke_pct / 100.0).ceil() as usize;
        for &pct in missing_pct {
            let missing = device_count * pct / 100;
            info!(device_count, missing, revocations, executions, "sweep point");

            let mut records = Vec::with_capacity(executions as usize);
            for execution in 0..executions {
                let config = SimConfig {
                    device_count,
                    missing_updates: missing,
                    revocations_per_day: revocations,
                    seed: seed.map(|s| s + execution),
                    ..Default::default()
                };
                let mut sim = Simulation::new(config)?;
                sim.run()?;
                records.push(PropagationRecord::from_run(&sim));
            }

            if let Some(summary) = summarize(&records) {
                append_csv(out, PropagationSummary::csv_header(), &summary.csv_row())?;
                println!(
                    "  {} devices, {}% missing: avg total overhead {:.0} bytes, \
                     {}/{} runs converged",
                    device_count, pct, summary.avg_total_overhead_bytes,
                    summary.converged_runs, summary.executions
                );
            }
        }
    }
    println!("Results appended to {}", out.display());
    Ok(())
}

fn run_issuer_sweep(
    devices: &[usize],
    revoke_pct: &[usize],
    executions: u64,
    seed: Option<u64>,
    out: &std::path::Path,
) -> anyhow::Result<()> {
    for &device_count in devices {
        for &pct in revoke_pct {
            let revocations = device_count * pct / 100;
            info!(device_count, revocations, executions, "issuer sweep point");

            let mut records = Vec::with_capacity(executions as usize);
            for execution in 0..executions {
                let mut rng = match seed {
                    Some(s) => StdRng::seed_from_u64(s + execution),
                    None => StdRng::seed_from_u64(rand::rng().random()),
                };
                let mut network = Network::new(device_count, 0, &mut rng)?;
                let timings = network.generate_accumulator()?;
                let revocation = network.revoke_batch(revocations, &mut rng)?;

                records.push(IssuerRecord {
                    devices: device_count,
                    revocations,
                    accumulator_ms: timings.accumulator.as_secs_f64() * 1e3,
                    witnesses_ms: timings.witnesses.as_secs_f64() * 1e3,
                    revocation_ms: revocation.as_secs_f64() * 1e3,
                });
            }

            if let Some(summary) = summarize_issuer(&records) {
                append_csv(out, IssuerSummary::csv_header(), &summary.csv_row())?;
                println!(
                    "  {} devices, {}% revoked: accumulator {:.3} ms, \
                     witnesses {:.3} ms, revocation {:.3} ms",
                    device_count, pct, summary.avg_accumulator_ms,
                    summary.avg_witnesses_ms, summary.avg_revocation_ms
                );
            }
        }
    }
    println!("Results appended to {}", out.display());
    Ok(())
}
