//! Result records and persistence for the sweep drivers
//!
//! Sweeps append one averaged record per parameter tuple to a CSV file,
//! writing the header row the first time the file is created. Records also
//! derive `Serialize` so single runs can be reported as JSON.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::simulation::Simulation;

/// Wire size of one accumulator update message
pub const ACCUMULATOR_MESSAGE_BYTES: u64 = 800;
/// Wire size of one signed witness message
pub const SIGNED_WITNESS_MESSAGE_BYTES: u64 = 750;

/// Outcome of a single propagation run
#[derive(Debug, Clone, Serialize)]
pub struct PropagationRecord {
    pub devices: usize,
    pub missing: usize,
    pub revocations_per_day: usize,
    pub accumulator_overhead_bytes: u64,
    pub witness_overhead_bytes: u64,
    pub total_overhead_bytes: u64,
    pub devices_updated: u64,
    pub interactions: u64,
    pub converged: bool,
}

impl PropagationRecord {
    /// Capture a finished run as a record
    pub fn from_run(sim: &Simulation) -> Self {
        let config = sim.config();
        let stats = sim.stats();
        let accumulator_overhead_bytes = stats.accumulator_exchanges * ACCUMULATOR_MESSAGE_BYTES;
        let witness_overhead_bytes = stats.witness_exchanges * SIGNED_WITNESS_MESSAGE_BYTES;
        Self {
            devices: config.device_count,
            missing: config.missing_updates,
            revocations_per_day: config.revocations_per_day,
            accumulator_overhead_bytes,
            witness_overhead_bytes,
            total_overhead_bytes: accumulator_overhead_bytes + witness_overhead_bytes,
            devices_updated: stats.devices_updated,
            interactions: stats.total_interactions,
            converged: sim.network().is_fully_updated(),
        }
    }
}

/// Averages over the repeated executions of one parameter tuple
#[derive(Debug, Clone, Serialize)]
pub struct PropagationSummary {
    pub devices: usize,
    pub missing: usize,
    pub revocations_per_day: usize,
    pub avg_accumulator_overhead_bytes: f64,
    pub avg_witness_overhead_bytes: f64,
    pub avg_total_overhead_bytes: f64,
    pub avg_devices_updated: f64,
    pub converged_runs: usize,
    pub executions: usize,
}

impl PropagationSummary {
    pub fn csv_header() -> &'static str {
        "devices,missing,revocations_per_day,avg_accumulator_overhead_bytes,\
         avg_witness_overhead_bytes,avg_total_overhead_bytes,avg_devices_updated,\
         converged_runs,executions"
    }

    pub fn csv_row(&self) -> String {
        format!(
            "{},{},{},{:.2},{:.2},{:.2},{:.2},{},{}",
            self.devices,
            self.missing,
            self.revocations_per_day,
            self.avg_accumulator_overhead_bytes,
            self.avg_witness_overhead_bytes,
            self.avg_total_overhead_bytes,
            self.avg_devices_updated,
            self.converged_runs,
            self.executions
        )
    }
}

/// Average the records of one parameter tuple; None for an empty slice
pub fn summarize(records: &[PropagationRecord]) -> Option<PropagationSummary> {
    let first = records.first()?;
    let n = records.len() as f64;
    Some(PropagationSummary {
        devices: first.devices,
        missing: first.missing,
        revocations_per_day: first.revocations_per_day,
        avg_accumulator_overhead_bytes: records
            .iter()
            .map(|r| r.accumulator_overhead_bytes as f64)
            .sum::<f64>()
            / n,
        avg_witness_overhead_bytes: records
            .iter()
            .map(|r| r.witness_overhead_bytes as f64)
            .sum::<f64>()
            / n,
        avg_total_overhead_bytes: records
            .iter()
            .map(|r| r.total_overhead_bytes as f64)
            .sum::<f64>()
            / n,
        avg_devices_updated: records.iter().map(|r| r.devices_updated as f64).sum::<f64>() / n,
        converged_runs: records.iter().filter(|r| r.converged).count(),
        executions: records.len(),
    })
}

/// Issuer-side timings for one execution
#[derive(Debug, Clone, Serialize)]
pub struct IssuerRecord {
    pub devices: usize,
    pub revocations: usize,
    pub accumulator_ms: f64,
    pub witnesses_ms: f64,
    pub revocation_ms: f64,
}

/// Averaged issuer timings over repeated executions
#[derive(Debug, Clone, Serialize)]
pub struct IssuerSummary {
    pub devices: usize,
    pub revocations: usize,
    pub avg_accumulator_ms: f64,
    pub avg_witnesses_ms: f64,
    pub avg_revocation_ms: f64,
    pub executions: usize,
}

impl IssuerSummary {
    pub fn csv_header() -> &'static str {
        "devices,revocations,avg_accumulator_ms,avg_witnesses_ms,avg_revocation_ms,executions"
    }

    pub fn csv_row(&self) -> String {
        format!(
            "{},{},{:.4},{:.4},{:.4},{}",
            self.devices,
            self.revocations,
            self.avg_accumulator_ms,
            self.avg_witnesses_ms,
            self.avg_revocation_ms,
            self.executions
        )
    }
}

pub fn summarize_issuer(records: &[IssuerRecord]) -> Option<IssuerSummary> {
    let first = records.first()?;
    let n = records.len() as f64;
    Some(IssuerSummary {
        devices: first.devices,
        revocations: first.revocations,
        avg_accumulator_ms: records.iter().map(|r| r.accumulator_ms).sum::<f64>() / n,
        avg_witnesses_ms: records.iter().map(|r| r.witnesses_ms).sum::<f64>() / n,
        avg_revocation_ms: records.iter().map(|r| r.revocation_ms).sum::<f64>() / n,
        executions: records.len(),
    })
}

/// Append one row to a CSV file, writing `header` first when the file is new
pub fn append_csv(path: &Path, header: &str, row: &str) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let new_file = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if new_file {
        writeln!(file, "{header}")?;
    }
    writeln!(file, "{row}")?;
    Ok(())
}
