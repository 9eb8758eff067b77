//! # Revmesh Simulation
//!
//! A simulation of how credential-revocation state spreads through a large
//! population of loosely-connected devices that interact pairwise and
//! intermittently, without a central broadcast channel reaching everyone.
//!
//! ## Overview
//!
//! An issuer maintains a positive accumulator over the set of valid
//! credentials and a membership witness per holder. Revoking a batch changes
//! the accumulator value and invalidates every outstanding witness, so the
//! whole population goes stale at once. Devices reachable by the issuer's
//! broadcast become fresh immediately; the rest depend on random pairwise
//! gossip:
//!
//! - A device holding a fresh accumulator value hands it to a stale peer.
//! - A fresh witness travels along only when a Normal device takes part;
//!   Constrained devices can relay accumulator values but cannot complete a
//!   witness exchange on their own.
//!
//! The engine runs simulated days (revocation, broadcast, hourly gossip
//! rounds under a per-device interaction budget) and reports exchange
//! counts, byte overhead, and convergence.
//!
//! ## Architecture
//!
//! - **Types** (`types.rs`): device state records and freshness flags
//! - **Issuer** (`issuer.rs`): accumulator generation, batch revocation,
//!   witness tables, broadcast push
//! - **Network** (`network.rs`): population, shuffling, the pairwise
//!   propagation rule, convergence predicates
//! - **Simulation** (`simulation.rs`): seeded day/hour engine and reports
//! - **Scenarios** (`scenarios.rs`): canonical runs with known outcomes
//! - **Report** (`report.rs`): sweep records, averaging, CSV persistence
//!
//! ## Example
//!
//! ```rust,ignore
//! use revmesh_simulation::{SimConfig, Simulation};
//!
//! let mut sim = Simulation::new(SimConfig {
//!     device_count: 1000,
//!     missing_updates: 300,
//!     revocations_per_day: 28,
//!     seed: Some(7),
//!     ..Default::default()
//! })?;
//!
//! let reports = sim.run()?;
//! assert!(reports.last().unwrap().converged);
//! ```
//!
//! Runs are deterministic for a fixed seed; repetitions with different seeds
//! are independent and can safely run in parallel, each owning its private
//! population and issuer.

pub mod error;
pub mod issuer;
pub mod network;
pub mod report;
pub mod scenarios;
pub mod simulation;
pub mod types;

#[cfg(test)]
mod convergence_properties;

// Re-export main types
pub use error::{SimulationError, SimulationResult};
pub use issuer::{GenerationTimings, Issuer};
pub use network::{Network, PairOutcome};
pub use simulation::{DayReport, SimConfig, SimStats, Simulation};
pub use types::{CredentialStatus, Device, DeviceClass, DeviceId, Freshness};
