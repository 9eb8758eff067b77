//! Simulation engine for revmesh
//!
//! Drives a population through simulated days. Each day the issuer revokes a
//! batch of credentials (staling the whole population), broadcasts updates to
//! every reachable device, and the engine then runs hourly gossip rounds
//! until the day's interaction budget is spent. Runs are deterministic for a
//! fixed seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{SimulationError, SimulationResult};
use crate::network::{Network, PairOutcome};

/// Configuration for one simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimConfig {
    /// Population size
    pub device_count: usize,
    /// Devices unreachable by the issuer's broadcast channel
    pub missing_updates: usize,
    /// Pairwise interaction budget per device per hour
    pub interactions_per_hour: u32,
    /// Total interaction budget per day, consumed in hourly increments
    pub interactions_per_day: u32,
    /// Simulated days to run
    pub days: u32,
    /// Credentials revoked at the start of each day
    pub revocations_per_day: usize,
    /// Fixed seed for reproducible runs; None draws one from the OS
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            device_count: 100,
            missing_updates: 0,
            interactions_per_hour: 5,
            interactions_per_day: 600,
            days: 1,
            revocations_per_day: 0,
            seed: None,
        }
    }
}

/// Counters accumulated over a whole run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimStats {
    pub accumulator_exchanges: u64,
    pub witness_exchanges: u64,
    /// Devices whose accumulator copy was refreshed by gossip rather than
    /// by the issuer's broadcast
    pub devices_updated: u64,
    pub total_interactions: u64,
    /// Hourly rounds that ended before the budget was spent because no
    /// interaction partner remained
    pub rounds_cut_short: u64,
}

/// End-of-day summary reported to the driver layer
#[derive(Debug, Clone, Serialize)]
pub struct DayReport {
    pub day: u32,
    pub revoked: usize,
    /// Cumulative exchange counters at the end of the day
    pub accumulator_exchanges: u64,
    pub witness_exchanges: u64,
    /// Devices refreshed by gossip during this day
    pub devices_updated: u64,
    pub converged: bool,
}

/// One simulation run over a private population
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    network: Network,
    rng: StdRng,
    devices_updated: u64,
    rounds_cut_short: u64,
    day: u32,
}

impl Simulation {
    /// Build a run from its configuration. Seeds the generator, constructs
    /// the population and issuer, and generates the initial accumulator.
    pub fn new(config: SimConfig) -> SimulationResult<Self> {
        if config.interactions_per_hour == 0 {
            return Err(SimulationError::PreconditionViolation(
                "interactions per hour must be at least 1".to_string(),
            ));
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::rng().random()),
        };
        let mut network = Network::new(config.device_count, config.missing_updates, &mut rng)?;

        let timings = network.generate_accumulator()?;
        debug!(
            accumulator = ?timings.accumulator,
            witnesses = ?timings.witnesses,
            "initial accumulator generated"
        );

        Ok(Self {
            config,
            network,
            rng,
            devices_updated: 0,
            rounds_cut_short: 0,
            day: 0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Days simulated so far
    pub fn day(&self) -> u32 {
        self.day
    }

    /// Snapshot of the run's counters
    pub fn stats(&self) -> SimStats {
        SimStats {
            accumulator_exchanges: self.network.accumulator_exchanges(),
            witness_exchanges: self.network.witness_exchanges(),
            devices_updated: self.devices_updated,
            total_interactions: self.network.total_interactions(),
            rounds_cut_short: self.rounds_cut_short,
        }
    }

    /// Run the configured number of days
    pub fn run(&mut self) -> SimulationResult<Vec<DayReport>> {
        let mut reports = Vec::with_capacity(self.config.days as usize);
        for _ in 0..self.config.days {
            reports.push(self.run_day()?);
        }
        info!(
            days = self.day,
            converged = self.network.is_fully_updated(),
            "simulation complete"
        );
        Ok(reports)
    }

    /// Run one simulated day: revocation, broadcast, hourly gossip rounds
    pub fn run_day(&mut self) -> SimulationResult<DayReport> {
        self.day += 1;
        let updated_before = self.devices_updated;

        let revoked = self.config.revocations_per_day;
        if revoked > 0 {
            let elapsed = self.network.revoke_batch(revoked, &mut self.rng)?;
            debug!(day = self.day, revoked, ?elapsed, "revocation step done");
            if !self.network.is_fully_stale() {
                return Err(SimulationError::InvariantViolation(
                    "population not fully stale after revocation".to_string(),
                ));
            }
        }

        let (updated, missing) = self.network.push_updates();
        debug!(day = self.day, updated, missing, "broadcast step done");

        let hours = self
            .config
            .interactions_per_day
            .div_ceil(self.config.interactions_per_hour);
        for _ in 0..hours {
            self.network.reset_hourly_interactions();
            self.network.shuffle(&mut self.rng);
            self.interaction_round();
        }

        self.check_invariants()?;

        let report = DayReport {
            day: self.day,
            revoked,
            accumulator_exchanges: self.network.accumulator_exchanges(),
            witness_exchanges: self.network.witness_exchanges(),
            devices_updated: self.devices_updated - updated_before,
            converged: self.network.is_fully_updated(),
        };
        info!(
            day = report.day,
            accumulator_exchanges = report.accumulator_exchanges,
            witness_exchanges = report.witness_exchanges,
            devices_updated = report.devices_updated,
            converged = report.converged,
            "day complete"
        );
        Ok(report)
    }

    // One hourly round: pair devices until the budget saturates. Ends early,
    // and cleanly, when no initiator or no partner with budget remains.
    fn interaction_round(&mut self) {
        let per_hour = self.config.interactions_per_hour;
        loop {
            let Some(initiator) = self.network.first_with_budget(per_hour) else {
                break;
            };
            let Some(partner) = self.network.partner_for(initiator, per_hour) else {
                self.rounds_cut_short += 1;
                break;
            };

            if let PairOutcome::AccumulatorExchanged { .. } =
                self.network.pair_interact(initiator, partner)
            {
                self.devices_updated += 1;
            }

            self.network.shuffle(&mut self.rng);
        }
    }

    // A witness is only ever refreshed together with an accumulator value,
    // so a fresh witness over a stale accumulator means the rule was broken.
    fn check_invariants(&self) -> SimulationResult<()> {
        for device in self.network.devices() {
            if device.witness.is_fresh() && !device.accumulator.is_fresh() {
                return Err(SimulationError::InvariantViolation(format!(
                    "device {} holds a fresh witness over a stale accumulator",
                    device.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_interactions_per_hour_rejected() {
        let config = SimConfig {
            interactions_per_hour: 0,
            ..Default::default()
        };
        assert!(matches!(
            Simulation::new(config),
            Err(SimulationError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_seeded_runs_are_deterministic() {
        let config = SimConfig {
            device_count: 60,
            missing_updates: 20,
            revocations_per_day: 2,
            seed: Some(42),
            ..Default::default()
        };

        let mut first = Simulation::new(config.clone()).unwrap();
        let first_reports = first.run().unwrap();
        let mut second = Simulation::new(config).unwrap();
        let second_reports = second.run().unwrap();

        assert_eq!(first_reports.len(), second_reports.len());
        for (a, b) in first_reports.iter().zip(&second_reports) {
            assert_eq!(a.accumulator_exchanges, b.accumulator_exchanges);
            assert_eq!(a.witness_exchanges, b.witness_exchanges);
            assert_eq!(a.devices_updated, b.devices_updated);
            assert_eq!(a.converged, b.converged);
        }
        assert_eq!(
            first.network().total_interactions(),
            second.network().total_interactions()
        );
    }

    #[test]
    fn test_two_device_gossip_converges() {
        // One broadcast-reachable device, one missing. The single pairing
        // per hour must hand over both the accumulator and the witness.
        let config = SimConfig {
            device_count: 2,
            missing_updates: 1,
            interactions_per_hour: 1,
            interactions_per_day: 1,
            revocations_per_day: 1,
            seed: Some(9),
            ..Default::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        let reports = sim.run().unwrap();

        assert!(reports[0].converged);
        assert_eq!(reports[0].accumulator_exchanges, 1);
        assert_eq!(reports[0].witness_exchanges, 1);
        assert_eq!(reports[0].devices_updated, 1);
    }

    #[test]
    fn test_day_report_counters_accumulate() {
        let config = SimConfig {
            device_count: 40,
            missing_updates: 10,
            revocations_per_day: 1,
            days: 3,
            seed: Some(5),
            ..Default::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        let reports = sim.run().unwrap();

        assert_eq!(reports.len(), 3);
        for pair in reports.windows(2) {
            assert!(pair[1].accumulator_exchanges >= pair[0].accumulator_exchanges);
            assert!(pair[1].witness_exchanges >= pair[0].witness_exchanges);
        }
        let stats = sim.stats();
        assert_eq!(
            stats.devices_updated,
            reports.iter().map(|r| r.devices_updated).sum::<u64>()
        );
        assert!(stats.witness_exchanges <= stats.accumulator_exchanges);
    }

    #[test]
    fn test_infeasible_daily_revocation_fails() {
        let config = SimConfig {
            device_count: 4,
            revocations_per_day: 3,
            days: 2,
            seed: Some(1),
            ..Default::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        // Day 1 revokes 3 of 4; day 2 cannot find another 3 valid credentials
        let err = sim.run().unwrap_err();
        assert!(matches!(err, SimulationError::PreconditionViolation(_)));
    }
}
