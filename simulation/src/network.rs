//! Device population and pairwise propagation rule
//!
//! The network owns the device collection and the issuer, keeps the
//! simulation-wide exchange counters, and applies the freshness propagation
//! rule to one pair of devices at a time. Iteration order over the
//! population carries no meaning; the engine reshuffles it between pairings
//! to keep selection fair.

use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::trace;

use crate::error::{SimulationError, SimulationResult};
use crate::issuer::{GenerationTimings, Issuer};
use crate::types::{Device, DeviceClass, DeviceId, Freshness};

/// What happened when two devices interacted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// Neither side could teach the other anything
    Skipped,
    /// One side held a fresh accumulator value and passed it on
    AccumulatorExchanged {
        /// A fresh witness travelled along with the accumulator value
        /// (requires a Normal participant)
        witness_refreshed: bool,
    },
}

/// A population of devices and their issuer
#[derive(Debug)]
pub struct Network {
    devices: Vec<Device>,
    issuer: Issuer,
    accumulator_exchanges: u64,
    witness_exchanges: u64,
}

impl Network {
    /// Build a population of `device_count` devices, of which
    /// `missing_count` are unreachable by the issuer's broadcast channel.
    ///
    /// Broadcast-reachable devices are all Normal; devices prone to missing
    /// updates are randomly Normal or Constrained. The population is
    /// shuffled once after construction so the missing devices are not
    /// clustered at the front.
    pub fn new<R: Rng + ?Sized>(
        device_count: usize,
        missing_count: usize,
        rng: &mut R,
    ) -> SimulationResult<Self> {
        if device_count == 0 {
            return Err(SimulationError::PreconditionViolation(
                "population must contain at least one device".to_string(),
            ));
        }
        if missing_count > device_count {
            return Err(SimulationError::PreconditionViolation(format!(
                "{missing_count} devices missing updates in a population of {device_count}"
            )));
        }

        let mut devices = Vec::with_capacity(device_count);
        for i in 0..device_count {
            let missing = i < missing_count;
            let class = if missing && rng.random::<bool>() {
                DeviceClass::Constrained
            } else {
                DeviceClass::Normal
            };
            devices.push(Device::new(DeviceId(i as u32), class, missing));
        }
        devices.shuffle(rng);

        let mut issuer = Issuer::new(rng);
        issuer.issue_initial_set(&devices);

        Ok(Self {
            devices,
            issuer,
            accumulator_exchanges: 0,
            witness_exchanges: 0,
        })
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub(crate) fn devices_mut(&mut self) -> &mut [Device] {
        &mut self.devices
    }

    pub fn issuer(&self) -> &Issuer {
        &self.issuer
    }

    /// Unbiased in-place reshuffle of the population order
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.devices.shuffle(rng);
    }

    /// Zero every device's hourly interaction counter
    pub fn reset_hourly_interactions(&mut self) {
        for device in &mut self.devices {
            device.reset_hourly_interactions();
        }
    }

    /// Build the issuer's accumulator and first witness batch
    pub fn generate_accumulator(&mut self) -> SimulationResult<GenerationTimings> {
        self.issuer.generate_accumulator()
    }

    /// Revoke a batch of credentials; marks the whole population stale
    pub fn revoke_batch<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        rng: &mut R,
    ) -> SimulationResult<Duration> {
        let Self { devices, issuer, .. } = self;
        issuer.revoke_batch(devices, count, rng)
    }

    /// Broadcast the current state to every broadcast-reachable device
    pub fn push_updates(&mut self) -> (usize, usize) {
        let Self { devices, issuer, .. } = self;
        issuer.push_updates(devices)
    }

    /// First device in current iteration order with hourly budget remaining
    pub fn first_with_budget(&self, interactions_per_hour: u32) -> Option<usize> {
        self.devices
            .iter()
            .position(|d| d.has_hourly_budget(interactions_per_hour))
    }

    /// Interaction partner for `initiator`: the first other device, scanning
    /// from the back of the current order, with hourly budget remaining
    pub fn partner_for(&self, initiator: usize, interactions_per_hour: u32) -> Option<usize> {
        self.devices
            .iter()
            .enumerate()
            .rev()
            .find(|(i, d)| *i != initiator && d.has_hourly_budget(interactions_per_hour))
            .map(|(i, _)| i)
    }

    /// Run one pairwise interaction and apply the propagation rule.
    ///
    /// Freshness spreads only when exactly one side holds a fresh
    /// accumulator value. The receiver always takes the accumulator; the
    /// witness refresh piggybacks on the same exchange, and only when a
    /// Normal device takes part. A witness is never refreshed on its own.
    pub fn pair_interact(&mut self, a: usize, b: usize) -> PairOutcome {
        debug_assert_ne!(a, b, "device cannot interact with itself");
        self.devices[a].record_interaction();
        self.devices[b].record_interaction();

        let a_fresh = self.devices[a].accumulator.is_fresh();
        let b_fresh = self.devices[b].accumulator.is_fresh();
        if a_fresh == b_fresh {
            return PairOutcome::Skipped;
        }

        self.devices[a].accumulator = Freshness::Fresh;
        self.devices[b].accumulator = Freshness::Fresh;
        self.accumulator_exchanges += 1;

        let witness_refreshed = self.devices[a].class == DeviceClass::Normal
            || self.devices[b].class == DeviceClass::Normal;
        if witness_refreshed {
            self.devices[a].witness = Freshness::Fresh;
            self.devices[b].witness = Freshness::Fresh;
            self.witness_exchanges += 1;
        }

        let (donor, receiver) = if a_fresh { (a, b) } else { (b, a) };
        trace!(
            from = %self.devices[donor].id,
            to = %self.devices[receiver].id,
            witness_refreshed,
            "accumulator exchanged"
        );
        PairOutcome::AccumulatorExchanged { witness_refreshed }
    }

    /// Every device holds a fresh accumulator value and a fresh witness
    pub fn is_fully_updated(&self) -> bool {
        self.devices.iter().all(Device::is_fully_fresh)
    }

    /// No device holds both a fresh accumulator value and a fresh witness
    pub fn is_fully_stale(&self) -> bool {
        !self.devices.iter().any(Device::is_fully_fresh)
    }

    /// Sum of every device's lifetime interaction counter
    pub fn total_interactions(&self) -> u64 {
        self.devices.iter().map(|d| d.interactions_total).sum()
    }

    pub fn accumulator_exchanges(&self) -> u64 {
        self.accumulator_exchanges
    }

    pub fn witness_exchanges(&self) -> u64 {
        self.witness_exchanges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn network(devices: usize, missing: usize, seed: u64) -> (Network, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let network = Network::new(devices, missing, &mut rng).unwrap();
        (network, rng)
    }

    #[test]
    fn test_empty_population_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            Network::new(0, 0, &mut rng),
            Err(SimulationError::PreconditionViolation(_))
        ));
        assert!(matches!(
            Network::new(3, 4, &mut rng),
            Err(SimulationError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_population_composition() {
        let (network, _) = network(100, 30, 1);
        assert_eq!(network.device_count(), 100);
        let missing = network.devices().iter().filter(|d| d.missing_updates).count();
        assert_eq!(missing, 30);
        // Broadcast-reachable devices are always Normal
        assert!(
            network
                .devices()
                .iter()
                .filter(|d| !d.missing_updates)
                .all(|d| d.class == DeviceClass::Normal)
        );
        // Fresh population starts fully updated
        assert!(network.is_fully_updated());
        assert!(!network.is_fully_stale());
    }

    #[test]
    fn test_pair_skips_when_freshness_matches() {
        let (mut network, _) = network(4, 0, 2);
        assert_eq!(network.pair_interact(0, 1), PairOutcome::Skipped);
        assert_eq!(network.accumulator_exchanges(), 0);
        // Counters still advance on a skipped pairing
        assert_eq!(network.devices()[0].interactions_this_hour, 1);
        assert_eq!(network.devices()[1].interactions_total, 1);
        assert_eq!(network.total_interactions(), 2);
    }

    #[test]
    fn test_pair_propagates_accumulator_and_witness() {
        let (mut network, _) = network(2, 0, 3);
        network.devices_mut()[1].accumulator = Freshness::Stale;
        network.devices_mut()[1].witness = Freshness::Stale;

        let outcome = network.pair_interact(0, 1);
        assert_eq!(
            outcome,
            PairOutcome::AccumulatorExchanged { witness_refreshed: true }
        );
        assert!(network.is_fully_updated());
        assert_eq!(network.accumulator_exchanges(), 1);
        assert_eq!(network.witness_exchanges(), 1);
    }

    #[test]
    fn test_constrained_pair_cannot_refresh_witness() {
        let (mut network, _) = network(2, 0, 4);
        for device in network.devices_mut() {
            device.class = DeviceClass::Constrained;
        }
        network.devices_mut()[0].accumulator = Freshness::Stale;
        network.devices_mut()[0].witness = Freshness::Stale;
        network.devices_mut()[1].witness = Freshness::Stale;

        let outcome = network.pair_interact(0, 1);
        assert_eq!(
            outcome,
            PairOutcome::AccumulatorExchanged { witness_refreshed: false }
        );
        assert!(network.devices()[0].accumulator.is_fresh());
        assert!(!network.devices()[0].witness.is_fresh());
        assert_eq!(network.witness_exchanges(), 0);
    }

    #[test]
    fn test_budget_scans() {
        let (mut network, _) = network(3, 0, 5);
        assert_eq!(network.first_with_budget(1), Some(0));
        assert_eq!(network.partner_for(0, 1), Some(2));

        network.pair_interact(0, 2);
        assert_eq!(network.first_with_budget(1), Some(1));
        // Only device 1 has budget left, so it cannot find a partner
        assert_eq!(network.partner_for(1, 1), None);

        network.reset_hourly_interactions();
        assert_eq!(network.first_with_budget(1), Some(0));
    }

    #[test]
    fn test_counters_are_monotonic_over_a_revocation_cycle() {
        let (mut network, mut rng) = network(20, 5, 6);
        network.generate_accumulator().unwrap();
        network.revoke_batch(2, &mut rng).unwrap();
        assert!(network.is_fully_stale());

        network.push_updates();
        let mut last_acc = 0;
        let mut last_wit = 0;
        for _ in 0..50 {
            network.reset_hourly_interactions();
            while let (Some(a), Some(b)) = (
                network.first_with_budget(2),
                network.first_with_budget(2).and_then(|a| network.partner_for(a, 2)),
            ) {
                network.pair_interact(a, b);
                assert!(network.accumulator_exchanges() >= last_acc);
                assert!(network.witness_exchanges() >= last_wit);
                last_acc = network.accumulator_exchanges();
                last_wit = network.witness_exchanges();
            }
            network.shuffle(&mut rng);
        }
        // A witness exchange only ever rides on an accumulator exchange
        assert!(network.witness_exchanges() <= network.accumulator_exchanges());
    }
}
