//! End-to-end propagation properties checked over whole runs
//!
//! These exercise the population through full revocation/broadcast/gossip
//! cycles and pin down the behaviors the pairwise rule must preserve.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::SimulationError;
use crate::network::Network;
use crate::simulation::{SimConfig, Simulation};
use crate::types::{CredentialStatus, DeviceClass};

#[test]
fn broadcast_freshens_exactly_the_reachable_devices() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut network = Network::new(10, 4, &mut rng).unwrap();
    network.generate_accumulator().unwrap();

    // A zero-size batch still stales the whole population
    network.revoke_batch(0, &mut rng).unwrap();
    assert!(network.is_fully_stale());

    network.push_updates();
    for device in network.devices() {
        assert_eq!(device.accumulator.is_fresh(), !device.missing_updates);
        assert_eq!(device.witness.is_fresh(), !device.missing_updates);
    }
}

#[test]
fn revocation_shrinks_live_set_and_stales_population() {
    let mut rng = StdRng::seed_from_u64(12);
    let mut network = Network::new(50, 10, &mut rng).unwrap();
    network.generate_accumulator().unwrap();

    network.revoke_batch(7, &mut rng).unwrap();
    assert_eq!(network.issuer().live_member_count(), 43);
    assert_eq!(network.issuer().witness_count(), 43);
    assert!(network.is_fully_stale());

    let revoked = network
        .devices()
        .iter()
        .filter(|d| d.credential == CredentialStatus::Revoked)
        .count();
    assert_eq!(revoked, 7);
}

#[test]
fn infeasible_revocation_leaves_state_untouched() {
    let mut rng = StdRng::seed_from_u64(13);
    let mut network = Network::new(5, 0, &mut rng).unwrap();
    network.generate_accumulator().unwrap();

    let err = network.revoke_batch(6, &mut rng).unwrap_err();
    assert!(matches!(err, SimulationError::PreconditionViolation(_)));
    assert_eq!(network.issuer().live_member_count(), 5);
    assert!(network.is_fully_updated());
    assert!(
        network
            .devices()
            .iter()
            .all(|d| d.credential == CredentialStatus::Valid)
    );
}

#[test]
fn witness_freshness_implies_accumulator_freshness_at_every_step() {
    let mut rng = StdRng::seed_from_u64(14);
    let mut network = Network::new(30, 15, &mut rng).unwrap();
    network.generate_accumulator().unwrap();
    network.revoke_batch(1, &mut rng).unwrap();
    network.push_updates();

    // Force a constrained-heavy population so accumulator values routinely
    // travel without witnesses, then check the implication after every
    // single pairing, not just at the end of the run.
    for device in network.devices_mut().iter_mut().step_by(2) {
        device.class = DeviceClass::Constrained;
    }

    for _ in 0..40 {
        network.reset_hourly_interactions();
        network.shuffle(&mut rng);
        while let Some(a) = network.first_with_budget(2) {
            let Some(b) = network.partner_for(a, 2) else {
                break;
            };
            network.pair_interact(a, b);
            for device in network.devices() {
                assert!(
                    !device.witness.is_fresh() || device.accumulator.is_fresh(),
                    "device {} holds a fresh witness over a stale accumulator",
                    device.id
                );
            }
            network.shuffle(&mut rng);
        }
    }
}

#[test]
fn full_budget_with_full_broadcast_converges_in_one_day() {
    let mut sim = Simulation::new(SimConfig {
        device_count: 100,
        missing_updates: 0,
        interactions_per_hour: 5,
        interactions_per_day: 600,
        revocations_per_day: 5,
        seed: Some(15),
        ..Default::default()
    })
    .unwrap();
    let reports = sim.run().unwrap();
    assert!(reports[0].converged);
    assert!(sim.network().is_fully_updated());
}

#[test]
fn starved_budget_with_half_missing_cannot_converge() {
    let mut sim = Simulation::new(SimConfig {
        device_count: 100,
        missing_updates: 50,
        interactions_per_hour: 1,
        interactions_per_day: 1,
        revocations_per_day: 1,
        seed: Some(16),
        ..Default::default()
    })
    .unwrap();
    let reports = sim.run().unwrap();
    assert!(!reports[0].converged);
    assert!(reports[0].accumulator_exchanges <= 50);
}

#[test]
fn gossip_reaches_missing_devices_in_a_small_population() {
    // 3 devices, 1 missing: over fifteen hours of rounds the missing device
    // meets a broadcast-reachable Normal device, which hands over both the
    // accumulator value and a witness in a single exchange.
    let mut sim = Simulation::new(SimConfig {
        device_count: 3,
        missing_updates: 1,
        interactions_per_hour: 2,
        interactions_per_day: 30,
        revocations_per_day: 1,
        seed: Some(17),
        ..Default::default()
    })
    .unwrap();
    sim.run().unwrap();
    assert!(sim.network().is_fully_updated());
    // Only one device was ever stale, so exactly one exchange fired
    assert_eq!(sim.stats().accumulator_exchanges, 1);
    assert_eq!(sim.stats().witness_exchanges, 1);
}
