//! Pre-defined simulation scenarios
//!
//! Canonical runs used as executable documentation and as regression
//! anchors: broadcast-only convergence, gossip convergence bounds, a starved
//! interaction budget, and a revocation-day walkthrough.

use tracing::info;

use crate::error::SimulationResult;
use crate::simulation::{SimConfig, Simulation};

fn print_summary(sim: &Simulation) {
    let stats = sim.stats();
    println!("\n=== Run Summary ===");
    println!("  Devices: {}", sim.config().device_count);
    println!("  Missing updates: {}", sim.config().missing_updates);
    println!("  Accumulator exchanges: {}", stats.accumulator_exchanges);
    println!("  Witness exchanges: {}", stats.witness_exchanges);
    println!("  Devices updated by gossip: {}", stats.devices_updated);
    println!("  Total interactions: {}", stats.total_interactions);
    println!("  Fully updated: {}", sim.network().is_fully_updated());
}

/// Every device is reachable by broadcast, so the population converges
/// before any gossip happens and the interaction rounds exchange nothing.
pub fn run_broadcast_scenario() -> SimulationResult<Simulation> {
    info!("=== Broadcast-only scenario ===");
    let mut sim = Simulation::new(SimConfig {
        device_count: 100,
        missing_updates: 0,
        revocations_per_day: 3,
        seed: Some(101),
        ..Default::default()
    })?;
    sim.run()?;
    print_summary(&sim);
    Ok(sim)
}

/// A third of the population misses the broadcast and must be reached by
/// gossip. With the default budget the missing devices pick up the fresh
/// accumulator value within the day.
pub fn run_gossip_scenario() -> SimulationResult<Simulation> {
    info!("=== Gossip propagation scenario ===");
    let mut sim = Simulation::new(SimConfig {
        device_count: 100,
        missing_updates: 30,
        revocations_per_day: 3,
        seed: Some(202),
        ..Default::default()
    })?;
    sim.run()?;
    print_summary(&sim);
    Ok(sim)
}

/// Half the population misses the broadcast and the budget allows a single
/// interaction per device in a single hour: far too little to converge.
pub fn run_starved_scenario() -> SimulationResult<Simulation> {
    info!("=== Starved budget scenario ===");
    let mut sim = Simulation::new(SimConfig {
        device_count: 100,
        missing_updates: 50,
        interactions_per_hour: 1,
        interactions_per_day: 1,
        revocations_per_day: 3,
        seed: Some(303),
        ..Default::default()
    })?;
    sim.run()?;
    print_summary(&sim);
    Ok(sim)
}

/// A revocation day at population scale, without gossip: 28 of 1000
/// credentials are revoked, the witness table is rebuilt for the 972
/// survivors, and the broadcast re-freshens everyone.
pub fn run_revocation_scenario() -> SimulationResult<Simulation> {
    info!("=== Revocation walkthrough scenario ===");
    let mut sim = Simulation::new(SimConfig {
        device_count: 1000,
        missing_updates: 0,
        interactions_per_day: 0,
        revocations_per_day: 28,
        seed: Some(404),
        ..Default::default()
    })?;
    sim.run()?;

    let issuer = sim.network().issuer();
    println!("\n=== Issuer state ===");
    println!("  Live members: {}", issuer.live_member_count());
    println!("  Witnesses: {}", issuer.witness_count());
    print_summary(&sim);
    Ok(sim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CredentialStatus;

    #[test]
    fn test_broadcast_scenario_converges_without_gossip() {
        let sim = run_broadcast_scenario().unwrap();
        assert!(sim.network().is_fully_updated());
        // Nothing left to propagate, so the rounds exchange nothing
        assert_eq!(sim.stats().accumulator_exchanges, 0);
        assert_eq!(sim.stats().witness_exchanges, 0);
    }

    #[test]
    fn test_gossip_scenario_respects_exchange_bounds() {
        let sim = run_gossip_scenario().unwrap();
        let stats = sim.stats();
        // Each exchange refreshes exactly one of the 30 stale devices
        assert!(stats.accumulator_exchanges <= 30);
        assert!(stats.witness_exchanges <= stats.accumulator_exchanges);
        assert!(!sim.network().is_fully_stale());
        // Every device that gained a witness gained the accumulator with it
        for device in sim.network().devices() {
            assert!(!device.witness.is_fresh() || device.accumulator.is_fresh());
        }
    }

    #[test]
    fn test_starved_scenario_cannot_converge() {
        let sim = run_starved_scenario().unwrap();
        assert!(!sim.network().is_fully_updated());
        // 100 devices with budget 1 allow at most 50 pairings
        assert!(sim.stats().accumulator_exchanges <= 50);
        assert!(sim.stats().total_interactions <= 100);
    }

    #[test]
    fn test_revocation_scenario_rebuilds_witnesses() {
        let sim = run_revocation_scenario().unwrap();
        let issuer = sim.network().issuer();
        assert_eq!(issuer.live_member_count(), 972);
        assert_eq!(issuer.witness_count(), 972);

        let revoked = sim
            .network()
            .devices()
            .iter()
            .filter(|d| d.credential == CredentialStatus::Revoked)
            .count();
        assert_eq!(revoked, 28);
        // Broadcast reaches the whole population, revoked devices included
        assert!(sim.network().is_fully_updated());
    }
}
