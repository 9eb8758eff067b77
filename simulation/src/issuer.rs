//! Credential issuer and revocation authority
//!
//! The issuer owns the authoritative accumulator and its secret key. It
//! issues one accumulator member per device, revokes batches of credentials
//! (which changes the accumulator value and invalidates every outstanding
//! witness), rebuilds the witness table after each batch, and pushes direct
//! broadcast updates to every device that can receive them.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use revmesh_accumulator::{
    Accumulator, Element, Params, PublicKey, SecretKey, Witness, generate_keypair,
};

use crate::error::{SimulationError, SimulationResult};
use crate::types::{CredentialStatus, Device, DeviceId, Freshness};

/// Elapsed time of the two accumulator generation phases
#[derive(Debug, Clone, Copy)]
pub struct GenerationTimings {
    /// Time spent adding the member batch to the accumulator
    pub accumulator: Duration,
    /// Time spent computing the witness batch
    pub witnesses: Duration,
}

/// The credential issuer for one simulation run
#[derive(Debug)]
pub struct Issuer {
    params: Params,
    secret_key: SecretKey,
    public_key: PublicKey,
    accumulator: Option<Accumulator>,
    /// Element issued to each device, keyed by immutable device id so the
    /// population can be reshuffled freely without desynchronizing
    issued: BTreeMap<DeviceId, Element>,
    /// Members currently included in the accumulator; shrinks monotonically
    live_members: BTreeSet<Element>,
    /// Current witness per live member, rebuilt in full after every batch
    witness_table: BTreeMap<Element, Witness>,
}

impl Issuer {
    /// Create an issuer with fresh parameters and a fresh keypair
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let params = Params::generate(rng);
        let (secret_key, public_key) = generate_keypair(rng);
        Self {
            params,
            secret_key,
            public_key,
            accumulator: None,
            issued: BTreeMap::new(),
            live_members: BTreeSet::new(),
            witness_table: BTreeMap::new(),
        }
    }

    /// Issue one valid credential per device.
    ///
    /// Must be called before [`Issuer::generate_accumulator`].
    pub fn issue_initial_set(&mut self, devices: &[Device]) {
        self.issued.clear();
        self.live_members.clear();
        for device in devices {
            let element = Element::encode(&device.id.to_bytes());
            self.issued.insert(device.id, element);
            self.live_members.insert(element);
        }
        debug!(issued = self.issued.len(), "initial credential set issued");
    }

    /// Build the accumulator over the live member set and compute the first
    /// witness batch. Returns per-phase timings for overhead measurements.
    pub fn generate_accumulator(&mut self) -> SimulationResult<GenerationTimings> {
        if self.issued.is_empty() {
            return Err(SimulationError::PreconditionViolation(
                "no credentials issued before accumulator generation".to_string(),
            ));
        }

        let live: Vec<Element> = self.live_members.iter().copied().collect();
        let mut accumulator = Accumulator::initialize(self.params);

        let start = Instant::now();
        accumulator.add_batch(&live, &self.secret_key)?;
        let accumulator_elapsed = start.elapsed();

        let start = Instant::now();
        self.witness_table = accumulator.witnesses_for_batch(&live, &self.secret_key)?;
        let witnesses_elapsed = start.elapsed();

        self.accumulator = Some(accumulator);
        debug!(
            members = live.len(),
            ?accumulator_elapsed,
            ?witnesses_elapsed,
            "accumulator generated"
        );
        Ok(GenerationTimings {
            accumulator: accumulator_elapsed,
            witnesses: witnesses_elapsed,
        })
    }

    /// Revoke `count` distinct valid credentials chosen uniformly at random.
    ///
    /// Removes the victims' elements from the accumulator in one batch,
    /// rebuilds the witness table for the surviving members, and marks every
    /// device's accumulator copy and witness stale: a batch change invalidates
    /// the globally shared value, not just the victims' witnesses.
    ///
    /// Fails fast with a precondition violation, touching nothing, when
    /// `count` exceeds the number of currently valid devices.
    pub fn revoke_batch<R: Rng + ?Sized>(
        &mut self,
        devices: &mut [Device],
        count: usize,
        rng: &mut R,
    ) -> SimulationResult<Duration> {
        let mut valid_indices: Vec<usize> = devices
            .iter()
            .enumerate()
            .filter(|(_, d)| d.credential == CredentialStatus::Valid)
            .map(|(i, _)| i)
            .collect();
        if count > valid_indices.len() {
            return Err(SimulationError::PreconditionViolation(format!(
                "cannot revoke {count} credentials, only {} valid",
                valid_indices.len()
            )));
        }

        let (chosen, _) = valid_indices.partial_shuffle(rng, count);
        let mut removed = Vec::with_capacity(count);
        for &index in chosen.iter() {
            let element = self.issued.get(&devices[index].id).copied().ok_or_else(|| {
                SimulationError::InvariantViolation(format!(
                    "valid device {} has no issued element",
                    devices[index].id
                ))
            })?;
            removed.push(element);
        }

        let Self {
            accumulator,
            live_members,
            witness_table,
            secret_key,
            ..
        } = self;
        let Some(accumulator) = accumulator.as_mut() else {
            return Err(SimulationError::PreconditionViolation(
                "revocation before accumulator generation".to_string(),
            ));
        };

        let start = Instant::now();
        accumulator.remove_batch(&removed, secret_key)?;
        for element in &removed {
            live_members.remove(element);
        }
        let live: Vec<Element> = live_members.iter().copied().collect();
        *witness_table = accumulator.witnesses_for_batch(&live, secret_key)?;
        let elapsed = start.elapsed();

        for &index in chosen.iter() {
            devices[index].credential = CredentialStatus::Revoked;
        }
        for device in devices.iter_mut() {
            device.accumulator = Freshness::Stale;
            device.witness = Freshness::Stale;
        }

        info!(
            revoked = count,
            live = self.live_members.len(),
            ?elapsed,
            "revocation batch applied"
        );
        Ok(elapsed)
    }

    /// Push the current accumulator state over the direct broadcast channel.
    ///
    /// Devices reachable by broadcast become fresh on both flags; devices
    /// prone to missing updates are left as they are and must rely on peer
    /// gossip. Returns `(updated, missing)` counts.
    pub fn push_updates(&self, devices: &mut [Device]) -> (usize, usize) {
        let mut updated = 0;
        let mut missing = 0;
        for device in devices.iter_mut() {
            if device.missing_updates {
                missing += 1;
            } else {
                device.accumulator = Freshness::Fresh;
                device.witness = Freshness::Fresh;
                updated += 1;
            }
        }
        info!(updated, missing, "issuer broadcast sent");
        (updated, missing)
    }

    /// Number of members currently included in the accumulator
    pub fn live_member_count(&self) -> usize {
        self.live_members.len()
    }

    /// Number of witnesses in the current table
    pub fn witness_count(&self) -> usize {
        self.witness_table.len()
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Current witness for a device's credential, if it is still live
    pub fn witness_for(&self, device: &Device) -> Option<&Witness> {
        let element = self.issued.get(&device.id)?;
        self.witness_table.get(element)
    }

    /// Verify a device's current witness against the accumulator value
    pub fn verify_device(&self, device: &Device) -> bool {
        let Some(accumulator) = self.accumulator.as_ref() else {
            return false;
        };
        let Some(element) = self.issued.get(&device.id) else {
            return false;
        };
        match self.witness_table.get(element) {
            Some(witness) => accumulator.verify_membership(element, witness, &self.public_key),
            None => false,
        }
    }
}
