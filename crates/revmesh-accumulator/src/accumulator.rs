//! Positive accumulator with batch updates and membership witnesses
//!
//! The accumulator value is a keyed digest of the current member set, so any
//! batch addition or removal changes the value and silently invalidates every
//! witness issued against the previous value. Witnesses are recomputed per
//! batch with [`Accumulator::witnesses_for_batch`] and checked against the
//! current value with [`Accumulator::verify_membership`].
//!
//! This is a simulation-grade construction: it reproduces the lifecycle of a
//! positive accumulator (value changes on membership change, witnesses bind
//! to one value) without offering any real cryptographic guarantees.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::error::{AccumulatorError, AccumulatorResult};

const PUBLIC_KEY_CONTEXT: &str = "revmesh-accumulator v1 public key";

/// Public parameters binding an accumulator to one deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    seed: [u8; 32],
}

impl Params {
    /// Generate fresh random parameters
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        Self { seed }
    }
}

/// Accumulator secret key, held by the issuing party only
#[derive(Debug, Clone)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    fn is_valid(&self) -> bool {
        self.0 != [0u8; 32]
    }
}

/// Public counterpart of the secret key, used for witness verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey([u8; 32]);

impl PublicKey {
    fn from_secret(sk: &SecretKey) -> Self {
        Self(blake3::derive_key(PUBLIC_KEY_CONTEXT, &sk.0))
    }
}

/// Generate an accumulator keypair
pub fn generate_keypair<R: Rng + ?Sized>(rng: &mut R) -> (SecretKey, PublicKey) {
    let mut bytes = [0u8; 32];
    rng.fill_bytes(&mut bytes);
    let sk = SecretKey(bytes);
    let pk = PublicKey::from_secret(&sk);
    (sk, pk)
}

/// Membership witness bound to one accumulator value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness([u8; 32]);

impl std::fmt::Display for Witness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// A positive accumulator over a set of encoded elements
#[derive(Debug, Clone)]
pub struct Accumulator {
    params: Params,
    members: BTreeSet<Element>,
    value: [u8; 32],
}

impl Accumulator {
    /// Initialize an empty accumulator for the given parameters
    pub fn initialize(params: Params) -> Self {
        let mut acc = Self {
            params,
            members: BTreeSet::new(),
            value: [0u8; 32],
        };
        acc.recompute_value();
        acc
    }

    /// Current accumulator value
    pub fn value(&self) -> [u8; 32] {
        self.value
    }

    /// Number of current members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, element: &Element) -> bool {
        self.members.contains(element)
    }

    /// Add a batch of elements, updating the accumulator value.
    ///
    /// The whole batch is validated before any element is inserted: a
    /// duplicate member or an invalid key leaves the accumulator unchanged.
    pub fn add_batch(&mut self, elements: &[Element], sk: &SecretKey) -> AccumulatorResult<()> {
        if !sk.is_valid() {
            return Err(AccumulatorError::InvalidKey);
        }
        for element in elements {
            if self.members.contains(element) {
                return Err(AccumulatorError::ElementAlreadyMember(element.short_hex()));
            }
        }

        self.members.extend(elements.iter().copied());
        self.recompute_value();
        Ok(())
    }

    /// Remove a batch of elements, updating the accumulator value.
    ///
    /// Every element must currently be a member; the batch is validated
    /// before any removal so a failure leaves the accumulator unchanged.
    pub fn remove_batch(&mut self, elements: &[Element], sk: &SecretKey) -> AccumulatorResult<()> {
        if !sk.is_valid() {
            return Err(AccumulatorError::InvalidKey);
        }
        for element in elements {
            if !self.members.contains(element) {
                return Err(AccumulatorError::ElementNotMember(element.short_hex()));
            }
        }

        for element in elements {
            self.members.remove(element);
        }
        self.recompute_value();
        Ok(())
    }

    /// Compute membership witnesses for a batch of current members.
    ///
    /// Witnesses bind to the accumulator value at the time of the call; any
    /// later batch change invalidates them.
    pub fn witnesses_for_batch(
        &self,
        elements: &[Element],
        sk: &SecretKey,
    ) -> AccumulatorResult<BTreeMap<Element, Witness>> {
        if !sk.is_valid() {
            return Err(AccumulatorError::InvalidKey);
        }
        let pk = PublicKey::from_secret(sk);

        let mut witnesses = BTreeMap::new();
        for element in elements {
            if !self.members.contains(element) {
                return Err(AccumulatorError::ElementNotMember(element.short_hex()));
            }
            witnesses.insert(*element, self.witness_digest(&pk, element));
        }
        Ok(witnesses)
    }

    /// Check a membership witness against the current accumulator value
    pub fn verify_membership(&self, element: &Element, witness: &Witness, pk: &PublicKey) -> bool {
        self.witness_digest(pk, element) == *witness
    }

    fn witness_digest(&self, pk: &PublicKey, element: &Element) -> Witness {
        let mut hasher = blake3::Hasher::new_keyed(&pk.0);
        hasher.update(&self.value);
        hasher.update(element.as_bytes());
        Witness(*hasher.finalize().as_bytes())
    }

    // The value is a keyed digest of the ordered member set, so it is a pure
    // function of (params, members) and changes on every membership change.
    fn recompute_value(&mut self) {
        let mut hasher = blake3::Hasher::new_keyed(&self.params.seed);
        for member in &self.members {
            hasher.update(member.as_bytes());
        }
        self.value = *hasher.finalize().as_bytes();
    }
}
