//! # Revmesh Accumulator
//!
//! Simulation-grade positive accumulator for credential revocation studies.
//!
//! Provides the capability surface a revocation issuer needs:
//!
//! - [`Params`] and [`generate_keypair`]: deployment parameters and keys
//! - [`Accumulator`]: batch addition and removal of encoded members
//! - [`Accumulator::witnesses_for_batch`]: per-member membership witnesses
//! - [`Accumulator::verify_membership`]: witness verification against the
//!   current accumulator value
//!
//! The construction mirrors the lifecycle of a real positive accumulator
//! (every batch change produces a new value and invalidates all previously
//! issued witnesses) without providing cryptographic security. It exists so
//! propagation simulations exercise realistic revocation mechanics, not to
//! protect anything.
//!
//! ## Example
//!
//! ```rust,ignore
//! use revmesh_accumulator::{Accumulator, Element, Params, generate_keypair};
//!
//! let mut rng = rand::rng();
//! let params = Params::generate(&mut rng);
//! let (sk, pk) = generate_keypair(&mut rng);
//!
//! let members: Vec<Element> =
//!     (0u32..100).map(|i| Element::encode(&i.to_le_bytes())).collect();
//!
//! let mut acc = Accumulator::initialize(params);
//! acc.add_batch(&members, &sk)?;
//! let witnesses = acc.witnesses_for_batch(&members, &sk)?;
//! assert!(acc.verify_membership(&members[0], &witnesses[&members[0]], &pk));
//!
//! // Revoking one member invalidates every outstanding witness
//! acc.remove_batch(&members[..1], &sk)?;
//! assert!(!acc.verify_membership(&members[1], &witnesses[&members[1]], &pk));
//! ```

pub mod accumulator;
pub mod element;
pub mod error;

// Re-exports
pub use accumulator::{Accumulator, Params, PublicKey, SecretKey, Witness, generate_keypair};
pub use element::Element;
pub use error::{AccumulatorError, AccumulatorResult};
