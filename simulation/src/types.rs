//! Core types for the revmesh propagation simulation
//!
//! Models a population of credential-holding devices whose local copies of
//! the issuer's accumulator value and membership witness go stale whenever a
//! revocation batch lands, and become fresh again through issuer broadcast or
//! peer gossip.

use serde::{Deserialize, Serialize};

/// Unique ordinal identifier for a device, assigned at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub u32);

impl DeviceId {
    /// Stable byte encoding used to derive the device's accumulator element
    pub fn to_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Device capability class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceClass {
    /// Full device: can refresh both its accumulator copy and its witness
    Normal,
    /// Constrained device: can relay a fresh accumulator value but cannot
    /// complete a witness exchange without a Normal peer
    Constrained,
}

/// Whether a device's local copy matches the issuer's current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Freshness {
    Fresh,
    Stale,
}

impl Freshness {
    pub fn is_fresh(self) -> bool {
        matches!(self, Self::Fresh)
    }
}

/// Credential lifecycle state, set once by the issuer at revocation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
    Valid,
    Revoked,
}

/// State record for one device in the population
#[derive(Debug, Clone)]
pub struct Device {
    pub id: DeviceId,
    pub class: DeviceClass,
    /// Device cannot be reached by the issuer's broadcast channel and relies
    /// entirely on peer gossip. Fixed at creation.
    pub missing_updates: bool,
    pub accumulator: Freshness,
    pub witness: Freshness,
    pub credential: CredentialStatus,
    pub interactions_this_hour: u32,
    pub interactions_total: u64,
    pub selection_count: u64,
}

impl Device {
    /// Create a device holding current state and a valid credential
    pub fn new(id: DeviceId, class: DeviceClass, missing_updates: bool) -> Self {
        Self {
            id,
            class,
            missing_updates,
            accumulator: Freshness::Fresh,
            witness: Freshness::Fresh,
            credential: CredentialStatus::Valid,
            interactions_this_hour: 0,
            interactions_total: 0,
            selection_count: 0,
        }
    }

    /// Reset the hourly interaction counter at the start of a round
    pub fn reset_hourly_interactions(&mut self) {
        self.interactions_this_hour = 0;
    }

    /// Record that this device was selected for a pairwise interaction
    pub fn record_interaction(&mut self) {
        self.interactions_this_hour += 1;
        self.interactions_total += 1;
        self.selection_count += 1;
    }

    /// Both the accumulator copy and the witness are current
    pub fn is_fully_fresh(&self) -> bool {
        self.accumulator.is_fresh() && self.witness.is_fresh()
    }

    /// Remaining pairwise budget for the current hour
    pub fn has_hourly_budget(&self, interactions_per_hour: u32) -> bool {
        self.interactions_this_hour < interactions_per_hour
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_device_is_fresh_and_valid() {
        let device = Device::new(DeviceId(3), DeviceClass::Normal, false);
        assert!(device.is_fully_fresh());
        assert_eq!(device.credential, CredentialStatus::Valid);
        assert_eq!(device.interactions_total, 0);
    }

    #[test]
    fn test_record_interaction_bumps_all_counters() {
        let mut device = Device::new(DeviceId(0), DeviceClass::Constrained, true);
        device.record_interaction();
        device.record_interaction();
        assert_eq!(device.interactions_this_hour, 2);
        assert_eq!(device.interactions_total, 2);
        assert_eq!(device.selection_count, 2);

        device.reset_hourly_interactions();
        assert_eq!(device.interactions_this_hour, 0);
        // Lifetime counters survive the hourly reset
        assert_eq!(device.interactions_total, 2);
    }

    #[test]
    fn test_hourly_budget() {
        let mut device = Device::new(DeviceId(0), DeviceClass::Normal, false);
        assert!(device.has_hourly_budget(1));
        device.record_interaction();
        assert!(!device.has_hourly_budget(1));
        assert!(device.has_hourly_budget(5));
    }
}
