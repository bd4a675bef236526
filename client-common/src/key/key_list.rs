//! Keys that authorize ledger operations: a single key or an m-of-n threshold list
use std::collections::BTreeSet;

use parity_scale_codec::Encode;
use serde::{Deserialize, Serialize};

use super::PublicKey;
use crate::{Error, ErrorKind, Result};

/// Key guarding an entity (account key, topic submit key, token admin/supply key)
#[derive(Debug, Clone, PartialEq, Eq, Encode, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// Requires a signature from exactly this key
    Single(PublicKey),
    /// Requires signatures from a quorum of the listed keys
    Threshold(ThresholdKey),
}

impl Key {
    /// Returns `true` if signatures from `signers` satisfy current key
    pub fn is_satisfied_by(&self, signers: &[PublicKey]) -> bool {
        match self {
            Key::Single(public_key) => signers.contains(public_key),
            Key::Threshold(threshold_key) => threshold_key.is_satisfied_by(signers),
        }
    }

    /// Returns all public keys referenced by current key
    pub fn public_keys(&self) -> Vec<PublicKey> {
        match self {
            Key::Single(public_key) => vec![*public_key],
            Key::Threshold(threshold_key) => threshold_key.keys().to_vec(),
        }
    }
}

impl From<PublicKey> for Key {
    fn from(public_key: PublicKey) -> Self {
        Key::Single(public_key)
    }
}

impl From<ThresholdKey> for Key {
    fn from(threshold_key: ThresholdKey) -> Self {
        Key::Threshold(threshold_key)
    }
}

/// m-of-n threshold key
#[derive(Debug, Clone, PartialEq, Eq, Encode, Serialize, Deserialize)]
#[serde(try_from = "RawThresholdKey")]
pub struct ThresholdKey {
    threshold: u32,
    keys: Vec<PublicKey>,
}

impl ThresholdKey {
    /// Creates a threshold key requiring `threshold` signatures out of `keys`
    pub fn new(threshold: u32, keys: Vec<PublicKey>) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Threshold key needs at least one public key",
            ));
        }

        if threshold == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Number of required signers cannot be zero",
            ));
        }

        if threshold as usize > keys.len() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "{} required signers exceed the {} keys of the list",
                    threshold,
                    keys.len()
                ),
            ));
        }

        let distinct = keys.iter().collect::<BTreeSet<_>>();
        if distinct.len() != keys.len() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Threshold key contains duplicate public keys",
            ));
        }

        Ok(ThresholdKey { threshold, keys })
    }

    /// Returns required number of signers
    #[inline]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Returns member public keys
    #[inline]
    pub fn keys(&self) -> &[PublicKey] {
        &self.keys
    }

    /// Returns `true` if at least `threshold` distinct members are among `signers`
    pub fn is_satisfied_by(&self, signers: &[PublicKey]) -> bool {
        let signed = self
            .keys
            .iter()
            .filter(|key| signers.contains(*key))
            .count();

        signed >= self.threshold as usize
    }
}

#[derive(Deserialize)]
struct RawThresholdKey {
    threshold: u32,
    keys: Vec<PublicKey>,
}

impl std::convert::TryFrom<RawThresholdKey> for ThresholdKey {
    type Error = Error;

    fn try_from(raw: RawThresholdKey) -> Result<Self> {
        ThresholdKey::new(raw.threshold, raw.keys)
    }
}
