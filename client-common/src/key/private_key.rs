use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signer, SigningKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use serde::de::{Deserialize, Deserializer, Error as SerdeDeError, Visitor};
use zeroize::Zeroize;

use super::{PublicKey, Signature, PRIVATE_KEY_DER_PREFIX};
use crate::{Error, ErrorKind, Result, ResultExt};

/// Ed25519 private key used to sign ledger transactions
///
/// Key material is wiped from memory when the key is dropped.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    /// Generates a new private key
    pub fn generate() -> PrivateKey {
        let mut rng = OsRng;
        PrivateKey(SigningKey::generate(&mut rng))
    }

    /// Deserializes private key from raw 32 bytes
    pub fn deserialize_from(bytes: &[u8]) -> Result<PrivateKey> {
        let secret = <[u8; SECRET_KEY_LENGTH]>::try_from(bytes).chain(|| {
            (
                ErrorKind::DeserializationError,
                format!(
                    "Private key must be {} bytes, found {}",
                    SECRET_KEY_LENGTH,
                    bytes.len()
                ),
            )
        })?;

        Ok(PrivateKey(SigningKey::from_bytes(&secret)))
    }

    /// Serializes current private key to raw 32 bytes
    pub fn serialize(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// Returns DER encoded private key as hex string
    pub fn to_der_string(&self) -> String {
        let mut bytes = self.serialize();
        let encoded = format!("{}{}", PRIVATE_KEY_DER_PREFIX, hex::encode(bytes));
        bytes.zeroize();
        encoded
    }

    /// Returns public key corresponding to current private key
    pub fn public_key(&self) -> PublicKey {
        PublicKey::from(self.0.verifying_key())
    }

    /// Signs a message with current private key
    pub fn sign<T: AsRef<[u8]>>(&self, message: T) -> Signature {
        self.0.sign(message.as_ref())
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.public_key() == other.public_key()
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrivateKey")
            .field(&self.public_key())
            .finish()
    }
}

impl From<&PrivateKey> for PublicKey {
    fn from(private_key: &PrivateKey) -> Self {
        private_key.public_key()
    }
}

impl FromStr for PrivateKey {
    type Err = Error;

    /// Parses a hex encoded key, either DER encoded or raw 32 bytes
    fn from_str(s: &str) -> Result<PrivateKey> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let raw = if s.len() == PRIVATE_KEY_DER_PREFIX.len() + 2 * SECRET_KEY_LENGTH {
            s.strip_prefix(PRIVATE_KEY_DER_PREFIX).chain(|| {
                (
                    ErrorKind::DeserializationError,
                    "Private key is not a DER encoded Ed25519 key",
                )
            })?
        } else {
            s
        };

        let mut bytes = hex::decode(raw).chain(|| {
            (
                ErrorKind::DeserializationError,
                "Private key is not valid hex",
            )
        })?;
        let private_key = PrivateKey::deserialize_from(&bytes);
        bytes.zeroize();

        private_key
    }
}

impl<'de> Deserialize<'de> for PrivateKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StrVisitor;

        impl<'de> Visitor<'de> for StrVisitor {
            type Value = PrivateKey;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("Ed25519 private key in hexadecimal string")
            }

            #[inline]
            fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
            where
                E: SerdeDeError,
            {
                PrivateKey::from_str(value).map_err(|err| E::custom(format!("{}", err)))
            }
        }

        deserializer.deserialize_str(StrVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DER_KEY: &str = "302e020100300506032b657004220420572b2df999e859f213853392a49b0a6b0cc488c7be5fd376422d3ed9af9e6d3c";

    #[test]
    fn check_der_parsing() {
        let private_key = PrivateKey::from_str(DER_KEY).expect("Unable to parse DER key");

        assert_eq!(DER_KEY, private_key.to_der_string());

        let raw = PrivateKey::from_str(&DER_KEY[PRIVATE_KEY_DER_PREFIX.len()..])
            .expect("Unable to parse raw key");
        assert_eq!(private_key, raw);
    }

    #[test]
    fn check_invalid_keys() {
        let error = PrivateKey::from_str("zz").expect_err("Parsed invalid hex");
        assert_eq!(ErrorKind::DeserializationError, error.kind());

        let error = PrivateKey::deserialize_from(&[1, 2, 3]).expect_err("Parsed short key");
        assert_eq!(ErrorKind::DeserializationError, error.kind());
    }

    #[test]
    fn check_rng_serialization() {
        let private_key = PrivateKey::generate();
        let restored = PrivateKey::deserialize_from(&private_key.serialize())
            .expect("Unable to deserialize private key");

        assert_eq!(
            private_key, restored,
            "Serialization / Deserialization is implemented incorrectly"
        );
    }

    #[test]
    fn check_debug_hides_secret() {
        let private_key = PrivateKey::from_str(DER_KEY).unwrap();
        let debug = format!("{:?}", private_key);

        assert!(!debug.contains(&DER_KEY[PRIVATE_KEY_DER_PREFIX.len()..]));
    }
}
