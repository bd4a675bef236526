use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use ed25519_dalek::{Verifier, VerifyingKey, PUBLIC_KEY_LENGTH};
use parity_scale_codec::{Encode, Output};
use serde::de::{Deserialize, Deserializer, Error as SerdeDeError, Visitor};
use serde::ser::{Serialize, Serializer};

use super::{Signature, PUBLIC_KEY_DER_PREFIX};
use crate::{Error, ErrorKind, Result, ResultExt};

/// Ed25519 public key
#[derive(Clone, Copy)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Serializes current public key to raw 32 bytes
    #[inline]
    pub fn serialize(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0.to_bytes()
    }

    /// Deserializes public key from raw 32 bytes
    pub fn deserialize_from(bytes: &[u8]) -> Result<PublicKey> {
        let bytes = <[u8; PUBLIC_KEY_LENGTH]>::try_from(bytes).chain(|| {
            (
                ErrorKind::DeserializationError,
                format!(
                    "Public key must be {} bytes, found {}",
                    PUBLIC_KEY_LENGTH,
                    bytes.len()
                ),
            )
        })?;
        let verifying_key = VerifyingKey::from_bytes(&bytes).chain(|| {
            (
                ErrorKind::DeserializationError,
                "Bytes are not a valid Ed25519 point",
            )
        })?;

        Ok(PublicKey(verifying_key))
    }

    /// Returns DER encoded public key as hex string
    pub fn to_der_string(&self) -> String {
        format!("{}{}", PUBLIC_KEY_DER_PREFIX, hex::encode(self.serialize()))
    }

    /// Returns `true` if `signature` is a valid signature of `message` by current key
    pub fn verify<T: AsRef<[u8]>>(&self, message: T, signature: &Signature) -> bool {
        self.0.verify(message.as_ref(), signature).is_ok()
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(verifying_key: VerifyingKey) -> Self {
        PublicKey(verifying_key)
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes() == other.0.as_bytes()
    }
}

impl Eq for PublicKey {}

impl PartialOrd for PublicKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PublicKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.as_bytes().cmp(other.0.as_bytes())
    }
}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_bytes().hash(state)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.serialize()))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_der_string())
    }
}

impl FromStr for PublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<PublicKey> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let raw = s.strip_prefix(PUBLIC_KEY_DER_PREFIX).unwrap_or(s);
        let bytes = hex::decode(raw)
            .chain(|| (ErrorKind::DeserializationError, "Public key is not valid hex"))?;

        PublicKey::deserialize_from(&bytes)
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StrVisitor;

        impl<'de> Visitor<'de> for StrVisitor {
            type Value = PublicKey;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("public key in hexadecimal string")
            }

            #[inline]
            fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
            where
                E: SerdeDeError,
            {
                PublicKey::from_str(value).map_err(|err| E::custom(format!("{}", err)))
            }
        }

        deserializer.deserialize_str(StrVisitor)
    }
}

impl Encode for PublicKey {
    fn encode_to<W: Output + ?Sized>(&self, dest: &mut W) {
        self.serialize().encode_to(dest)
    }

    fn size_hint(&self) -> usize {
        PUBLIC_KEY_LENGTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::PrivateKey;

    #[test]
    fn check_serialization() {
        let public_key = PrivateKey::generate().public_key();

        let public_key_new = PublicKey::deserialize_from(&public_key.serialize())
            .expect("Unable to deserialize public key");

        assert_eq!(
            public_key, public_key_new,
            "Serialization / Deserialization is implemented incorrectly"
        );
    }

    #[test]
    fn check_der_string() {
        let public_key = PrivateKey::generate().public_key();
        let der = public_key.to_string();

        assert!(der.starts_with(PUBLIC_KEY_DER_PREFIX));
        assert_eq!(public_key, PublicKey::from_str(&der).unwrap());
        assert_eq!(
            public_key,
            serde_json::from_str::<PublicKey>(&serde_json::to_string(&public_key).unwrap())
                .unwrap()
        );
    }

    #[test]
    fn check_verify() {
        let private_key = PrivateKey::generate();
        let public_key = private_key.public_key();
        let signature = private_key.sign(b"message");

        assert!(public_key.verify(b"message", &signature));
        assert!(!public_key.verify(b"other message", &signature));
        assert!(!PrivateKey::generate()
            .public_key()
            .verify(b"message", &signature));
    }

    #[test]
    fn check_encoding() {
        let public_key = PrivateKey::generate().public_key();

        assert_eq!(public_key.serialize().to_vec(), public_key.encode());
    }
}
