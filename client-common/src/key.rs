//! Key management
mod key_list;
mod private_key;
mod public_key;

pub use self::key_list::{Key, ThresholdKey};
pub use self::private_key::PrivateKey;
pub use self::public_key::PublicKey;

/// Ed25519 signature produced by [`PrivateKey::sign`]
///
/// [`PrivateKey::sign`]: self::PrivateKey::sign
pub use ed25519_dalek::Signature;

/// DER prefix of a PKCS#8 encoded Ed25519 private key
const PRIVATE_KEY_DER_PREFIX: &str = "302e020100300506032b657004220420";
/// DER prefix of a SubjectPublicKeyInfo encoded Ed25519 public key
const PUBLIC_KEY_DER_PREFIX: &str = "302a300506032b6570032100";
