//! Public-key identities
//!
//! Every party in the workflow (the platform builder, the per-document user,
//! and each storage node) is addressed by a [`Did`] derived from an Ed25519
//! public key. Token audiences, issuers, and data owners are all Dids.

use crate::{UmbraError, UmbraResult};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Textual prefix for rendered Dids
const DID_PREFIX: &str = "did:umbra:";

/// A public-key-derived subject/audience identifier
///
/// Wraps the raw 32-byte Ed25519 public key. Rendered as
/// `did:umbra:<hex public key>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Did([u8; 32]);

impl Did {
    /// Build a Did from a raw public key
    pub fn from_public_key(bytes: [u8; 32]) -> Self {
        Did(bytes)
    }

    /// Build a Did from a hex-encoded public key
    pub fn from_public_key_hex(hex_key: &str) -> UmbraResult<Self> {
        let bytes = hex::decode(hex_key)
            .map_err(|e| UmbraError::invalid(format!("Invalid public key hex: {}", e)))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| UmbraError::invalid("Public key must be 32 bytes"))?;
        Ok(Did(bytes))
    }

    /// Raw public key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The verifying key this Did names
    pub fn verifying_key(&self) -> UmbraResult<VerifyingKey> {
        VerifyingKey::from_bytes(&self.0)
            .map_err(|e| UmbraError::crypto(format!("Did is not a valid public key: {}", e)))
    }

    /// Verify a signature made by the holder of this Did's private key
    pub fn verify(&self, message: &[u8], signature: &Signature) -> UmbraResult<()> {
        self.verifying_key()?
            .verify(message, signature)
            .map_err(|e| UmbraError::crypto(format!("Signature verification failed: {}", e)))
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", DID_PREFIX, hex::encode(self.0))
    }
}

impl FromStr for Did {
    type Err = UmbraError;

    fn from_str(s: &str) -> UmbraResult<Self> {
        let hex_key = s.strip_prefix(DID_PREFIX).unwrap_or(s);
        Did::from_public_key_hex(hex_key)
    }
}

impl Serialize for Did {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Did {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Did::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// An Ed25519 keypair owning a [`Did`]
///
/// Key material is zeroized on drop by the underlying signing key. Sessions
/// hold exactly two kinds of keypairs: the pre-provisioned builder key and
/// the fresh per-document user key generated for each upload.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from the OS entropy source
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        Keypair {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Load a keypair from a hex-encoded 32-byte seed
    pub fn from_hex(hex_seed: &str) -> UmbraResult<Self> {
        let bytes = hex::decode(hex_seed)
            .map_err(|e| UmbraError::invalid(format!("Invalid key hex: {}", e)))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| UmbraError::invalid("Key seed must be 32 bytes"))?;
        Ok(Keypair {
            signing_key: SigningKey::from_bytes(&bytes),
        })
    }

    /// The Did derived from this keypair's public key
    pub fn did(&self) -> Did {
        Did(self.signing_key.verifying_key().to_bytes())
    }

    /// Hex-encoded public key
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a message with this keypair's private key
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material
        f.debug_struct("Keypair").field("did", &self.did()).finish()
    }
}
