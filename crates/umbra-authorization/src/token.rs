//! Delegation tokens and their wire envelope
//!
//! A token is `{issuer, audience, subject, command, expires_at, body}` signed
//! by the issuer's private key. Tokens chain: the envelope carries the parent
//! chain as proofs, root first. The body marker distinguishes a "perform now"
//! invocation from a "delegate further" grant.

use crate::Command;
use base64::Engine;
use ed25519_dalek::Signature;
use serde::{Deserialize, Serialize};
use umbra_core::{Did, UmbraError, UmbraResult};

/// Marker distinguishing delegation from invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenBody {
    /// Forwards authority for the audience to delegate or exercise later
    Delegation,

    /// Exercises authority now; accepted only by the named audience
    Invocation,
}

/// An unsigned delegation token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationToken {
    /// Who minted this token
    pub issuer: Did,

    /// The only identity whose verifier should accept this token
    pub audience: Did,

    /// The identity the chain is ultimately about, if stated
    pub subject: Option<Did>,

    /// What this token authorizes
    pub command: Command,

    /// Absolute expiry, seconds since the Unix epoch
    pub expires_at: u64,

    /// Delegation or invocation marker
    pub body: TokenBody,
}

impl DelegationToken {
    /// Canonical byte payload covered by the issuer signature
    pub fn signing_payload(&self) -> UmbraResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| UmbraError::serialization(format!("Failed to serialize token: {}", e)))
    }

    /// Whether the token is expired at `now`
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// A token with its issuer signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedToken {
    /// The signed token
    pub token: DelegationToken,

    /// Hex-encoded Ed25519 signature over the token's signing payload
    pub signature: String,
}

impl SignedToken {
    /// Verify the issuer signature on this token
    pub fn verify_signature(&self) -> UmbraResult<()> {
        let payload = self.token.signing_payload()?;
        let bytes = hex::decode(&self.signature)
            .map_err(|e| UmbraError::invalid(format!("Invalid signature hex: {}", e)))?;
        let signature = Signature::from_slice(&bytes)
            .map_err(|e| UmbraError::invalid(format!("Malformed signature: {}", e)))?;
        self.token.issuer.verify(&payload, &signature)
    }
}

/// A signed token together with its proof chain, root first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEnvelope {
    /// The leaf token
    pub token: DelegationToken,

    /// Hex-encoded Ed25519 signature over the leaf's signing payload
    pub signature: String,

    /// Parent chain, outermost (root) first
    pub proofs: Vec<SignedToken>,
}

impl TokenEnvelope {
    /// The leaf as a standalone signed token
    pub fn signed(&self) -> SignedToken {
        SignedToken {
            token: self.token.clone(),
            signature: self.signature.clone(),
        }
    }

    /// Encode the envelope as an opaque bearer string
    pub fn encode(&self) -> UmbraResult<String> {
        let json = serde_json::to_vec(self)
            .map_err(|e| UmbraError::serialization(format!("Failed to encode token: {}", e)))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode an envelope from its bearer string
    pub fn decode(raw: &str) -> UmbraResult<Self> {
        let json = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(raw)
            .map_err(|e| UmbraError::serialization(format!("Invalid token encoding: {}", e)))?;
        serde_json::from_slice(&json)
            .map_err(|e| UmbraError::serialization(format!("Malformed token envelope: {}", e)))
    }
}
