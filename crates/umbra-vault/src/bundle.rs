//! Read-token bundles
//!
//! The opaque payload handed to the downstream compute workload: base64 of a
//! JSON array of `{url, token, publicKey}` triples, one per storage node. The
//! workload uses the triples to fetch its shares and rebuild the cluster
//! descriptor; the bundle is consumed exactly once and never mutated.

use base64::Engine;
use serde::{Deserialize, Serialize};
use umbra_core::{NodeDescriptor, UmbraError, UmbraResult};

/// One node's entry in a read-token bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadTokenEntry {
    /// Node base URL
    pub url: String,

    /// Bearer token whose audience is this node
    pub token: String,

    /// Hex-encoded node public key
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

impl ReadTokenEntry {
    /// The node descriptor this entry names
    pub fn node(&self) -> NodeDescriptor {
        NodeDescriptor {
            url: self.url.clone(),
            public_key: self.public_key.clone(),
        }
    }
}

/// Encode per-node entries as an opaque bundle string
pub fn encode_bundle(entries: &[ReadTokenEntry]) -> UmbraResult<String> {
    let json = serde_json::to_vec(entries)
        .map_err(|e| UmbraError::serialization(format!("Failed to encode token bundle: {}", e)))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}

/// Decode a bundle string back into per-node entries
pub fn decode_bundle(bundle: &str) -> UmbraResult<Vec<ReadTokenEntry>> {
    let json = base64::engine::general_purpose::STANDARD
        .decode(bundle)
        .map_err(|e| UmbraError::serialization(format!("Invalid token bundle encoding: {}", e)))?;
    serde_json::from_slice(&json)
        .map_err(|e| UmbraError::serialization(format!("Malformed token bundle: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_round_trip() {
        let entries = vec![
            ReadTokenEntry {
                url: "https://node-1.example".to_string(),
                token: "token-1".to_string(),
                public_key: "aa".repeat(32),
            },
            ReadTokenEntry {
                url: "https://node-2.example".to_string(),
                token: "token-2".to_string(),
                public_key: "bb".repeat(32),
            },
        ];

        let bundle = encode_bundle(&entries).unwrap();
        assert_eq!(decode_bundle(&bundle).unwrap(), entries);
    }

    #[test]
    fn test_bundle_wire_field_names() {
        let entries = vec![ReadTokenEntry {
            url: "https://node-1.example".to_string(),
            token: "t".to_string(),
            public_key: "cc".repeat(32),
        }];

        let json = serde_json::to_string(&entries).unwrap();
        assert!(json.contains("\"publicKey\""));
        assert!(!json.contains("public_key"));
    }

    #[test]
    fn test_malformed_bundle_rejected() {
        assert!(decode_bundle("!!!").is_err());
        let not_json = base64::engine::general_purpose::STANDARD.encode(b"plain text");
        assert!(decode_bundle(&not_json).is_err());
    }
}
