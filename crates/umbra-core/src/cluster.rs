//! Storage-cluster descriptors
//!
//! A [`ClusterDescriptor`] is the ordered set of storage nodes a session
//! shards its documents across. The descriptor is immutable for a session and
//! fixes the secret-sharing fan-out degree N.

use crate::{Did, UmbraError, UmbraResult};
use serde::{Deserialize, Serialize};

/// A single storage node endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Base URL of the node's API
    pub url: String,

    /// Hex-encoded public key identifying the node
    pub public_key: String,
}

impl NodeDescriptor {
    /// The Did this node's tokens must be addressed to
    pub fn did(&self) -> UmbraResult<Did> {
        Did::from_public_key_hex(&self.public_key)
    }
}

/// Ordered set of storage nodes, immutable for a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterDescriptor {
    /// Node endpoints in shard order
    pub nodes: Vec<NodeDescriptor>,
}

impl ClusterDescriptor {
    /// Build a descriptor, rejecting empty node sets
    pub fn new(nodes: Vec<NodeDescriptor>) -> UmbraResult<Self> {
        if nodes.is_empty() {
            return Err(UmbraError::config("Cluster must contain at least one node"));
        }
        for node in &nodes {
            // Fail early on malformed descriptors rather than at shard time
            node.did()?;
            if node.url.is_empty() {
                return Err(UmbraError::config("Cluster node has an empty URL"));
            }
        }
        Ok(ClusterDescriptor { nodes })
    }

    /// The secret-sharing fan-out degree N
    pub fn fan_out(&self) -> usize {
        self.nodes.len()
    }

    /// Stable fingerprint of the node set
    ///
    /// Binds derived key material to this exact ordered node set. Any party
    /// holding the same descriptor derives the same fingerprint.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        for node in &self.nodes {
            hasher.update(node.url.as_bytes());
            hasher.update(&[0u8]);
            hasher.update(node.public_key.as_bytes());
            hasher.update(&[0u8]);
        }
        *hasher.finalize().as_bytes()
    }
}
