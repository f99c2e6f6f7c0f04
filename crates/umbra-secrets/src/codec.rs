//! Secret-sharing codec
//!
//! Shards each chunk into one share per storage node and reconstructs chunks
//! from complete share sets. The construction is XOR-based N-of-N sharing:
//! N - 1 shares are uniform random pads and the final share is the chunk
//! masked by every pad, so any proper subset of shares is indistinguishable
//! from random. A single-node cluster degenerates to plain masking, so the
//! key carries ChaCha20 material in that case.
//!
//! Cluster keys are derived from the cluster descriptor, which is what lets
//! the remote compute workload, which holds the same descriptor, rebuild the
//! key on its side without any key material crossing the wire.

use crate::chunker::Chunk;
use base64::Engine;
use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use umbra_core::{ClusterDescriptor, UmbraError, UmbraResult};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key-derivation context for per-cluster integrity tags
const TAG_KEY_CONTEXT: &str = "umbra.cluster.tag.v1";

/// Key-derivation context for the single-node masking key
const MASK_KEY_CONTEXT: &str = "umbra.cluster.mask.v1";

/// Key material binding a set of shares to one reconstructible chunk
///
/// Bound to a [`ClusterDescriptor`]; the fan-out degree N is fixed at
/// generation time. Never transmitted: every holder of the descriptor can
/// derive an equivalent key.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ClusterKey {
    /// Fingerprint of the descriptor this key is bound to
    #[zeroize(skip)]
    fingerprint: [u8; 32],

    /// Number of shares per chunk
    #[zeroize(skip)]
    fan_out: usize,

    /// Keyed-hash key for chunk integrity tags
    tag_key: [u8; 32],

    /// ChaCha20 masking key, present only for single-node clusters
    mask: Option<[u8; 32]>,
}

impl ClusterKey {
    /// Number of shares required to reconstruct a chunk
    pub fn fan_out(&self) -> usize {
        self.fan_out
    }

    /// Fingerprint of the cluster this key is bound to
    pub fn fingerprint(&self) -> [u8; 32] {
        self.fingerprint
    }
}

impl std::fmt::Debug for ClusterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.debug_struct("ClusterKey")
            .field("fan_out", &self.fan_out)
            .field("fingerprint", &hex::encode(self.fingerprint))
            .finish()
    }
}

/// One node's fragment of one chunk
///
/// Tagged with the chunk's position; a share alone reveals nothing about the
/// chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    /// Position of the chunk this share belongs to
    pub chunk_index: u32,

    /// Position of the node this share is destined for, in descriptor order
    pub node_index: u32,

    /// Share bytes
    pub data: Vec<u8>,

    /// Keyed integrity tag over the plaintext chunk
    pub tag: [u8; 32],
}

impl Share {
    /// Encode this share as an opaque wire string
    pub fn to_wire(&self) -> String {
        let mut bytes = Vec::with_capacity(8 + 32 + self.data.len());
        bytes.extend_from_slice(&self.chunk_index.to_le_bytes());
        bytes.extend_from_slice(&self.node_index.to_le_bytes());
        bytes.extend_from_slice(&self.tag);
        bytes.extend_from_slice(&self.data);
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    /// Decode a share from its wire string
    pub fn from_wire(wire: &str) -> UmbraResult<Self> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(wire)
            .map_err(|e| UmbraError::serialization(format!("Invalid share encoding: {}", e)))?;
        if bytes.len() < 40 {
            return Err(UmbraError::serialization("Share payload truncated"));
        }

        let chunk_index = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let node_index = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let mut tag = [0u8; 32];
        tag.copy_from_slice(&bytes[8..40]);

        Ok(Share {
            chunk_index,
            node_index,
            data: bytes[40..].to_vec(),
            tag,
        })
    }
}

/// Stateless sharding and reconstruction, plus an optional in-process keyring
#[derive(Default)]
pub struct SecretCodec {
    /// Cluster keys cached when `persist` was requested at generation time
    keyring: Mutex<HashMap<[u8; 32], ClusterKey>>,
}

impl SecretCodec {
    /// Create a codec with an empty keyring
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the cluster key for a descriptor
    ///
    /// When `persist` is true the key is cached in the in-process keyring,
    /// retrievable with [`SecretCodec::cached_key`]. The key is never written
    /// out in plaintext.
    pub fn generate_cluster_key(
        &self,
        cluster: &ClusterDescriptor,
        persist: bool,
    ) -> UmbraResult<ClusterKey> {
        if cluster.fan_out() == 0 {
            return Err(UmbraError::config("Cluster must contain at least one node"));
        }

        let fingerprint = cluster.fingerprint();
        // Derived, not random: every holder of the descriptor must end up
        // with the same key
        let mask = if cluster.fan_out() == 1 {
            Some(blake3::derive_key(MASK_KEY_CONTEXT, &fingerprint))
        } else {
            None
        };

        let key = ClusterKey {
            fingerprint,
            fan_out: cluster.fan_out(),
            tag_key: blake3::derive_key(TAG_KEY_CONTEXT, &fingerprint),
            mask,
        };

        if persist {
            let mut keyring = self
                .keyring
                .lock()
                .map_err(|_| UmbraError::crypto("Keyring lock poisoned"))?;
            keyring.insert(fingerprint, key.clone());
        }

        Ok(key)
    }

    /// Look up a previously persisted key for a cluster
    pub fn cached_key(&self, cluster: &ClusterDescriptor) -> Option<ClusterKey> {
        self.keyring
            .lock()
            .ok()
            .and_then(|keyring| keyring.get(&cluster.fingerprint()).cloned())
    }

    /// Shard a chunk into one share per node, in descriptor order
    pub fn shard(&self, key: &ClusterKey, chunk: &Chunk) -> UmbraResult<Vec<Share>> {
        let tag = *blake3::keyed_hash(&key.tag_key, &chunk.data).as_bytes();

        let mut residue = chunk.data.clone();
        apply_mask(key, chunk.index, &mut residue);

        let mut shares = Vec::with_capacity(key.fan_out);
        for node_index in 0..key.fan_out - 1 {
            let mut pad = vec![0u8; residue.len()];
            rand::rngs::OsRng.fill_bytes(&mut pad);
            xor_into(&mut residue, &pad);
            shares.push(Share {
                chunk_index: chunk.index,
                node_index: node_index as u32,
                data: pad,
                tag,
            });
        }
        shares.push(Share {
            chunk_index: chunk.index,
            node_index: (key.fan_out - 1) as u32,
            data: residue,
            tag,
        });

        Ok(shares)
    }

    /// Reconstruct a chunk from a complete share set
    ///
    /// Requires exactly one share from every node. Partial sets, duplicate
    /// nodes, length mismatches, and tag mismatches all fail with a
    /// reconstruction error, never silently wrong data.
    pub fn reconstruct(&self, key: &ClusterKey, shares: &[Share]) -> UmbraResult<Chunk> {
        if shares.len() != key.fan_out {
            return Err(UmbraError::reconstruction(format!(
                "Need shares from all {} nodes, got {}",
                key.fan_out,
                shares.len()
            )));
        }

        let chunk_index = shares[0].chunk_index;
        let tag = shares[0].tag;
        let length = shares[0].data.len();
        let mut seen = vec![false; key.fan_out];

        for share in shares {
            if share.chunk_index != chunk_index {
                return Err(UmbraError::reconstruction(format!(
                    "Shares span chunk indices {} and {}",
                    chunk_index, share.chunk_index
                )));
            }
            if share.tag != tag {
                return Err(UmbraError::reconstruction("Share tags disagree"));
            }
            if share.data.len() != length {
                return Err(UmbraError::reconstruction("Share lengths disagree"));
            }
            let node = share.node_index as usize;
            if node >= key.fan_out || seen[node] {
                return Err(UmbraError::reconstruction(format!(
                    "Duplicate or out-of-range node index {}",
                    share.node_index
                )));
            }
            seen[node] = true;
        }

        let mut data = vec![0u8; length];
        for share in shares {
            xor_into(&mut data, &share.data);
        }
        apply_mask(key, chunk_index, &mut data);

        // Constant-time comparison via blake3::Hash equality
        let computed = blake3::keyed_hash(&key.tag_key, &data);
        if computed != blake3::Hash::from_bytes(tag) {
            return Err(UmbraError::reconstruction(
                "Integrity tag mismatch: share tampered or corrupt",
            ));
        }

        Ok(Chunk {
            index: chunk_index,
            data,
        })
    }

    /// Reconstruct a full payload from per-chunk share sets
    ///
    /// Share sets are reconstructed per chunk index, then concatenated in
    /// ascending chunk order.
    pub fn reconstruct_payload(
        &self,
        key: &ClusterKey,
        share_sets: &[Vec<Share>],
    ) -> UmbraResult<Vec<u8>> {
        let mut chunks = share_sets
            .iter()
            .map(|shares| self.reconstruct(key, shares))
            .collect::<UmbraResult<Vec<_>>>()?;
        chunks.sort_by_key(|chunk| chunk.index);
        crate::chunker::reassemble(&chunks)
    }
}

/// Apply the single-node ChaCha20 mask, if the key carries one
fn apply_mask(key: &ClusterKey, chunk_index: u32, data: &mut [u8]) {
    if let Some(material) = &key.mask {
        let mut nonce = [0u8; 12];
        nonce[..4].copy_from_slice(&chunk_index.to_le_bytes());
        let mut cipher = ChaCha20::new(material.into(), (&nonce).into());
        cipher.apply_keystream(data);
    }
}

fn xor_into(acc: &mut [u8], other: &[u8]) {
    for (a, b) in acc.iter_mut().zip(other) {
        *a ^= b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use umbra_core::{Keypair, NodeDescriptor};

    fn test_cluster(n: usize) -> ClusterDescriptor {
        let nodes = (0..n)
            .map(|i| NodeDescriptor {
                url: format!("https://node-{}.example", i),
                public_key: Keypair::generate().public_key_hex(),
            })
            .collect();
        ClusterDescriptor::new(nodes).unwrap()
    }

    fn test_chunk(data: &[u8]) -> Chunk {
        Chunk {
            index: 0,
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_shard_reconstruct_round_trip() {
        let codec = SecretCodec::new();
        let cluster = test_cluster(3);
        let key = codec.generate_cluster_key(&cluster, false).unwrap();

        let chunk = test_chunk(b"sensitive document bytes");
        let shares = codec.shard(&key, &chunk).unwrap();

        assert_eq!(shares.len(), 3);
        let recovered = codec.reconstruct(&key, &shares).unwrap();
        assert_eq!(recovered, chunk);
    }

    #[test]
    fn test_partial_share_set_fails() {
        let codec = SecretCodec::new();
        let cluster = test_cluster(3);
        let key = codec.generate_cluster_key(&cluster, false).unwrap();

        let shares = codec.shard(&key, &test_chunk(b"payload")).unwrap();
        let partial = &shares[..2];

        let err = codec.reconstruct(&key, partial).unwrap_err();
        assert!(matches!(err, UmbraError::Reconstruction { .. }));
    }

    #[test]
    fn test_tampered_share_fails() {
        let codec = SecretCodec::new();
        let cluster = test_cluster(3);
        let key = codec.generate_cluster_key(&cluster, false).unwrap();

        let mut shares = codec.shard(&key, &test_chunk(b"payload")).unwrap();
        shares[1].data[0] ^= 0xff;

        let err = codec.reconstruct(&key, &shares).unwrap_err();
        assert!(matches!(err, UmbraError::Reconstruction { .. }));
    }

    #[test]
    fn test_duplicate_node_index_fails() {
        let codec = SecretCodec::new();
        let cluster = test_cluster(3);
        let key = codec.generate_cluster_key(&cluster, false).unwrap();

        let mut shares = codec.shard(&key, &test_chunk(b"payload")).unwrap();
        shares[2] = shares[0].clone();

        assert!(codec.reconstruct(&key, &shares).is_err());
    }

    #[test]
    fn test_single_share_reveals_nothing_without_peers() {
        // Every proper subset is a uniform random pad; reconstruction is the
        // only way back to plaintext and it demands the full set.
        let codec = SecretCodec::new();
        let cluster = test_cluster(2);
        let key = codec.generate_cluster_key(&cluster, false).unwrap();

        let chunk = test_chunk(&[0u8; 64]);
        let shares = codec.shard(&key, &chunk).unwrap();

        // The pad share of an all-zero chunk must not be all zero
        assert_ne!(shares[0].data, chunk.data);
    }

    #[test]
    fn test_single_node_cluster_masks_plaintext() {
        let codec = SecretCodec::new();
        let cluster = test_cluster(1);
        let key = codec.generate_cluster_key(&cluster, false).unwrap();

        let chunk = test_chunk(b"plaintext must not appear on the node");
        let shares = codec.shard(&key, &chunk).unwrap();

        assert_eq!(shares.len(), 1);
        assert_ne!(shares[0].data, chunk.data);
        assert_eq!(codec.reconstruct(&key, &shares).unwrap(), chunk);
    }

    #[test]
    fn test_derived_key_is_stable_across_holders() {
        // The workload derives its own key from the same descriptor; shares
        // produced under one derivation must reconstruct under the other.
        let codec = SecretCodec::new();
        let cluster = test_cluster(3);

        let uploader_key = codec.generate_cluster_key(&cluster, false).unwrap();
        let workload_key = codec.generate_cluster_key(&cluster, false).unwrap();

        let chunk = test_chunk(b"cross-holder reconstruction");
        let shares = codec.shard(&uploader_key, &chunk).unwrap();
        assert_eq!(codec.reconstruct(&workload_key, &shares).unwrap(), chunk);
    }

    #[test]
    fn test_keyring_persistence() {
        let codec = SecretCodec::new();
        let cluster = test_cluster(3);

        assert!(codec.cached_key(&cluster).is_none());
        codec.generate_cluster_key(&cluster, true).unwrap();
        assert!(codec.cached_key(&cluster).is_some());
    }

    #[test]
    fn test_share_wire_round_trip() {
        let codec = SecretCodec::new();
        let cluster = test_cluster(3);
        let key = codec.generate_cluster_key(&cluster, false).unwrap();

        let shares = codec.shard(&key, &test_chunk(b"wire")).unwrap();
        for share in &shares {
            let decoded = Share::from_wire(&share.to_wire()).unwrap();
            assert_eq!(&decoded, share);
        }

        assert!(Share::from_wire("not base64!").is_err());
        assert!(Share::from_wire("AAAA").is_err());
    }

    proptest! {
        #[test]
        fn prop_shard_reconstruct_identity(
            data in proptest::collection::vec(any::<u8>(), 0..2000),
            n in 1usize..6,
            index in 0u32..16,
        ) {
            let codec = SecretCodec::new();
            let cluster = test_cluster(n);
            let key = codec.generate_cluster_key(&cluster, false).unwrap();

            let chunk = Chunk { index, data };
            let shares = codec.shard(&key, &chunk).unwrap();
            prop_assert_eq!(shares.len(), n);
            prop_assert_eq!(codec.reconstruct(&key, &shares).unwrap(), chunk);
        }
    }
}
