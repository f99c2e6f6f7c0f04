//! Vault client: publish and retrieve secret-shared documents
//!
//! The write side ([`VaultUploadClient`]) executes the full "publish a
//! secret" transaction: chunk, shard, delegate, submit, and mint read tokens.
//! The read side ([`DocumentFetcher`]) is what the downstream compute
//! workload runs to get the plaintext back. Neither side ever sends the
//! cluster key or a complete chunk to any single node.

pub mod bundle;
pub mod fetch;
pub mod node;
pub mod upload;

#[cfg(test)]
pub(crate) mod testutil;

pub use bundle::{decode_bundle, encode_bundle, ReadTokenEntry};
pub use fetch::DocumentFetcher;
pub use node::{AclEntry, CreateDataRequest, DataRecord, HttpNodeClient, NodeApi, ShareEnvelope};
pub use upload::{UploadRecord, UploadStatus, VaultUploadClient, READ_TOKEN_TTL_SECS, WRITE_GRANT_TTL_SECS};
