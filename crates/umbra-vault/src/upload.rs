//! The "publish a secret" flow
//!
//! One sequential transaction: derive the builder's root authorization, chunk
//! and shard the document, create a fresh owning identity, delegate a write
//! capability to it, submit shares to every node, and mint per-node read
//! tokens for the downstream workload. Failure at any step aborts the whole
//! upload with a single coarse error; no partial commit is recovered and no
//! retry happens here. Each attempt generates a fresh user identity, so a
//! retried upload is a new logical document.

use crate::bundle::{encode_bundle, ReadTokenEntry};
use crate::node::{AclEntry, CreateDataRequest, DataRecord, HttpNodeClient, NodeApi, ShareEnvelope};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use umbra_authorization::{issue, Command, TokenEnvelope};
use umbra_core::{ClusterDescriptor, Keypair, UmbraConfig, UmbraError, UmbraResult};
use umbra_secrets::{split, SecretCodec, DEFAULT_MAX_CHUNK_SIZE};
use uuid::Uuid;

/// Lifetime of the builder-to-user write delegation
pub const WRITE_GRANT_TTL_SECS: u64 = 3600;

/// Lifetime of the per-node read tokens handed to the workload
pub const READ_TOKEN_TTL_SECS: u64 = 64_000;

/// Lifetime of the short per-node create invocations
const INVOCATION_TTL_SECS: u64 = 600;

/// Terminal status of an upload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Shares stored and read tokens minted
    Uploaded,
    /// The attempt aborted; no read tokens exist
    Failed,
}

/// Everything a successful upload leaves behind
///
/// Created once per upload, consumed exactly once as workload input, never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Session-local identifier of this upload attempt
    pub upload_id: Uuid,

    /// Remote document identifier, identical across nodes
    pub document_id: Uuid,

    /// Collection the document was published into
    pub collection_id: Uuid,

    /// Opaque per-node read-token bundle (base64 JSON)
    pub read_token_bundle: String,

    /// Original file name
    pub file_name: String,

    /// Original file size in bytes
    pub file_size: u64,

    /// Outcome of the attempt
    pub status: UploadStatus,
}

/// Client owning the end-to-end publish transaction
pub struct VaultUploadClient {
    api: Arc<dyn NodeApi>,
    cluster: ClusterDescriptor,
    collection_id: Uuid,
    builder: Keypair,
    codec: SecretCodec,
    max_chunk_size: usize,
}

impl VaultUploadClient {
    /// Build a client from session configuration, talking HTTP to real nodes
    pub fn new(config: &UmbraConfig) -> UmbraResult<Self> {
        let builder = Keypair::from_hex(&config.builder_key)
            .map_err(|e| UmbraError::config(format!("Invalid builder key: {}", e)))?;
        Ok(Self::with_api(
            Arc::new(HttpNodeClient::new()),
            config.cluster()?,
            config.collection_id,
            builder,
        ))
    }

    /// Build a client over any [`NodeApi`] implementation
    pub fn with_api(
        api: Arc<dyn NodeApi>,
        cluster: ClusterDescriptor,
        collection_id: Uuid,
        builder: Keypair,
    ) -> Self {
        VaultUploadClient {
            api,
            cluster,
            collection_id,
            builder,
            codec: SecretCodec::new(),
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }

    /// Publish one document; any step failure surfaces as `UploadFailed`
    pub async fn publish(&self, file_name: &str, payload: &[u8]) -> UmbraResult<UploadRecord> {
        tracing::info!(file_name, size = payload.len(), "Publishing document");

        let record = self
            .publish_inner(file_name, payload)
            .await
            .map_err(|e| UmbraError::upload_failed(e.to_string()))?;

        tracing::info!(
            document_id = %record.document_id,
            "Document published"
        );
        Ok(record)
    }

    async fn publish_inner(&self, file_name: &str, payload: &[u8]) -> UmbraResult<UploadRecord> {
        // Builder root authorization, refreshed per upload
        let root = issue(
            None,
            Command::new(["vault"]),
            self.builder.did(),
            WRITE_GRANT_TTL_SECS,
            &self.builder,
            false,
            Some(self.builder.did()),
        )?;

        let chunks = split(payload, self.max_chunk_size)?;

        // The cluster key never leaves this session; nodes only ever see
        // their own share
        let cluster_key = self.codec.generate_cluster_key(&self.cluster, false)?;

        // Fresh per-document identity; the user, not the builder, owns the
        // document
        let user = Keypair::generate();

        let write_grant = issue(
            Some(&root),
            Command::new(["vault", "data", "create"]),
            user.did(),
            WRITE_GRANT_TTL_SECS,
            &self.builder,
            false,
            None,
        )?;

        // One share per node per chunk, in descriptor order
        let fan_out = self.cluster.fan_out();
        let mut per_node_chunks: Vec<Vec<ShareEnvelope>> = vec![Vec::new(); fan_out];
        for chunk in &chunks {
            let shares = self.codec.shard(&cluster_key, chunk)?;
            for (node_index, share) in shares.iter().enumerate() {
                per_node_chunks[node_index].push(ShareEnvelope {
                    share: share.to_wire(),
                });
            }
        }

        let document_id = Uuid::new_v4();
        let acl = AclEntry {
            grantee: self.builder.did(),
            read: true,
            write: false,
            execute: true,
        };

        // Fan-out submission; a single missing node fails the whole upload
        let mut submissions = Vec::with_capacity(fan_out);
        for (node_index, node) in self.cluster.nodes.iter().enumerate() {
            let invocation = issue(
                Some(&write_grant),
                Command::new(["vault", "data", "create"]),
                node.did()?,
                INVOCATION_TTL_SECS,
                &user,
                true,
                None,
            )?;
            let bearer = invocation.encode()?;
            let request = CreateDataRequest {
                owner: user.did(),
                acl: acl.clone(),
                collection: self.collection_id,
                data: vec![DataRecord {
                    id: document_id,
                    chunks: per_node_chunks[node_index].clone(),
                }],
            };
            let api = Arc::clone(&self.api);
            let node = node.clone();
            submissions.push(async move { api.create_data(&node, &bearer, &request).await });
        }
        let responses = futures::future::try_join_all(submissions).await?;

        // Every node must report the same created document
        for (node, response) in self.cluster.nodes.iter().zip(&responses) {
            if !response.data.created.contains(&document_id) {
                return Err(UmbraError::invalid(format!(
                    "Node {} did not acknowledge document {}",
                    node.url, document_id
                )));
            }
        }

        let entries = self.mint_read_tokens(&user)?;
        let read_token_bundle = encode_bundle(&entries)?;

        Ok(UploadRecord {
            upload_id: Uuid::new_v4(),
            document_id,
            collection_id: self.collection_id,
            read_token_bundle,
            file_name: file_name.to_string(),
            file_size: payload.len() as u64,
            status: UploadStatus::Uploaded,
        })
    }

    /// Mint one self-issued read invocation per node, audience-bound
    fn mint_read_tokens(&self, user: &Keypair) -> UmbraResult<Vec<ReadTokenEntry>> {
        let mut entries = Vec::with_capacity(self.cluster.fan_out());
        for node in &self.cluster.nodes {
            let token: TokenEnvelope = issue(
                None,
                Command::new(["vault", "data", "read"]),
                node.did()?,
                READ_TOKEN_TTL_SECS,
                user,
                true,
                Some(user.did()),
            )?;
            entries.push(ReadTokenEntry {
                url: node.url.clone(),
                token: token.encode()?,
                public_key: node.public_key.clone(),
            });
        }
        Ok(entries)
    }
}
