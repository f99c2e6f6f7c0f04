//! Share retrieval and document reconstruction
//!
//! The read side of the vault: given a read-token bundle, fetch every node's
//! record, decode the shares, and reconstruct the original payload. This is
//! the same path the remote compute workload runs; having it here keeps the
//! share-to-plaintext pipeline testable without provisioning anything.

use crate::bundle::decode_bundle;
use crate::node::{HttpNodeClient, NodeApi};
use std::sync::Arc;
use umbra_core::{ClusterDescriptor, UmbraError, UmbraResult};
use umbra_secrets::{SecretCodec, Share};
use uuid::Uuid;

/// Fetches shares from every node and reconstructs documents
pub struct DocumentFetcher {
    api: Arc<dyn NodeApi>,
    codec: SecretCodec,
}

impl DocumentFetcher {
    /// Build a fetcher talking HTTP to real nodes
    pub fn new() -> Self {
        Self::with_api(Arc::new(HttpNodeClient::new()))
    }

    /// Build a fetcher over any [`NodeApi`] implementation
    pub fn with_api(api: Arc<dyn NodeApi>) -> Self {
        DocumentFetcher {
            api,
            codec: SecretCodec::new(),
        }
    }

    /// Fetch all shares named by a read-token bundle and reconstruct the
    /// payload
    ///
    /// Per-node fetches run concurrently, but reconstruction waits for all of
    /// them: a missing node response fails the whole document.
    pub async fn fetch_document(
        &self,
        bundle: &str,
        collection_id: Uuid,
        document_id: Uuid,
    ) -> UmbraResult<Vec<u8>> {
        let entries = decode_bundle(bundle)?;
        let cluster =
            ClusterDescriptor::new(entries.iter().map(|entry| entry.node()).collect())?;
        // Same derivation the uploader used; no key material crossed the wire
        let cluster_key = self.codec.generate_cluster_key(&cluster, false)?;

        let mut reads = Vec::with_capacity(entries.len());
        for entry in &entries {
            let api = Arc::clone(&self.api);
            let node = entry.node();
            let bearer = entry.token.clone();
            reads.push(async move {
                api.read_data(&node, &bearer, collection_id, document_id)
                    .await
            });
        }
        let responses = futures::future::try_join_all(reads).await?;

        let chunk_count = responses
            .first()
            .map(|response| response.data.chunks.len())
            .unwrap_or(0);
        for (entry, response) in entries.iter().zip(&responses) {
            if response.data.chunks.len() != chunk_count {
                return Err(UmbraError::reconstruction(format!(
                    "Node {} returned {} chunks, expected {}",
                    entry.url,
                    response.data.chunks.len(),
                    chunk_count
                )));
            }
        }

        let mut share_sets: Vec<Vec<Share>> = Vec::with_capacity(chunk_count);
        for chunk_index in 0..chunk_count {
            let shares = responses
                .iter()
                .map(|response| Share::from_wire(&response.data.chunks[chunk_index].share))
                .collect::<UmbraResult<Vec<_>>>()?;
            share_sets.push(shares);
        }

        tracing::debug!(
            document = %document_id,
            chunks = chunk_count,
            nodes = entries.len(),
            "Reconstructing document"
        );
        self.codec.reconstruct_payload(&cluster_key, &share_sets)
    }
}

impl Default for DocumentFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ShareEnvelope;
    use crate::testutil::MemoryCluster;
    use crate::upload::VaultUploadClient;
    use assert_matches::assert_matches;
    use umbra_core::Keypair;

    async fn published_fixture() -> (Arc<crate::testutil::MemoryNodeApi>, Uuid, crate::UploadRecord, ClusterDescriptor)
    {
        let cluster = MemoryCluster::new(3);
        let descriptor = cluster.descriptor.clone();
        let api = Arc::new(cluster.api);
        let collection = Uuid::new_v4();
        let client = VaultUploadClient::with_api(
            Arc::clone(&api) as Arc<dyn NodeApi>,
            descriptor.clone(),
            collection,
            Keypair::generate(),
        );
        let record = client.publish("doc", &vec![9u8; 10_500]).await.unwrap();
        (api, collection, record, descriptor)
    }

    #[tokio::test]
    async fn test_publish_then_fetch_round_trip() {
        let (api, collection, record, _) = published_fixture().await;

        let fetcher = DocumentFetcher::with_api(api as Arc<dyn NodeApi>);
        let payload = fetcher
            .fetch_document(&record.read_token_bundle, collection, record.document_id)
            .await
            .unwrap();

        assert_eq!(payload, vec![9u8; 10_500]);
    }

    #[tokio::test]
    async fn test_tampered_stored_share_fails_reconstruction() {
        let (api, collection, record, descriptor) = published_fixture().await;

        let url = &descriptor.nodes[0].url;
        let mut stored = api
            .stored_record(url, collection, record.document_id)
            .unwrap();
        // Corrupt one wire share without breaking its encoding
        let share = umbra_secrets::Share::from_wire(&stored.chunks[0].share).unwrap();
        let mut tampered = share.clone();
        tampered.data[0] ^= 0xff;
        stored.chunks[0] = ShareEnvelope {
            share: tampered.to_wire(),
        };
        api.replace_record(url, collection, record.document_id, stored);

        let fetcher = DocumentFetcher::with_api(api as Arc<dyn NodeApi>);
        let result = fetcher
            .fetch_document(&record.read_token_bundle, collection, record.document_id)
            .await;

        assert_matches!(result, Err(UmbraError::Reconstruction { .. }));
    }

    #[tokio::test]
    async fn test_short_node_record_fails_reconstruction() {
        let (api, collection, record, descriptor) = published_fixture().await;

        let url = &descriptor.nodes[1].url;
        let mut stored = api
            .stored_record(url, collection, record.document_id)
            .unwrap();
        stored.chunks.pop();
        api.replace_record(url, collection, record.document_id, stored);

        let fetcher = DocumentFetcher::with_api(api as Arc<dyn NodeApi>);
        let result = fetcher
            .fetch_document(&record.read_token_bundle, collection, record.document_id)
            .await;

        assert_matches!(result, Err(UmbraError::Reconstruction { .. }));
    }
}
