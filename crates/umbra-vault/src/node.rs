//! Storage-node API
//!
//! Each node exposes a create/read API guarded by bearer tokens. The trait
//! seam keeps the upload flow testable against in-memory nodes; the reqwest
//! implementation talks to real endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use umbra_core::{Did, NodeDescriptor, UmbraError, UmbraResult};
use uuid::Uuid;

/// Access-control entry attached to stored data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    /// Identity the entry grants rights to
    pub grantee: Did,

    /// Grantee may read the data
    pub read: bool,

    /// Grantee may modify the data
    pub write: bool,

    /// Grantee may run queries over the data
    pub execute: bool,
}

/// One share per chunk, as an opaque wire string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareEnvelope {
    /// Encoded share for this node
    #[serde(rename = "%share")]
    pub share: String,
}

/// The per-node record holding one node's shares of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRecord {
    /// Document identifier, identical across all nodes
    #[serde(rename = "_id")]
    pub id: Uuid,

    /// This node's share of every chunk, in chunk order
    pub chunks: Vec<ShareEnvelope>,
}

/// Body of a data-creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDataRequest {
    /// Identity that owns the document
    pub owner: Did,

    /// Access grant for the platform builder
    pub acl: AclEntry,

    /// Collection the document belongs to
    pub collection: Uuid,

    /// Records to create
    pub data: Vec<DataRecord>,
}

/// Identifiers created by a data-creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedIds {
    /// Ids of the created records
    pub created: Vec<Uuid>,
}

/// Response to a data-creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDataResponse {
    /// Creation outcome
    pub data: CreatedIds,
}

/// Response to a data read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadDataResponse {
    /// The node's record for the requested document
    pub data: DataRecord,
}

/// Storage-node operations used by the upload and fetch flows
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Create records on a node under a bearer token
    async fn create_data(
        &self,
        node: &NodeDescriptor,
        bearer: &str,
        request: &CreateDataRequest,
    ) -> UmbraResult<CreateDataResponse>;

    /// Read a document's record from a node under a bearer token
    async fn read_data(
        &self,
        node: &NodeDescriptor,
        bearer: &str,
        collection_id: Uuid,
        document_id: Uuid,
    ) -> UmbraResult<ReadDataResponse>;
}

/// Reqwest-backed storage-node client
#[derive(Default)]
pub struct HttpNodeClient {
    client: reqwest::Client,
}

impl HttpNodeClient {
    /// Create a client with default settings
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NodeApi for HttpNodeClient {
    async fn create_data(
        &self,
        node: &NodeDescriptor,
        bearer: &str,
        request: &CreateDataRequest,
    ) -> UmbraResult<CreateDataResponse> {
        let url = format!("{}/v1/users/data", node.url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(bearer)
            .json(request)
            .send()
            .await
            .map_err(|e| UmbraError::network(format!("Failed to reach {}: {}", node.url, e)))?;

        if !response.status().is_success() {
            return Err(UmbraError::network(format!(
                "Node {} rejected create: {}",
                node.url,
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            UmbraError::serialization(format!("Malformed create response from {}: {}", node.url, e))
        })
    }

    async fn read_data(
        &self,
        node: &NodeDescriptor,
        bearer: &str,
        collection_id: Uuid,
        document_id: Uuid,
    ) -> UmbraResult<ReadDataResponse> {
        let url = format!(
            "{}/v1/users/data/{}/{}",
            node.url, collection_id, document_id
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| UmbraError::network(format!("Failed to reach {}: {}", node.url, e)))?;

        if !response.status().is_success() {
            return Err(UmbraError::network(format!(
                "Node {} rejected read: {}",
                node.url,
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            UmbraError::serialization(format!("Malformed read response from {}: {}", node.url, e))
        })
    }
}
