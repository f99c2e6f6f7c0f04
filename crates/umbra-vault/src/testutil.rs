//! In-memory storage nodes for tests

use crate::node::{
    CreateDataRequest, CreateDataResponse, CreatedIds, DataRecord, NodeApi, ReadDataResponse,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use umbra_authorization::{verify_envelope, TokenEnvelope};
use umbra_core::{unix_now, ClusterDescriptor, Did, Keypair, NodeDescriptor, UmbraError, UmbraResult};
use uuid::Uuid;

/// A cluster of in-memory nodes that verify bearer tokens like real ones
pub(crate) struct MemoryCluster {
    pub descriptor: ClusterDescriptor,
    pub api: MemoryNodeApi,
}

impl MemoryCluster {
    pub fn new(n: usize) -> Self {
        let mut dids = HashMap::new();
        let nodes = (0..n)
            .map(|i| {
                let keypair = Keypair::generate();
                let url = format!("https://node-{}.example", i);
                dids.insert(url.clone(), keypair.did());
                NodeDescriptor {
                    url,
                    public_key: keypair.public_key_hex(),
                }
            })
            .collect();

        MemoryCluster {
            descriptor: ClusterDescriptor::new(nodes).unwrap(),
            api: MemoryNodeApi {
                dids,
                store: Mutex::new(HashMap::new()),
                fail_urls: HashSet::new(),
            },
        }
    }
}

/// Token-verifying in-memory implementation of [`NodeApi`]
pub(crate) struct MemoryNodeApi {
    dids: HashMap<String, Did>,
    store: Mutex<HashMap<(String, Uuid, Uuid), DataRecord>>,
    pub fail_urls: HashSet<String>,
}

impl MemoryNodeApi {
    fn check_bearer(&self, node: &NodeDescriptor, bearer: &str) -> UmbraResult<()> {
        let did = self
            .dids
            .get(&node.url)
            .ok_or_else(|| UmbraError::network(format!("Unknown node {}", node.url)))?;
        let envelope = TokenEnvelope::decode(bearer)?;
        verify_envelope(&envelope, did, unix_now())
    }

    pub fn stored_record(&self, url: &str, collection: Uuid, document: Uuid) -> Option<DataRecord> {
        self.store
            .lock()
            .unwrap()
            .get(&(url.to_string(), collection, document))
            .cloned()
    }

    pub fn replace_record(&self, url: &str, collection: Uuid, document: Uuid, record: DataRecord) {
        self.store
            .lock()
            .unwrap()
            .insert((url.to_string(), collection, document), record);
    }
}

#[async_trait]
impl NodeApi for MemoryNodeApi {
    async fn create_data(
        &self,
        node: &NodeDescriptor,
        bearer: &str,
        request: &CreateDataRequest,
    ) -> UmbraResult<CreateDataResponse> {
        if self.fail_urls.contains(&node.url) {
            return Err(UmbraError::network(format!("{} is down", node.url)));
        }
        self.check_bearer(node, bearer)?;

        let mut created = Vec::new();
        let mut store = self.store.lock().unwrap();
        for record in &request.data {
            store.insert(
                (node.url.clone(), request.collection, record.id),
                record.clone(),
            );
            created.push(record.id);
        }

        Ok(CreateDataResponse {
            data: CreatedIds { created },
        })
    }

    async fn read_data(
        &self,
        node: &NodeDescriptor,
        bearer: &str,
        collection_id: Uuid,
        document_id: Uuid,
    ) -> UmbraResult<ReadDataResponse> {
        if self.fail_urls.contains(&node.url) {
            return Err(UmbraError::network(format!("{} is down", node.url)));
        }
        self.check_bearer(node, bearer)?;

        let store = self.store.lock().unwrap();
        let record = store
            .get(&(node.url.clone(), collection_id, document_id))
            .cloned()
            .ok_or_else(|| {
                UmbraError::network(format!("{} has no document {}", node.url, document_id))
            })?;

        Ok(ReadDataResponse { data: record })
    }
}
