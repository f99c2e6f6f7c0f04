//! Session configuration
//!
//! All externally supplied surface: the storage-node list, the authorization
//! service endpoint, the collection identifier, the builder credential, and
//! workload-orchestration tuning. Loaded from TOML; none of it is produced by
//! the core logic.

use crate::{ClusterDescriptor, NodeDescriptor, UmbraError, UmbraResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Top-level Umbra configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UmbraConfig {
    /// Storage nodes, in shard order
    pub nodes: Vec<NodeDescriptor>,

    /// Authorization-service endpoint
    pub auth_url: String,

    /// Collection the session publishes documents into
    pub collection_id: Uuid,

    /// Hex-encoded seed of the pre-provisioned builder key
    pub builder_key: String,

    /// Compute-workload settings
    #[serde(default)]
    pub workload: WorkloadConfig,
}

/// Settings for the ephemeral compute workload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Workload-orchestration API base URL
    #[serde(default = "default_orchestrator_url")]
    pub orchestrator_url: String,

    /// Base URL the ephemeral workload's inference-status endpoint is
    /// reachable through
    #[serde(default = "default_inference_url")]
    pub inference_url: String,

    /// Workload name submitted on creation
    #[serde(default = "default_workload_name")]
    pub name: String,

    /// Artifacts version for the workload image
    #[serde(default = "default_artifacts_version")]
    pub artifacts_version: String,

    /// Compose specification submitted with the creation request
    #[serde(default)]
    pub compose: String,

    /// Publicly reachable container name
    #[serde(default = "default_container_name")]
    pub container_name: String,

    /// Publicly reachable container port
    #[serde(default = "default_container_port")]
    pub container_port: u16,

    /// Memory limit in MiB
    #[serde(default = "default_memory")]
    pub memory: u32,

    /// CPU count
    #[serde(default = "default_cpus")]
    pub cpus: u32,

    /// Disk size in GiB
    #[serde(default = "default_disk")]
    pub disk: u32,

    /// GPU count
    #[serde(default)]
    pub gpus: u32,

    /// Initial polling interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Polling interval cap in milliseconds (exponential backoff)
    #[serde(default = "default_poll_max_interval_ms")]
    pub poll_max_interval_ms: u64,

    /// Deadline for any single polling wait, in seconds
    #[serde(default = "default_poll_deadline_secs")]
    pub poll_deadline_secs: u64,
}

fn default_orchestrator_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_inference_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_workload_name() -> String {
    "umbra-insights-workload".to_string()
}

fn default_artifacts_version() -> String {
    "0.1.2".to_string()
}

fn default_container_name() -> String {
    "umbra-insights".to_string()
}

fn default_container_port() -> u16 {
    8080
}

fn default_memory() -> u32 {
    1024
}

fn default_cpus() -> u32 {
    1
}

fn default_disk() -> u32 {
    10
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_poll_max_interval_ms() -> u64 {
    10_000
}

fn default_poll_deadline_secs() -> u64 {
    300
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        WorkloadConfig {
            orchestrator_url: default_orchestrator_url(),
            inference_url: default_inference_url(),
            name: default_workload_name(),
            artifacts_version: default_artifacts_version(),
            compose: String::new(),
            container_name: default_container_name(),
            container_port: default_container_port(),
            memory: default_memory(),
            cpus: default_cpus(),
            disk: default_disk(),
            gpus: 0,
            poll_interval_ms: default_poll_interval_ms(),
            poll_max_interval_ms: default_poll_max_interval_ms(),
            poll_deadline_secs: default_poll_deadline_secs(),
        }
    }
}

impl UmbraConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(raw: &str) -> UmbraResult<Self> {
        let config: UmbraConfig = toml::from_str(raw)
            .map_err(|e| UmbraError::config(format!("Failed to parse configuration: {}", e)))?;
        config.cluster()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> UmbraResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            UmbraError::config(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&raw)
    }

    /// The cluster descriptor configured for this session
    pub fn cluster(&self) -> UmbraResult<ClusterDescriptor> {
        ClusterDescriptor::new(self.nodes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Keypair;

    fn sample_toml() -> String {
        let key = Keypair::generate();
        format!(
            r#"
            auth_url = "https://auth.example"
            collection_id = "ce9b1d1c-8006-4053-a0c8-f46ad711fc26"
            builder_key = "{}"

            [[nodes]]
            url = "https://node-1.example"
            public_key = "{}"

            [[nodes]]
            url = "https://node-2.example"
            public_key = "{}"

            [workload]
            orchestrator_url = "https://compute.example"
            "#,
            hex::encode([7u8; 32]),
            key.public_key_hex(),
            Keypair::generate().public_key_hex(),
        )
    }

    #[test]
    fn test_parse_config_with_defaults() {
        let config = UmbraConfig::from_toml_str(&sample_toml()).unwrap();

        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.workload.orchestrator_url, "https://compute.example");
        assert_eq!(config.workload.container_port, 8080);
        assert_eq!(config.workload.poll_interval_ms, 1000);
        assert_eq!(config.cluster().unwrap().fan_out(), 2);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("umbra.toml");
        std::fs::write(&path, sample_toml()).unwrap();

        let config = UmbraConfig::load(&path).unwrap();
        assert_eq!(config.nodes.len(), 2);

        assert!(UmbraConfig::load(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_config_rejects_empty_node_list() {
        let raw = r#"
            nodes = []
            auth_url = "https://auth.example"
            collection_id = "ce9b1d1c-8006-4053-a0c8-f46ad711fc26"
            builder_key = "00"
        "#;
        assert!(UmbraConfig::from_toml_str(raw).is_err());
    }
}
