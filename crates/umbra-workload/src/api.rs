//! Wire types and transport for the workload-orchestration service
//!
//! Two HTTP surfaces: the orchestrator itself (create, status, delete) and
//! the inference-status endpoint the ephemeral workload exposes once it is
//! running. Both sit behind the [`WorkloadApi`] trait so orchestration logic
//! tests against in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use umbra_core::{UmbraError, UmbraResult, WorkloadConfig};
use uuid::Uuid;

/// Remote lifecycle status of a workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadStatus {
    /// Accepted but not yet serving
    Scheduled,
    /// Serving; the inference endpoint is reachable
    Running,
    /// Any status string this client does not model
    #[serde(other)]
    Unknown,
}

/// A created workload as the orchestrator reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadDescriptor {
    pub workload_id: Uuid,
    pub status: WorkloadStatus,
}

/// Body of the workload-creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkloadRequest {
    pub name: String,
    pub artifacts_version: String,
    pub docker_compose: String,
    /// Environment handed to the workload; carries the document coordinates
    /// and the read-token bundle
    pub env_vars: HashMap<String, String>,
    pub public_container_name: String,
    pub public_container_port: u16,
    pub memory: u32,
    pub cpus: u32,
    pub disk: u32,
    pub gpus: u32,
    /// Client-generated identifier; the orchestrator echoes it back
    pub workload_id: Uuid,
    /// Initial lifecycle status, always `scheduled`
    pub status: WorkloadStatus,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteWorkloadRequest {
    workload_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: WorkloadStatus,
}

/// State of the inference job inside a running workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceState {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Result payload of a completed inference job
///
/// The insights are opaque to the client; they pass through as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceResult {
    pub message: serde_json::Value,
}

/// Snapshot of the inference job, as reported by the workload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceStatus {
    pub state: InferenceState,
    #[serde(default)]
    pub result: Option<InferenceResult>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Operations against the orchestration service and a running workload
#[async_trait]
pub trait WorkloadApi: Send + Sync {
    /// Submit a workload for creation
    async fn create(&self, request: &CreateWorkloadRequest) -> UmbraResult<WorkloadDescriptor>;

    /// Current lifecycle status of a workload
    async fn status(&self, workload_id: Uuid) -> UmbraResult<WorkloadStatus>;

    /// Delete a workload; deleting an already-deleted workload succeeds
    async fn delete(&self, workload_id: Uuid) -> UmbraResult<()>;

    /// Inference-job status served by the workload itself
    async fn inference_status(&self, workload_id: Uuid) -> UmbraResult<InferenceStatus>;
}

/// HTTP implementation of [`WorkloadApi`]
pub struct HttpWorkloadClient {
    client: reqwest::Client,
    orchestrator_url: String,
    inference_url: String,
}

impl HttpWorkloadClient {
    pub fn new(config: &WorkloadConfig) -> Self {
        HttpWorkloadClient {
            client: reqwest::Client::new(),
            orchestrator_url: config.orchestrator_url.trim_end_matches('/').to_string(),
            inference_url: config.inference_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl WorkloadApi for HttpWorkloadClient {
    async fn create(&self, request: &CreateWorkloadRequest) -> UmbraResult<WorkloadDescriptor> {
        let url = format!("{}/api/v1/workloads/create", self.orchestrator_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| UmbraError::network(format!("POST {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(UmbraError::network(format!(
                "POST {} returned {}",
                url,
                response.status()
            )));
        }

        response
            .json::<WorkloadDescriptor>()
            .await
            .map_err(|e| UmbraError::serialization(format!("Invalid create response: {}", e)))
    }

    async fn status(&self, workload_id: Uuid) -> UmbraResult<WorkloadStatus> {
        let url = format!("{}/api/v1/workloads/{}", self.orchestrator_url, workload_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| UmbraError::network(format!("GET {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(UmbraError::network(format!(
                "GET {} returned {}",
                url,
                response.status()
            )));
        }

        let status: StatusResponse = response
            .json()
            .await
            .map_err(|e| UmbraError::serialization(format!("Invalid status response: {}", e)))?;
        Ok(status.status)
    }

    async fn delete(&self, workload_id: Uuid) -> UmbraResult<()> {
        let url = format!("{}/api/v1/workloads/delete", self.orchestrator_url);
        let response = self
            .client
            .post(&url)
            .json(&DeleteWorkloadRequest { workload_id })
            .send()
            .await
            .map_err(|e| UmbraError::network(format!("POST {} failed: {}", url, e)))?;

        // An already-gone workload is the state we wanted
        let status = response.status();
        if status.is_success()
            || status == reqwest::StatusCode::NOT_FOUND
            || status == reqwest::StatusCode::GONE
        {
            return Ok(());
        }

        Err(UmbraError::network(format!(
            "POST {} returned {}",
            url, status
        )))
    }

    async fn inference_status(&self, workload_id: Uuid) -> UmbraResult<InferenceStatus> {
        let url = format!("{}/workload/{}/status", self.inference_url, workload_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| UmbraError::network(format!("GET {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(UmbraError::network(format!(
                "GET {} returned {}",
                url,
                response.status()
            )));
        }

        response
            .json::<InferenceStatus>()
            .await
            .map_err(|e| UmbraError::serialization(format!("Invalid inference status: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workload_status_decodes_unknown_strings() {
        let status: WorkloadStatus = serde_json::from_str("\"terminating\"").unwrap();
        assert_eq!(status, WorkloadStatus::Unknown);

        let status: WorkloadStatus = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(status, WorkloadStatus::Running);
    }

    #[test]
    fn test_create_request_uses_camel_case_wire_names() {
        let request = CreateWorkloadRequest {
            name: "umbra-insights-workload".to_string(),
            artifacts_version: "0.1.2".to_string(),
            docker_compose: "services: {}".to_string(),
            env_vars: HashMap::from([(
                "DOCUMENT_ID".to_string(),
                "d".to_string(),
            )]),
            public_container_name: "umbra-insights".to_string(),
            public_container_port: 8080,
            memory: 1024,
            cpus: 1,
            disk: 10,
            gpus: 0,
            workload_id: Uuid::new_v4(),
            status: WorkloadStatus::Scheduled,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("artifactsVersion").is_some());
        assert!(value.get("dockerCompose").is_some());
        assert!(value.get("publicContainerPort").is_some());
        assert!(value.get("envVars").is_some());
        assert!(value.get("workloadId").is_some());
        assert_eq!(value["status"], "scheduled");
    }

    #[test]
    fn test_inference_status_tolerates_missing_fields() {
        let status: InferenceStatus = serde_json::from_str(r#"{"state":"pending"}"#).unwrap();
        assert_eq!(status.state, InferenceState::Pending);
        assert!(status.result.is_none());
        assert!(status.error.is_none());
    }
}
