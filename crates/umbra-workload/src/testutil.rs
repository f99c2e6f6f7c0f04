//! Scripted workload API for tests

use crate::api::{
    CreateWorkloadRequest, InferenceState, InferenceStatus, WorkloadApi, WorkloadDescriptor,
    WorkloadStatus,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use umbra_core::{UmbraError, UmbraResult, WorkloadConfig};
use umbra_vault::{UploadRecord, UploadStatus};
use uuid::Uuid;

/// Polling tuning small enough to keep tests fast
pub(crate) fn fast_config() -> WorkloadConfig {
    WorkloadConfig {
        poll_interval_ms: 1,
        poll_max_interval_ms: 5,
        poll_deadline_secs: 1,
        ..WorkloadConfig::default()
    }
}

pub(crate) fn sample_record() -> UploadRecord {
    UploadRecord {
        upload_id: Uuid::new_v4(),
        document_id: Uuid::new_v4(),
        collection_id: Uuid::new_v4(),
        read_token_bundle: "bundle".to_string(),
        file_name: "statement.pdf".to_string(),
        file_size: 12_000,
        status: UploadStatus::Uploaded,
    }
}

/// [`WorkloadApi`] implementation answering from scripted queues
///
/// An empty status queue answers `scheduled`; an empty inference queue
/// answers `pending`. Deletion always succeeds and is counted.
pub(crate) struct MockWorkloadApi {
    statuses: Mutex<VecDeque<WorkloadStatus>>,
    inference: Mutex<VecDeque<InferenceStatus>>,
    status_polls: AtomicUsize,
    delete_calls: AtomicUsize,
    pub fail_create: bool,
    last_create: Mutex<Option<CreateWorkloadRequest>>,
}

impl MockWorkloadApi {
    pub fn new() -> Self {
        MockWorkloadApi {
            statuses: Mutex::new(VecDeque::new()),
            inference: Mutex::new(VecDeque::new()),
            status_polls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            fail_create: false,
            last_create: Mutex::new(None),
        }
    }

    pub fn push_statuses(&self, statuses: impl IntoIterator<Item = WorkloadStatus>) {
        self.statuses.lock().unwrap().extend(statuses);
    }

    pub fn push_inference(&self, statuses: impl IntoIterator<Item = InferenceStatus>) {
        self.inference.lock().unwrap().extend(statuses);
    }

    pub fn status_polls(&self) -> usize {
        self.status_polls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn last_create(&self) -> Option<CreateWorkloadRequest> {
        self.last_create.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkloadApi for MockWorkloadApi {
    async fn create(&self, request: &CreateWorkloadRequest) -> UmbraResult<WorkloadDescriptor> {
        if self.fail_create {
            return Err(UmbraError::network("orchestrator is down"));
        }
        *self.last_create.lock().unwrap() = Some(request.clone());
        Ok(WorkloadDescriptor {
            workload_id: request.workload_id,
            status: WorkloadStatus::Scheduled,
        })
    }

    async fn status(&self, _workload_id: Uuid) -> UmbraResult<WorkloadStatus> {
        self.status_polls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(WorkloadStatus::Scheduled))
    }

    async fn delete(&self, _workload_id: Uuid) -> UmbraResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn inference_status(&self, _workload_id: Uuid) -> UmbraResult<InferenceStatus> {
        Ok(self
            .inference
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(InferenceStatus {
                state: InferenceState::Pending,
                result: None,
                error: None,
            }))
    }
}
