//! Workload lifecycle orchestration
//!
//! Owns the create, wait for running, wait for result, delete sequence.
//! Both waits are bounded: polling backs off exponentially up to a cap and
//! gives up at a deadline. Teardown runs whether the sequence succeeded or
//! failed; an ephemeral workload outliving its job leaks the compute slot and
//! the read tokens it holds.

use crate::api::{
    CreateWorkloadRequest, HttpWorkloadClient, InferenceResult, InferenceState, WorkloadApi,
    WorkloadDescriptor, WorkloadStatus,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use umbra_core::{UmbraError, UmbraResult, WorkloadConfig};
use umbra_vault::UploadRecord;
use uuid::Uuid;

/// Bounded-wait tuning for status polls
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// First wait between polls
    pub initial: Duration,
    /// Backoff cap
    pub max: Duration,
    /// Overall deadline for a single wait
    pub deadline: Duration,
}

impl PollPolicy {
    pub fn from_config(config: &WorkloadConfig) -> Self {
        PollPolicy {
            initial: Duration::from_millis(config.poll_interval_ms),
            max: Duration::from_millis(config.poll_max_interval_ms),
            deadline: Duration::from_secs(config.poll_deadline_secs),
        }
    }

    fn next_delay(&self, current: Duration) -> Duration {
        (current * 2).min(self.max)
    }
}

/// Stages of one orchestrated workload run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadStage {
    /// The orchestrator accepted the creation request
    Created,
    /// The workload reported `running`
    Running,
    /// Inference completed and the result is in hand
    InsightsReady,
    /// The workload was torn down
    Deleted,
}

/// Drives one workload from creation through teardown
pub struct WorkloadOrchestrator {
    api: Arc<dyn WorkloadApi>,
    config: WorkloadConfig,
    policy: PollPolicy,
}

impl WorkloadOrchestrator {
    /// Build an orchestrator talking HTTP to the real service
    pub fn new(config: WorkloadConfig) -> Self {
        let api = Arc::new(HttpWorkloadClient::new(&config));
        Self::with_api(api, config)
    }

    /// Build an orchestrator over any [`WorkloadApi`] implementation
    pub fn with_api(api: Arc<dyn WorkloadApi>, config: WorkloadConfig) -> Self {
        let policy = PollPolicy::from_config(&config);
        WorkloadOrchestrator {
            api,
            config,
            policy,
        }
    }

    /// Run the full lifecycle for one uploaded document
    ///
    /// `on_stage` fires once per [`WorkloadStage`], in order. Teardown is
    /// attempted on every exit path; a teardown failure after a successful
    /// run is logged, not surfaced.
    pub async fn execute<F>(
        &self,
        record: &UploadRecord,
        mut on_stage: F,
    ) -> UmbraResult<InferenceResult>
    where
        F: FnMut(WorkloadStage),
    {
        let descriptor = self.create(record).await?;
        on_stage(WorkloadStage::Created);

        let outcome = self.drive(descriptor.workload_id, &mut on_stage).await;

        match self.delete(descriptor.workload_id).await {
            Ok(()) => on_stage(WorkloadStage::Deleted),
            Err(e) => {
                tracing::warn!(
                    workload_id = %descriptor.workload_id,
                    error = %e,
                    "Workload teardown failed"
                );
            }
        }

        outcome
    }

    async fn drive<F>(&self, workload_id: Uuid, on_stage: &mut F) -> UmbraResult<InferenceResult>
    where
        F: FnMut(WorkloadStage),
    {
        self.await_running(workload_id).await?;
        on_stage(WorkloadStage::Running);

        let result = self.await_result(workload_id).await?;
        on_stage(WorkloadStage::InsightsReady);
        Ok(result)
    }

    /// Submit the creation request for one uploaded document
    pub async fn create(&self, record: &UploadRecord) -> UmbraResult<WorkloadDescriptor> {
        let request = CreateWorkloadRequest {
            name: self.config.name.clone(),
            artifacts_version: self.config.artifacts_version.clone(),
            docker_compose: self.config.compose.clone(),
            env_vars: HashMap::from([
                ("DOCUMENT_ID".to_string(), record.document_id.to_string()),
                (
                    "COLLECTION_ID".to_string(),
                    record.collection_id.to_string(),
                ),
                (
                    "DELEGATION_TOKENS".to_string(),
                    record.read_token_bundle.clone(),
                ),
            ]),
            public_container_name: self.config.container_name.clone(),
            public_container_port: self.config.container_port,
            memory: self.config.memory,
            cpus: self.config.cpus,
            disk: self.config.disk,
            gpus: self.config.gpus,
            workload_id: Uuid::new_v4(),
            status: WorkloadStatus::Scheduled,
        };

        let descriptor = self
            .api
            .create(&request)
            .await
            .map_err(|e| UmbraError::workload_create(e.to_string()))?;

        tracing::info!(
            workload_id = %descriptor.workload_id,
            document_id = %record.document_id,
            "Workload created"
        );
        Ok(descriptor)
    }

    /// Poll until the workload reports `running`
    pub async fn await_running(&self, workload_id: Uuid) -> UmbraResult<()> {
        let started = tokio::time::Instant::now();
        let mut delay = self.policy.initial;

        loop {
            let status = self
                .api
                .status(workload_id)
                .await
                .map_err(|e| UmbraError::workload_poll(e.to_string()))?;

            match status {
                WorkloadStatus::Running => {
                    tracing::debug!(%workload_id, "Workload running");
                    return Ok(());
                }
                WorkloadStatus::Scheduled | WorkloadStatus::Unknown => {}
            }

            if started.elapsed() + delay > self.policy.deadline {
                return Err(UmbraError::timeout(format!(
                    "Workload {} not running after {:?}",
                    workload_id, self.policy.deadline
                )));
            }
            tokio::time::sleep(delay).await;
            delay = self.policy.next_delay(delay);
        }
    }

    /// Poll the inference endpoint until the job completes or fails
    pub async fn await_result(&self, workload_id: Uuid) -> UmbraResult<InferenceResult> {
        let started = tokio::time::Instant::now();
        let mut delay = self.policy.initial;

        loop {
            let status = self
                .api
                .inference_status(workload_id)
                .await
                .map_err(|e| UmbraError::workload_poll(e.to_string()))?;

            match status.state {
                InferenceState::Completed => {
                    return status.result.ok_or_else(|| {
                        UmbraError::inference("Job completed without a result".to_string())
                    });
                }
                InferenceState::Failed => {
                    // The remote message passes through untouched
                    return Err(UmbraError::inference(
                        status.error.unwrap_or_else(|| "Job failed".to_string()),
                    ));
                }
                InferenceState::Pending | InferenceState::Processing => {}
            }

            if started.elapsed() + delay > self.policy.deadline {
                return Err(UmbraError::timeout(format!(
                    "Inference for workload {} incomplete after {:?}",
                    workload_id, self.policy.deadline
                )));
            }
            tokio::time::sleep(delay).await;
            delay = self.policy.next_delay(delay);
        }
    }

    /// Tear the workload down; repeating the call is well defined
    pub async fn delete(&self, workload_id: Uuid) -> UmbraResult<()> {
        self.api.delete(workload_id).await?;
        tracing::info!(%workload_id, "Workload deleted");
        Ok(())
    }
}
