//! One document session, end to end
//!
//! Composes the vault upload client and the workload orchestrator behind a
//! single state machine. Observers subscribe to a watch channel and receive
//! immutable snapshots; nothing outside this module mutates session state.

use crate::orchestrator::{WorkloadOrchestrator, WorkloadStage};
use crate::state::{ProcessingState, SessionSnapshot};
use crate::steps::ProcessingStep;
use tokio::sync::watch;
use umbra_core::{UmbraConfig, UmbraError, UmbraResult};
use umbra_vault::{UploadRecord, VaultUploadClient};

/// Drives one document from upload through insights
pub struct ProcessingSession {
    vault: VaultUploadClient,
    orchestrator: WorkloadOrchestrator,
    snapshot: watch::Sender<SessionSnapshot>,
    // Keeps the channel open with zero external subscribers
    _observer: watch::Receiver<SessionSnapshot>,
}

impl ProcessingSession {
    /// Build a session from configuration, talking HTTP to real services
    pub fn new(config: &UmbraConfig) -> UmbraResult<Self> {
        Ok(Self::with_parts(
            VaultUploadClient::new(config)?,
            WorkloadOrchestrator::new(config.workload.clone()),
        ))
    }

    /// Build a session from pre-constructed components
    pub fn with_parts(vault: VaultUploadClient, orchestrator: WorkloadOrchestrator) -> Self {
        let (snapshot, observer) = watch::channel(SessionSnapshot::idle());
        ProcessingSession {
            vault,
            orchestrator,
            snapshot,
            _observer: observer,
        }
    }

    /// Subscribe to state snapshots
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    /// The current snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Publish a document to the vault
    ///
    /// Only valid from `Idle`; a failed session stays failed until
    /// [`reset`](Self::reset).
    pub async fn upload(&self, file_name: &str, payload: &[u8]) -> UmbraResult<UploadRecord> {
        if !matches!(self.snapshot.borrow().state, ProcessingState::Idle) {
            return Err(UmbraError::invalid(
                "Upload requires an idle session".to_string(),
            ));
        }

        self.snapshot
            .send_modify(|s| s.state = ProcessingState::Uploading);

        match self.vault.publish(file_name, payload).await {
            Ok(record) => {
                self.snapshot.send_modify(|s| {
                    s.state = ProcessingState::Uploaded {
                        record: record.clone(),
                    };
                });
                Ok(record)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Run the workload over the uploaded document and return the insights
    pub async fn process(&self, record: &UploadRecord) -> UmbraResult<serde_json::Value> {
        if !matches!(self.snapshot.borrow().state, ProcessingState::Uploaded { .. }) {
            return Err(UmbraError::invalid(
                "Processing requires an uploaded document".to_string(),
            ));
        }

        self.snapshot
            .send_modify(|s| s.advance_to(ProcessingStep::Init));

        let tx = &self.snapshot;
        let outcome = self
            .orchestrator
            .execute(record, |stage| {
                let step = match stage {
                    WorkloadStage::Created => ProcessingStep::Init,
                    WorkloadStage::Running => ProcessingStep::Process,
                    WorkloadStage::InsightsReady => ProcessingStep::Insights,
                    WorkloadStage::Deleted => ProcessingStep::Complete,
                };
                tx.send_modify(|s| s.advance_to(step));
            })
            .await;

        match outcome {
            Ok(result) => {
                let insights = result.message;
                self.snapshot.send_modify(|s| s.complete(insights.clone()));
                Ok(insights)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Upload and process in one call
    pub async fn run(&self, file_name: &str, payload: &[u8]) -> UmbraResult<serde_json::Value> {
        let record = self.upload(file_name, payload).await?;
        self.process(&record).await
    }

    /// Return to `Idle`, discarding all per-document state
    pub fn reset(&self) {
        self.snapshot.send_replace(SessionSnapshot::idle());
    }

    fn fail(&self, error: &UmbraError) {
        // A remote inference failure surfaces its message untouched; every
        // other error keeps its category prefix
        let message = match error {
            UmbraError::Inference { message } => message.clone(),
            other => other.to_string(),
        };
        tracing::error!(%error, "Session failed");
        self.snapshot.send_modify(|s| s.fail(message));
    }
}
