//! Ephemeral compute workloads and the processing session
//!
//! Everything past the upload: create a confidential workload over an
//! uploaded document, poll it to readiness, collect the inference result,
//! and tear the workload down. [`ProcessingSession`] wraps the whole
//! sequence in an observable state machine.

pub mod api;
pub mod orchestrator;
pub mod session;
pub mod state;
pub mod steps;

#[cfg(test)]
pub(crate) mod testutil;

pub use api::{
    CreateWorkloadRequest, HttpWorkloadClient, InferenceResult, InferenceState, InferenceStatus,
    WorkloadApi, WorkloadDescriptor, WorkloadStatus,
};
pub use orchestrator::{PollPolicy, WorkloadOrchestrator, WorkloadStage};
pub use session::ProcessingSession;
pub use state::{ProcessingState, SessionSnapshot};
pub use steps::{ProcessingStep, StepGuide, StepRecord};
