//! The fixed four-step processing sequence
//!
//! Progress is reported against these steps, never skipping or reordering.
//! Each step carries a short user-facing guide explaining what the system is
//! doing with the document at that point.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One step of the processing sequence, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStep {
    /// Provision the confidential workload
    Init,
    /// Workload running; shares being fetched and reconstructed
    Process,
    /// Inference over the reconstructed document
    Insights,
    /// Teardown of the ephemeral workload
    Complete,
}

impl ProcessingStep {
    /// All steps, in execution order
    pub const ALL: [ProcessingStep; 4] = [
        ProcessingStep::Init,
        ProcessingStep::Process,
        ProcessingStep::Insights,
        ProcessingStep::Complete,
    ];

    /// Zero-based position in the sequence
    pub fn index(self) -> usize {
        match self {
            ProcessingStep::Init => 0,
            ProcessingStep::Process => 1,
            ProcessingStep::Insights => 2,
            ProcessingStep::Complete => 3,
        }
    }

    /// Short progress label
    pub fn message(self) -> &'static str {
        match self {
            ProcessingStep::Init => "Provisioning secure environment",
            ProcessingStep::Process => "Retrieving and reconstructing document",
            ProcessingStep::Insights => "Generating insights",
            ProcessingStep::Complete => "Cleaning up",
        }
    }

    /// User-facing explanation of the step
    pub fn guide(self) -> StepGuide {
        match self {
            ProcessingStep::Init => StepGuide {
                step: self,
                title: "Provisioning a confidential environment",
                description: "A dedicated, attestable compute environment is \
                     being created for this document. Nothing has left the \
                     storage nodes yet.",
            },
            ProcessingStep::Process => StepGuide {
                step: self,
                title: "Reassembling your document",
                description: "The environment fetches one share from each \
                     storage node and reconstructs the document in memory. \
                     No single node ever held a readable copy.",
            },
            ProcessingStep::Insights => StepGuide {
                step: self,
                title: "Analyzing the document",
                description: "A language model runs inside the confidential \
                     environment and produces insights. The document is not \
                     sent to any external service.",
            },
            ProcessingStep::Complete => StepGuide {
                step: self,
                title: "Destroying the environment",
                description: "The compute environment and its in-memory copy \
                     of the document are deleted. Only the encrypted shares \
                     remain on the storage nodes.",
            },
        }
    }
}

/// User-facing guide attached to the step currently executing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepGuide {
    pub step: ProcessingStep,
    pub title: &'static str,
    pub description: &'static str,
}

/// Progress entry for one step
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: ProcessingStep,
    pub message: &'static str,
    pub completed: bool,
    /// When the step completed; `None` while pending
    pub completed_at: Option<OffsetDateTime>,
}

impl StepRecord {
    pub fn pending(step: ProcessingStep) -> Self {
        StepRecord {
            step,
            message: step.message(),
            completed: false,
            completed_at: None,
        }
    }
}
