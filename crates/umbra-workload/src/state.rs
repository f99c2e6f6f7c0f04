//! Processing session state
//!
//! Tagged states with the data that is only valid in that state attached to
//! it: the upload record exists only once uploaded, insights only once
//! complete, the failure message only once failed. Step progress is
//! monotonic; a completed step never reverts within one processing attempt.

use crate::steps::{ProcessingStep, StepGuide, StepRecord};
use serde::Serialize;
use time::OffsetDateTime;
use umbra_vault::UploadRecord;

/// Lifecycle of one document session
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ProcessingState {
    /// No document selected
    Idle,
    /// Upload in flight
    Uploading,
    /// Shares stored, read tokens minted, nothing processed yet
    Uploaded { record: UploadRecord },
    /// Workload running the step sequence
    Processing { step: ProcessingStep },
    /// Insights in hand, workload torn down
    Complete { insights: serde_json::Value },
    /// Terminal until an explicit reset
    Failed { message: String },
}

impl ProcessingState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProcessingState::Complete { .. } | ProcessingState::Failed { .. }
        )
    }
}

/// Everything an observer sees about the session at one instant
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: ProcessingState,
    /// All four steps, completion flags in execution order
    pub steps: Vec<StepRecord>,
    /// Completed fraction of the step sequence, 0.0 to 1.0
    pub progress: f64,
    /// Guide for the step currently executing; cleared on failure
    pub current_guide: Option<StepGuide>,
}

impl SessionSnapshot {
    pub fn idle() -> Self {
        SessionSnapshot {
            state: ProcessingState::Idle,
            steps: ProcessingStep::ALL.iter().map(|s| StepRecord::pending(*s)).collect(),
            progress: 0.0,
            current_guide: None,
        }
    }

    /// Reach `step`: marks it and every earlier step completed, with a
    /// timestamp for each step that just completed
    ///
    /// Moving to a step at or before one already reached is a no-op, so a
    /// late or duplicated stage signal cannot roll progress back.
    pub fn advance_to(&mut self, step: ProcessingStep) {
        if let ProcessingState::Processing { step: current } = &self.state {
            if step.index() <= current.index() {
                return;
            }
        }
        self.complete_through(step.index());
        self.state = ProcessingState::Processing { step };
        self.current_guide = Some(step.guide());
        self.progress = (step.index() + 1) as f64 / ProcessingStep::ALL.len() as f64;
    }

    /// Terminal success; all steps complete
    pub fn complete(&mut self, insights: serde_json::Value) {
        self.complete_through(ProcessingStep::ALL.len() - 1);
        self.state = ProcessingState::Complete { insights };
        self.progress = 1.0;
    }

    /// Terminal failure; completed steps stay completed
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = ProcessingState::Failed {
            message: message.into(),
        };
        self.current_guide = None;
    }

    fn complete_through(&mut self, index: usize) {
        let now = OffsetDateTime::now_utc();
        for record in self.steps.iter_mut().take(index + 1) {
            if !record.completed {
                record.completed = true;
                record.completed_at = Some(now);
            }
        }
    }
}
