//! Generation job record and its state machine.
//!
//! All mutations go through the transition methods below; they reject
//! anything the record invariants forbid, so a store never has to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::request::GenerationRequest;
use crate::result_data::{ResultData, StepOutput};
use crate::step::{StepName, StepRecord, StepStatus};

/// Unique identifier for a generation job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the submitting user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Pipeline running (or about to)
    #[default]
    Processing,
    /// All steps completed
    Completed,
    /// A step failed; no further steps run
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cause recorded when a job fails.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobFailure {
    /// The step that failed
    pub step: StepName,
    /// Human-readable cause
    pub message: String,
}

/// Rejected state transition or step-update payload.
#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("Job is already {0}")]
    JobTerminal(JobStatus),

    #[error("Step {step} cannot go from {from} to {to}")]
    InvalidStepTransition {
        step: StepName,
        from: StepStatus,
        to: StepStatus,
    },

    #[error("Step {0} cannot start: another step is processing")]
    StepAlreadyProcessing(StepName),

    #[error("Step {0} cannot start: an earlier step has not completed")]
    PriorStepIncomplete(StepName),

    #[error("Job cannot complete: step {0} is {1}")]
    StepsIncomplete(StepName, StepStatus),

    #[error("Invalid step output: {0}")]
    InvalidOutput(String),
}

/// One generation job: identity, status, the fixed ordered step list and
/// the results accumulated so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationJob {
    /// Unique job ID
    pub job_id: JobId,

    /// Submitting user; checked on every read
    pub owner_id: OwnerId,

    /// Job state; advances to a terminal value exactly once
    #[serde(default)]
    pub status: JobStatus,

    /// The four pipeline steps, fixed order, created with the job
    pub steps: Vec<StepRecord>,

    /// Accumulated step output, namespaced per step
    #[serde(default)]
    pub result_data: ResultData,

    /// Present only when `status` is `failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JobFailure>,

    /// Original submission payload
    pub request: GenerationRequest,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,

    /// Bumped on every mutation; backs conditional store writes
    #[serde(default)]
    pub revision: u64,
}

impl GenerationJob {
    /// Create a new job with all steps pending.
    pub fn new(owner_id: OwnerId, request: GenerationRequest) -> Self {
        let now = Utc::now();
        Self {
            job_id: JobId::new(),
            owner_id,
            status: JobStatus::Processing,
            steps: StepName::ALL.iter().map(|s| StepRecord::pending(*s)).collect(),
            result_data: ResultData::new(),
            error: None,
            request,
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Step record at a fixed pipeline position.
    pub fn step(&self, name: StepName) -> &StepRecord {
        &self.steps[name.index()]
    }

    /// Index of the step currently `processing`, if any.
    pub fn processing_step(&self) -> Option<usize> {
        self.steps.iter().position(|s| s.status == StepStatus::Processing)
    }

    /// Number of completed steps.
    pub fn completed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count()
    }

    /// Progress as a percentage of completed steps.
    ///
    /// A pure function of the record; wall-clock never enters into it.
    pub fn progress_percent(&self) -> u8 {
        ((self.completed_steps() * 100) / self.steps.len()) as u8
    }

    /// Mark a step `processing`.
    ///
    /// Legal only while the job is `processing`, the step is `pending`,
    /// every earlier step is `completed` and no step is in flight.
    pub fn begin_step(&mut self, name: StepName) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::JobTerminal(self.status));
        }
        if self.processing_step().is_some() {
            return Err(TransitionError::StepAlreadyProcessing(name));
        }

        let index = name.index();
        if self.steps[..index]
            .iter()
            .any(|s| s.status != StepStatus::Completed)
        {
            return Err(TransitionError::PriorStepIncomplete(name));
        }

        let step = &mut self.steps[index];
        if step.status != StepStatus::Pending {
            return Err(TransitionError::InvalidStepTransition {
                step: name,
                from: step.status,
                to: StepStatus::Processing,
            });
        }

        let now = Utc::now();
        step.status = StepStatus::Processing;
        step.started_at = Some(now);
        self.touch(now);
        Ok(())
    }

    /// Mark a step `completed`, merging its validated output.
    pub fn complete_step(&mut self, name: StepName, output: &StepOutput) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::JobTerminal(self.status));
        }
        output.validate()?;

        let index = name.index();
        if self.steps[index].status != StepStatus::Processing {
            return Err(TransitionError::InvalidStepTransition {
                step: name,
                from: self.steps[index].status,
                to: StepStatus::Completed,
            });
        }

        self.result_data.merge_step(name, output)?;

        let now = Utc::now();
        let step = &mut self.steps[index];
        step.status = StepStatus::Completed;
        // started_at is set by begin_step; clamp guards clock skew
        step.completed_at = Some(match step.started_at {
            Some(started) if started > now => started,
            _ => now,
        });
        self.touch(now);
        Ok(())
    }

    /// Mark a step `failed` and the job with it.
    ///
    /// Steps after the failed one stay `pending` forever.
    pub fn fail_step(&mut self, name: StepName, message: impl Into<String>) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::JobTerminal(self.status));
        }

        let index = name.index();
        if self.steps[index].status != StepStatus::Processing {
            return Err(TransitionError::InvalidStepTransition {
                step: name,
                from: self.steps[index].status,
                to: StepStatus::Failed,
            });
        }

        let now = Utc::now();
        self.steps[index].status = StepStatus::Failed;
        self.status = JobStatus::Failed;
        self.error = Some(JobFailure {
            step: name,
            message: message.into(),
        });
        self.touch(now);
        Ok(())
    }

    /// Mark the job `completed` after the final step finished.
    pub fn complete(&mut self) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::JobTerminal(self.status));
        }
        if let Some(step) = self.steps.iter().find(|s| s.status != StepStatus::Completed) {
            return Err(TransitionError::StepsIncomplete(step.name, step.status));
        }

        self.status = JobStatus::Completed;
        self.touch(Utc::now());
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
        self.revision += 1;
    }
}
