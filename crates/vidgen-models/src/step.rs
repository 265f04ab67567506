//! Pipeline step definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named pipeline stage.
///
/// Every job carries exactly these four steps, in this order. Steps are
/// addressed by fixed position, never by search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepName {
    /// Speech-to-text over the input media
    Transcription,
    /// LLM scene plan from prompt + transcript
    ScenePlanning,
    /// Generative video render of the planned scenes
    VideoGeneration,
    /// Assembly of the raw artifact into the final video
    Finalization,
}

impl StepName {
    /// Canonical pipeline order.
    pub const ALL: [StepName; 4] = [
        StepName::Transcription,
        StepName::ScenePlanning,
        StepName::VideoGeneration,
        StepName::Finalization,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepName::Transcription => "transcription",
            StepName::ScenePlanning => "scene_planning",
            StepName::VideoGeneration => "video_generation",
            StepName::Finalization => "finalization",
        }
    }

    /// Fixed position of this step in the pipeline.
    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|s| s == self)
            .expect("step is a member of ALL")
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Step state within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not yet started
    #[default]
    Pending,
    /// Executor call in flight
    Processing,
    /// Executor returned successfully
    Completed,
    /// Executor failed; the job is failed with it
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::Processing => "processing",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One pipeline stage within a job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Stage name; position in the job's `steps` is fixed
    pub name: StepName,

    /// Step state
    #[serde(default)]
    pub status: StepStatus,

    /// Set when the step enters `processing`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Set when the step reaches `completed`; never precedes `started_at`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl StepRecord {
    /// Create a fresh pending record for a stage.
    pub fn pending(name: StepName) -> Self {
        Self {
            name,
            status: StepStatus::Pending,
            started_at: None,
            completed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_order_is_fixed() {
        assert_eq!(StepName::Transcription.index(), 0);
        assert_eq!(StepName::ScenePlanning.index(), 1);
        assert_eq!(StepName::VideoGeneration.index(), 2);
        assert_eq!(StepName::Finalization.index(), 3);
    }

    #[test]
    fn test_step_serde_names() {
        let json = serde_json::to_string(&StepName::ScenePlanning).unwrap();
        assert_eq!(json, "\"scene_planning\"");

        let status: StepStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(status, StepStatus::Processing);
    }

    #[test]
    fn test_pending_record() {
        let record = StepRecord::pending(StepName::Transcription);
        assert_eq!(record.status, StepStatus::Pending);
        assert!(record.started_at.is_none());
        assert!(record.completed_at.is_none());
    }
}
