//! Accumulated step output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::job::TransitionError;
use crate::step::StepName;

/// Output produced by one executor invocation.
///
/// Keys are plain names ("text", "video_url"); namespacing happens at
/// merge time so executors stay unaware of the record layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepOutput {
    pub data: serde_json::Map<String, Value>,
}

impl StepOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key-value pair.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Reject payloads that must never reach the store: empty keys and
    /// null values (an unset upstream field serialized as null would
    /// otherwise be persisted as data).
    pub fn validate(&self) -> Result<(), TransitionError> {
        for (key, value) in &self.data {
            if key.trim().is_empty() {
                return Err(TransitionError::InvalidOutput(
                    "output key must not be empty".to_string(),
                ));
            }
            if value.is_null() {
                return Err(TransitionError::InvalidOutput(format!(
                    "output value for '{}' is null",
                    key
                )));
            }
        }
        Ok(())
    }
}

/// Append-only map of results accumulated as steps complete.
///
/// Keys are namespaced per step ("transcription.text"). Earlier steps'
/// data is never overwritten or deleted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ResultData(BTreeMap<String, Value>);

impl ResultData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a step's output under `"{step}.{key}"` keys.
    ///
    /// The output must already be validated. A key collision within the
    /// same namespace means the step ran twice for this job, which the
    /// pipeline never does; it is rejected rather than silently dropped.
    pub fn merge_step(&mut self, step: StepName, output: &StepOutput) -> Result<(), TransitionError> {
        // Check every key before inserting any, so a rejected merge
        // leaves the map untouched.
        for key in output.data.keys() {
            let namespaced = format!("{}.{}", step.as_str(), key);
            if self.0.contains_key(&namespaced) {
                return Err(TransitionError::InvalidOutput(format!(
                    "result key '{}' already present",
                    namespaced
                )));
            }
        }
        for (key, value) in &output.data {
            self.0
                .insert(format!("{}.{}", step.as_str(), key), value.clone());
        }
        Ok(())
    }

    /// Look up a namespaced key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_namespaces_keys() {
        let mut data = ResultData::new();
        let output = StepOutput::new().with("text", "hello").with("language", "en");
        data.merge_step(StepName::Transcription, &output).unwrap();

        assert_eq!(data.get("transcription.text"), Some(&json!("hello")));
        assert_eq!(data.get("transcription.language"), Some(&json!("en")));
    }

    #[test]
    fn test_merge_preserves_earlier_steps_on_key_collision() {
        let mut data = ResultData::new();
        data.merge_step(StepName::Transcription, &StepOutput::new().with("text", "a"))
            .unwrap();
        // Same plain key from a different step lands in its own namespace.
        data.merge_step(StepName::ScenePlanning, &StepOutput::new().with("text", "b"))
            .unwrap();

        assert_eq!(data.get("transcription.text"), Some(&json!("a")));
        assert_eq!(data.get("scene_planning.text"), Some(&json!("b")));
    }

    #[test]
    fn test_merge_rejects_duplicate_within_namespace() {
        let mut data = ResultData::new();
        data.merge_step(StepName::Transcription, &StepOutput::new().with("text", "a"))
            .unwrap();
        let err = data
            .merge_step(StepName::Transcription, &StepOutput::new().with("text", "b"))
            .unwrap_err();
        assert!(matches!(err, TransitionError::InvalidOutput(_)));
        // Earlier data survives intact.
        assert_eq!(data.get("transcription.text"), Some(&json!("a")));
    }

    #[test]
    fn test_output_validation_rejects_nulls() {
        let output = StepOutput::new().with("text", Value::Null);
        assert!(output.validate().is_err());

        let output = StepOutput::new().with("", "x");
        assert!(output.validate().is_err());

        let output = StepOutput::new().with("text", "ok");
        assert!(output.validate().is_ok());
    }
}
