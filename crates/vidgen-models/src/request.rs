//! Submission payload and validation rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Maximum prompt length.
pub const MAX_PROMPT_LENGTH: usize = 2000;

/// Supported target duration bounds (seconds).
pub const MIN_TARGET_DURATION_SECS: u32 = 5;
pub const MAX_TARGET_DURATION_SECS: u32 = 120;

/// Rendering style for the generated video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStyle {
    /// Film-like color and pacing
    Cinematic,
    /// Hand-drawn animation look
    Animated,
    /// Documentary framing, minimal effects
    Documentary,
    /// Fast cuts for short-form feeds
    Social,
}

impl VideoStyle {
    pub const ALL: [VideoStyle; 4] = [
        VideoStyle::Cinematic,
        VideoStyle::Animated,
        VideoStyle::Documentary,
        VideoStyle::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStyle::Cinematic => "cinematic",
            VideoStyle::Animated => "animated",
            VideoStyle::Documentary => "documentary",
            VideoStyle::Social => "social",
        }
    }
}

impl fmt::Display for VideoStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VideoStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cinematic" => Ok(VideoStyle::Cinematic),
            "animated" => Ok(VideoStyle::Animated),
            "documentary" => Ok(VideoStyle::Documentary),
            "social" => Ok(VideoStyle::Social),
            other => Err(format!("Unknown style: {}", other)),
        }
    }
}

/// A generation submission.
///
/// Style membership is enforced by the enum itself; the media reference's
/// existence and ownership are checked by the submission service against
/// the media catalog.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerationRequest {
    /// Reference to previously-uploaded input media
    #[validate(length(min = 1, message = "input_media_id is required"))]
    pub input_media_id: String,

    /// Free-text prompt
    #[validate(length(min = 1, max = 2000, message = "prompt must be 1-2000 characters"))]
    pub prompt: String,

    /// Desired output length in seconds
    #[validate(range(min = 5, max = 120, message = "target_duration_secs must be 5-120"))]
    pub target_duration_secs: u32,

    /// Rendering style
    pub style: VideoStyle,
}

/// Validate media ID format to prevent injection attacks.
///
/// Valid format: alphanumeric characters and hyphens only, 8-64 chars.
pub fn is_valid_media_id(id: &str) -> bool {
    if id.len() > 64 || id.len() < 8 {
        return false;
    }
    id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
