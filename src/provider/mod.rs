use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod youtube;

pub use youtube::YoutubeProvider;

use crate::TranscriptError;

/// One caption track available for a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    /// Video the track belongs to
    pub video_id: String,

    /// Language code as reported upstream (e.g. "en", "en-US")
    pub language_code: String,

    /// Human-readable language name
    pub language_name: String,

    /// Machine-generated (ASR) rather than human-authored
    pub is_generated: bool,

    /// Location the track content is fetched from
    pub base_url: String,
}

/// Timed text segment as delivered upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start offset in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,

    /// Segment text
    pub text: String,
}

/// Source of caption tracks and their content
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// List the caption tracks available for a video
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<TrackDescriptor>, TranscriptError>;

    /// Fetch the timed segments of one track, in timeline order
    async fn fetch_segments(
        &self,
        track: &TrackDescriptor,
    ) -> Result<Vec<TranscriptSegment>, TranscriptError>;
}
