use crate::provider::{TrackDescriptor, TranscriptProvider, TranscriptSegment};
use crate::TranscriptError;

/// Join segment texts in timeline order, one segment per line
pub fn format_plain_text(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|segment| segment.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Retrieves a selected track and flattens it to plain text
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptFetcher;

impl TranscriptFetcher {
    pub fn new() -> Self {
        Self
    }

    pub async fn fetch_text(
        &self,
        provider: &dyn TranscriptProvider,
        track: &TrackDescriptor,
    ) -> Result<String, TranscriptError> {
        let segments = provider.fetch_segments(track).await?;

        if segments.is_empty() {
            return Err(TranscriptError::Empty);
        }

        tracing::debug!(
            "Fetched {} segment(s) of {} transcript for video {}",
            segments.len(),
            track.language_code,
            track.video_id
        );

        Ok(format_plain_text(&segments))
    }
}
