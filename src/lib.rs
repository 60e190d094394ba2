//! Transcript API - A small HTTP service serving plain-text YouTube transcripts
//!
//! This library lists the caption tracks of a video, picks one by language preference
//! (falling back to any auto-generated track), fetches it with bounded retries and
//! reports the outcome as a structured [`AcquisitionResult`].

pub mod cli;
pub mod config;
pub mod output;
pub mod provider;
pub mod server;
pub mod transcript;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use provider::{TrackDescriptor, TranscriptProvider, TranscriptSegment};
pub use transcript::{AcquisitionResult, ErrorKind, TranscriptService};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Failures raised while listing or fetching transcripts
#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("Transcripts are disabled for this video.")]
    TranscriptsDisabled { video_id: String },

    #[error(
        "No transcript found for video {video_id} in any of the requested languages [{}] and no auto-generated track is available (available: [{}])",
        .requested.join(", "),
        .available.join(", ")
    )]
    NoTranscriptFound {
        video_id: String,
        requested: Vec<String>,
        available: Vec<String>,
    },

    #[error("Malformed transcript data: {0}")]
    Malformed(String),

    #[error("Fetched transcript data was empty")]
    Empty,

    #[error("Video {video_id} is unavailable: {reason}")]
    VideoUnavailable { video_id: String, reason: String },

    #[error("Too many requests, YouTube is asking for a captcha for video {0}")]
    TooManyRequests(String),

    #[error("Could not parse YouTube page data for video {0}")]
    DataUnparsable(String),

    #[error("YouTube returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl TranscriptError {
    /// Where this failure sits in the acquisition taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TranscriptsDisabled { .. } => ErrorKind::TranscriptsDisabled,
            Self::NoTranscriptFound { .. } => ErrorKind::NoTranscriptFound,
            Self::Malformed(_) => ErrorKind::TransientParseFailure,
            Self::Empty
            | Self::VideoUnavailable { .. }
            | Self::TooManyRequests(_)
            | Self::DataUnparsable(_)
            | Self::HttpStatus { .. }
            | Self::Request(_) => ErrorKind::UnexpectedFailure,
        }
    }

    /// Whether another attempt may succeed. An empty track is a definitive answer.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Empty) && self.kind().is_retryable()
    }

    /// Short tag exposed to callers in place of the full diagnostic
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::TranscriptsDisabled { .. } => "TranscriptsDisabled",
            Self::NoTranscriptFound { .. } => "NoTranscriptFound",
            Self::Malformed(_) => "ParseError",
            Self::Empty => "EmptyTranscript",
            Self::VideoUnavailable { .. } => "VideoUnavailable",
            Self::TooManyRequests(_) => "TooManyRequests",
            Self::DataUnparsable(_) => "YouTubeDataUnparsable",
            Self::HttpStatus { .. } => "HttpError",
            Self::Request(_) => "RequestError",
        }
    }
}
