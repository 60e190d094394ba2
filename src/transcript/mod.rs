use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::TranscriptConfig;
use crate::provider::TranscriptProvider;
use crate::TranscriptError;

pub mod fetcher;
pub mod resolver;
pub mod retry;

pub use fetcher::{format_plain_text, TranscriptFetcher};
pub use resolver::{find_generated, find_preferred, LanguagePreferences, TranscriptResolver};
pub use retry::{RetryError, RetryPolicy};

/// Failure categories of an acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    TranscriptsDisabled,
    NoTranscriptFound,
    TransientParseFailure,
    UnexpectedFailure,
}

impl ErrorKind {
    /// Failures worth another attempt
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::TransientParseFailure | Self::UnexpectedFailure)
    }
}

/// Outcome of one acquisition, handed to the HTTP layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionResult {
    Success { text: String },
    Failure { kind: ErrorKind, message: String },
}

impl AcquisitionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    fn from_retry_error(error: RetryError<TranscriptError>) -> Self {
        match error {
            RetryError::Terminal { error, .. } => Self::failure(error.kind(), error.to_string()),
            RetryError::Exhausted { error, attempts } => match error.kind() {
                ErrorKind::TransientParseFailure => Self::failure(
                    ErrorKind::TransientParseFailure,
                    format!("Failed to parse transcript after {} attempts.", attempts),
                ),
                ErrorKind::UnexpectedFailure => Self::failure(
                    ErrorKind::UnexpectedFailure,
                    format!(
                        "Unexpected server error: {} (failed after {} attempts).",
                        error.type_tag(),
                        attempts
                    ),
                ),
                kind => Self::failure(kind, error.to_string()),
            },
        }
    }
}

/// Resolve and fetch a transcript under the retry policy
pub struct TranscriptService {
    provider: Arc<dyn TranscriptProvider>,
    resolver: TranscriptResolver,
    fetcher: TranscriptFetcher,
    retry: RetryPolicy,
}

impl TranscriptService {
    pub fn new(
        provider: Arc<dyn TranscriptProvider>,
        resolver: TranscriptResolver,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            resolver,
            fetcher: TranscriptFetcher::new(),
            retry,
        }
    }

    pub fn from_config(provider: Arc<dyn TranscriptProvider>, config: &TranscriptConfig) -> Self {
        Self::new(
            provider,
            TranscriptResolver::new(LanguagePreferences::new(
                config.preferred_languages.iter().cloned(),
            )),
            RetryPolicy::from(config),
        )
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetch the plain-text transcript of `video_id`. Never fails outright; every
    /// failure is folded into [`AcquisitionResult::Failure`].
    pub async fn acquire(&self, video_id: &str) -> AcquisitionResult {
        let outcome = self
            .retry
            .run(
                |attempt| self.attempt(video_id, attempt),
                TranscriptError::is_retryable,
            )
            .await;

        match outcome {
            Ok(text) => {
                tracing::info!("Fetched transcript for video {} ({} chars)", video_id, text.len());
                AcquisitionResult::Success { text }
            }
            Err(error) => {
                let result = AcquisitionResult::from_retry_error(error);
                if let AcquisitionResult::Failure { kind, message } = &result {
                    tracing::info!("Transcript for video {} failed ({:?}): {}", video_id, kind, message);
                }
                result
            }
        }
    }

    async fn attempt(&self, video_id: &str, attempt: u32) -> Result<String, TranscriptError> {
        let result = async {
            let track = self.resolver.resolve(self.provider.as_ref(), video_id).await?;
            self.fetcher.fetch_text(self.provider.as_ref(), &track).await
        }
        .await;

        if let Err(error) = &result {
            if error.kind() == ErrorKind::UnexpectedFailure {
                tracing::error!(
                    "Unexpected error for {} (attempt {}): {:?}",
                    video_id,
                    attempt,
                    error
                );
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fixtures::{segment, track};
    use crate::provider::MockTranscriptProvider;
    use std::time::Duration;

    fn service(provider: MockTranscriptProvider) -> TranscriptService {
        TranscriptService::new(
            Arc::new(provider),
            TranscriptResolver::default(),
            RetryPolicy::new(2, Duration::ZERO),
        )
    }

    fn listing(provider: &mut MockTranscriptProvider, times: usize) {
        provider
            .expect_list_tracks()
            .times(times)
            .returning(|_| Ok(vec![track("fr", false), track("en-US", false)]));
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::TransientParseFailure.is_retryable());
        assert!(ErrorKind::UnexpectedFailure.is_retryable());
        assert!(!ErrorKind::TranscriptsDisabled.is_retryable());
        assert!(!ErrorKind::NoTranscriptFound.is_retryable());
    }

    #[tokio::test]
    async fn test_success() {
        let mut provider = MockTranscriptProvider::new();
        listing(&mut provider, 1);
        provider
            .expect_fetch_segments()
            .withf(|track| track.language_code == "en-US")
            .times(1)
            .returning(|_| Ok(vec![segment(0.0, "a"), segment(5.0, "b"), segment(10.0, "c")]));

        let result = service(provider).acquire("vid").await;
        assert_eq!(
            result,
            AcquisitionResult::Success {
                text: "a\nb\nc".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_disabled_is_not_retried() {
        let mut provider = MockTranscriptProvider::new();
        provider.expect_list_tracks().times(1).returning(|video_id| {
            Err(TranscriptError::TranscriptsDisabled {
                video_id: video_id.to_string(),
            })
        });
        provider.expect_fetch_segments().never();

        let result = service(provider).acquire("vid").await;
        assert_eq!(result.kind(), Some(ErrorKind::TranscriptsDisabled));
        assert_eq!(
            result,
            AcquisitionResult::Failure {
                kind: ErrorKind::TranscriptsDisabled,
                message: "Transcripts are disabled for this video.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_no_transcript_found_is_not_retried() {
        let mut provider = MockTranscriptProvider::new();
        provider
            .expect_list_tracks()
            .times(1)
            .returning(|_| Ok(vec![track("fr", false)]));
        provider.expect_fetch_segments().never();

        let result = service(provider).acquire("vid").await;
        assert_eq!(result.kind(), Some(ErrorKind::NoTranscriptFound));
    }

    #[tokio::test]
    async fn test_generated_fallback() {
        let mut provider = MockTranscriptProvider::new();
        provider
            .expect_list_tracks()
            .returning(|_| Ok(vec![track("fr", true)]));
        provider
            .expect_fetch_segments()
            .withf(|track| track.language_code == "fr" && track.is_generated)
            .returning(|_| Ok(vec![segment(0.0, "bonjour")]));

        let result = service(provider).acquire("vid").await;
        assert_eq!(
            result,
            AcquisitionResult::Success {
                text: "bonjour".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_parse_errors_then_success() {
        let mut provider = MockTranscriptProvider::new();
        listing(&mut provider, 3);

        let mut calls = 0;
        provider
            .expect_fetch_segments()
            .times(3)
            .returning(move |_| {
                calls += 1;
                if calls < 3 {
                    Err(TranscriptError::Malformed("unclosed token".into()))
                } else {
                    Ok(vec![segment(0.0, "third time lucky")])
                }
            });

        let result = service(provider).acquire("vid").await;
        assert_eq!(
            result,
            AcquisitionResult::Success {
                text: "third time lucky".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_parse_errors_exhaust_retries() {
        let mut provider = MockTranscriptProvider::new();
        listing(&mut provider, 3);
        provider
            .expect_fetch_segments()
            .times(3)
            .returning(|_| Err(TranscriptError::Malformed("unclosed token".into())));

        let result = service(provider).acquire("vid").await;
        assert_eq!(
            result,
            AcquisitionResult::Failure {
                kind: ErrorKind::TransientParseFailure,
                message: "Failed to parse transcript after 3 attempts.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_consent_page_body_counts_as_parse_failure() {
        let mut provider = MockTranscriptProvider::new();
        listing(&mut provider, 3);
        provider
            .expect_fetch_segments()
            .times(3)
            .returning(|_| crate::provider::youtube::parse_timedtext("<html><body>consent</body></html>"));

        let result = service(provider).acquire("vid").await;
        assert_eq!(result.kind(), Some(ErrorKind::TransientParseFailure));
    }

    #[tokio::test]
    async fn test_unexpected_errors_exhaust_retries() {
        let mut provider = MockTranscriptProvider::new();
        provider.expect_list_tracks().times(3).returning(|video_id| {
            Err(TranscriptError::VideoUnavailable {
                video_id: video_id.to_string(),
                reason: "private video".to_string(),
            })
        });

        let result = service(provider).acquire("vid").await;
        match result {
            AcquisitionResult::Failure { kind, message } => {
                assert_eq!(kind, ErrorKind::UnexpectedFailure);
                assert!(message.contains("VideoUnavailable"));
                assert!(message.contains("3 attempts"));
                assert!(!message.contains("private video"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_transcript_is_an_error() {
        let mut provider = MockTranscriptProvider::new();
        listing(&mut provider, 1);
        provider
            .expect_fetch_segments()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let result = service(provider).acquire("vid").await;
        assert_eq!(
            result,
            AcquisitionResult::Failure {
                kind: ErrorKind::UnexpectedFailure,
                message: "Fetched transcript data was empty".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_from_config_uses_preferences() {
        let mut provider = MockTranscriptProvider::new();
        provider
            .expect_list_tracks()
            .returning(|_| Ok(vec![track("en", false), track("ar", false)]));
        provider
            .expect_fetch_segments()
            .withf(|track| track.language_code == "ar")
            .returning(|_| Ok(vec![segment(0.0, "marhaba")]));

        let config = TranscriptConfig {
            preferred_languages: vec!["ar".to_string()],
            retry_delay_ms: 0,
            ..TranscriptConfig::default()
        };
        let service = TranscriptService::from_config(Arc::new(provider), &config);
        assert_eq!(service.retry_policy().total_attempts(), 3);
        assert!(service.acquire("vid").await.is_success());
    }
}
