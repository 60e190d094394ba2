use crate::provider::{TrackDescriptor, TranscriptProvider};
use crate::TranscriptError;

/// Ordered language codes, most wanted first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePreferences(Vec<String>);

impl LanguagePreferences {
    pub fn new<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(languages.into_iter().map(Into::into).collect())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for LanguagePreferences {
    fn default() -> Self {
        Self::new(["en", "en-US", "en-GB", "ar"])
    }
}

/// First track matching the earliest listed language. Within one language a
/// human-authored track beats a generated one.
pub fn find_preferred<'a>(
    tracks: &'a [TrackDescriptor],
    preferences: &LanguagePreferences,
) -> Option<&'a TrackDescriptor> {
    preferences.as_slice().iter().find_map(|language| {
        let mut candidates = tracks
            .iter()
            .filter(|track| &track.language_code == language);
        let first = candidates.next()?;

        if first.is_generated {
            candidates
                .find(|track| !track.is_generated)
                .or(Some(first))
        } else {
            Some(first)
        }
    })
}

/// First machine-generated track, in any language
pub fn find_generated(tracks: &[TrackDescriptor]) -> Option<&TrackDescriptor> {
    tracks.iter().find(|track| track.is_generated)
}

/// Picks the track to fetch for a video
#[derive(Debug, Clone, Default)]
pub struct TranscriptResolver {
    preferences: LanguagePreferences,
}

impl TranscriptResolver {
    pub fn new(preferences: LanguagePreferences) -> Self {
        Self { preferences }
    }

    /// Pick from an already listed set of tracks
    pub fn select(
        &self,
        video_id: &str,
        tracks: Vec<TrackDescriptor>,
    ) -> Result<TrackDescriptor, TranscriptError> {
        if let Some(track) = find_preferred(&tracks, &self.preferences) {
            return Ok(track.clone());
        }

        if let Some(track) = find_generated(&tracks) {
            tracing::info!(
                "No preferred language for video {}, falling back to generated '{}' track",
                video_id,
                track.language_code
            );
            return Ok(track.clone());
        }

        Err(TranscriptError::NoTranscriptFound {
            video_id: video_id.to_string(),
            requested: self.preferences.as_slice().to_vec(),
            available: tracks
                .into_iter()
                .map(|track| track.language_code)
                .collect(),
        })
    }

    /// List tracks upstream and pick one
    pub async fn resolve(
        &self,
        provider: &dyn TranscriptProvider,
        video_id: &str,
    ) -> Result<TrackDescriptor, TranscriptError> {
        let tracks = provider.list_tracks(video_id).await?;
        let track = self.select(video_id, tracks)?;

        tracing::debug!(
            "Selected {} ({}) track for video {}",
            track.language_code,
            if track.is_generated { "generated" } else { "manual" },
            video_id
        );

        Ok(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fixtures::track;
    use crate::provider::MockTranscriptProvider;

    #[test]
    fn test_first_preference_match_wins() {
        let tracks = vec![track("fr", false), track("en-US", false)];
        let selected = find_preferred(&tracks, &LanguagePreferences::default()).unwrap();
        assert_eq!(selected.language_code, "en-US");
    }

    #[test]
    fn test_preference_order_beats_listing_order() {
        let tracks = vec![track("ar", false), track("en-GB", false)];
        let selected = find_preferred(&tracks, &LanguagePreferences::default()).unwrap();
        assert_eq!(selected.language_code, "en-GB");
    }

    #[test]
    fn test_manual_beats_generated_in_same_language() {
        let tracks = vec![track("en", true), track("en", false)];
        let selected = find_preferred(&tracks, &LanguagePreferences::default()).unwrap();
        assert!(!selected.is_generated);

        let generated_only = vec![track("en", true)];
        let selected = find_preferred(&generated_only, &LanguagePreferences::default()).unwrap();
        assert!(selected.is_generated);
    }

    #[test]
    fn test_no_preferred_match() {
        let tracks = vec![track("fr", true)];
        assert!(find_preferred(&tracks, &LanguagePreferences::default()).is_none());
        assert!(find_preferred(&tracks, &LanguagePreferences::new(Vec::<String>::new())).is_none());
    }

    #[test]
    fn test_find_generated() {
        let tracks = vec![track("de", false), track("fr", true), track("es", true)];
        assert_eq!(find_generated(&tracks).unwrap().language_code, "fr");
        assert!(find_generated(&[track("de", false)]).is_none());
    }

    #[test]
    fn test_select_falls_back_to_generated() {
        let resolver = TranscriptResolver::default();
        let selected = resolver.select("vid", vec![track("fr", true)]).unwrap();
        assert_eq!(selected.language_code, "fr");
    }

    #[test]
    fn test_select_custom_preferences() {
        let resolver = TranscriptResolver::new(LanguagePreferences::new(["fr", "en"]));
        let selected = resolver
            .select("vid", vec![track("en", false), track("fr", false)])
            .unwrap();
        assert_eq!(selected.language_code, "fr");
    }

    #[test]
    fn test_select_nothing_suitable() {
        let resolver = TranscriptResolver::default();
        let error = resolver
            .select("vid", vec![track("fr", false), track("de", false)])
            .unwrap_err();

        match error {
            TranscriptError::NoTranscriptFound {
                video_id,
                requested,
                available,
            } => {
                assert_eq!(video_id, "vid");
                assert_eq!(requested, vec!["en", "en-US", "en-GB", "ar"]);
                assert_eq!(available, vec!["fr", "de"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resolve_propagates_disabled() {
        let mut provider = MockTranscriptProvider::new();
        provider
            .expect_list_tracks()
            .times(1)
            .returning(|video_id| {
                Err(TranscriptError::TranscriptsDisabled {
                    video_id: video_id.to_string(),
                })
            });

        let result = TranscriptResolver::default().resolve(&provider, "vid").await;
        assert!(matches!(
            result,
            Err(TranscriptError::TranscriptsDisabled { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_selects_from_listing() {
        let mut provider = MockTranscriptProvider::new();
        provider
            .expect_list_tracks()
            .withf(|video_id| video_id == "vid")
            .returning(|_| Ok(vec![track("fr", false), track("en-US", false)]));

        let selected = TranscriptResolver::default()
            .resolve(&provider, "vid")
            .await
            .unwrap();
        assert_eq!(selected.language_code, "en-US");
    }
}
