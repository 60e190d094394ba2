use anyhow::Context;
use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use serde_json::{json, Value};

use super::{TrackDescriptor, TranscriptProvider, TranscriptSegment};
use crate::config::TranscriptConfig;
use crate::TranscriptError;

const WATCH_URL: &str = "https://www.youtube.com/watch";
const INNERTUBE_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

/// Caption tracks straight from YouTube: watch page, innertube player, timedtext XML
pub struct YoutubeProvider {
    client: reqwest::Client,
    api_key_pattern: Regex,
}

impl YoutubeProvider {
    pub fn new(config: &TranscriptConfig) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout())
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        let api_key_pattern = Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#)
            .context("Failed to compile innertube key pattern")?;

        Ok(Self {
            client,
            api_key_pattern,
        })
    }

    async fn fetch_watch_page(&self, video_id: &str) -> Result<String, TranscriptError> {
        let url = format!("{}?v={}", WATCH_URL, urlencoding::encode(video_id));
        tracing::debug!("Fetching watch page: {}", url);

        let response = self.client.get(&url).send().await?;
        ensure_success(&response, &url, video_id)?;

        Ok(response.text().await?)
    }

    fn extract_api_key(&self, html: &str, video_id: &str) -> Result<String, TranscriptError> {
        if html.contains("class=\"g-recaptcha\"") {
            return Err(TranscriptError::TooManyRequests(video_id.to_string()));
        }

        self.api_key_pattern
            .captures(html)
            .and_then(|captures| captures.get(1))
            .map(|key| key.as_str().to_string())
            .ok_or_else(|| TranscriptError::DataUnparsable(video_id.to_string()))
    }

    async fn fetch_player_data(&self, video_id: &str, api_key: &str) -> Result<Value, TranscriptError> {
        let url = format!("{}?key={}", INNERTUBE_PLAYER_URL, urlencoding::encode(api_key));
        let body = json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION
                }
            },
            "videoId": video_id
        });

        tracing::debug!("Requesting player data for video {}", video_id);

        let response = self.client.post(&url).json(&body).send().await?;
        ensure_success(&response, INNERTUBE_PLAYER_URL, video_id)?;

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            TranscriptError::Malformed(format!("player response for video {}: {}", video_id, e))
        })
    }
}

#[async_trait]
impl TranscriptProvider for YoutubeProvider {
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<TrackDescriptor>, TranscriptError> {
        let html = self.fetch_watch_page(video_id).await?;
        let api_key = self.extract_api_key(&html, video_id)?;
        let data = self.fetch_player_data(video_id, &api_key).await?;

        let tracks = parse_caption_tracks(video_id, &data)?;
        tracing::debug!(
            "Video {} has {} caption track(s): {}",
            video_id,
            tracks.len(),
            tracks
                .iter()
                .map(|track| track.language_code.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(tracks)
    }

    async fn fetch_segments(
        &self,
        track: &TrackDescriptor,
    ) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        tracing::debug!(
            "Fetching {} track for video {}",
            track.language_code,
            track.video_id
        );

        let response = self.client.get(&track.base_url).send().await?;
        ensure_success(&response, &track.base_url, &track.video_id)?;

        let body = response.text().await?;
        parse_timedtext(&body)
    }
}

fn ensure_success(
    response: &reqwest::Response,
    url: &str,
    video_id: &str,
) -> Result<(), TranscriptError> {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(TranscriptError::TooManyRequests(video_id.to_string()));
    }

    if !status.is_success() {
        return Err(TranscriptError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    Ok(())
}

/// Read the caption track list out of an innertube player response
pub fn parse_caption_tracks(
    video_id: &str,
    data: &Value,
) -> Result<Vec<TrackDescriptor>, TranscriptError> {
    let playability = &data["playabilityStatus"];
    if let Some(status) = playability["status"].as_str() {
        if status != "OK" {
            let reason = playability["reason"].as_str().unwrap_or(status);
            return Err(TranscriptError::VideoUnavailable {
                video_id: video_id.to_string(),
                reason: reason.to_string(),
            });
        }
    }

    let disabled = || TranscriptError::TranscriptsDisabled {
        video_id: video_id.to_string(),
    };

    let caption_tracks = data
        .get("captions")
        .and_then(|captions| captions.get("playerCaptionsTracklistRenderer"))
        .and_then(|renderer| renderer.get("captionTracks"))
        .and_then(Value::as_array)
        .filter(|tracks| !tracks.is_empty())
        .ok_or_else(disabled)?;

    caption_tracks
        .iter()
        .map(|track| {
            let missing = |field: &str| {
                TranscriptError::Malformed(format!(
                    "caption track without {} for video {}",
                    field, video_id
                ))
            };

            let base_url = track["baseUrl"].as_str().ok_or_else(|| missing("baseUrl"))?;
            let language_code = track["languageCode"]
                .as_str()
                .ok_or_else(|| missing("languageCode"))?;

            Ok::<_, TranscriptError>(TrackDescriptor {
                video_id: video_id.to_string(),
                language_code: language_code.to_string(),
                language_name: track_name(&track["name"])
                    .unwrap_or_else(|| language_code.to_string()),
                is_generated: track["kind"].as_str() == Some("asr"),
                base_url: base_url.replace("&fmt=srv3", ""),
            })
        })
        .collect()
}

fn track_name(name: &Value) -> Option<String> {
    if let Some(text) = name["simpleText"].as_str() {
        return Some(text.to_string());
    }

    let runs = name["runs"].as_array()?;
    let joined = runs
        .iter()
        .filter_map(|run| run["text"].as_str())
        .collect::<String>();

    (!joined.is_empty()).then_some(joined)
}

/// Parse a timedtext XML document into segments, preserving document order.
/// Anything other than a complete `<transcript>` document is malformed.
pub fn parse_timedtext(xml: &str) -> Result<Vec<TranscriptSegment>, TranscriptError> {
    if xml.trim().is_empty() {
        return Err(TranscriptError::Malformed(
            "empty transcript document".to_string(),
        ));
    }

    let mut reader = Reader::from_str(xml);

    let mut segments = Vec::new();
    let mut current: Option<TranscriptSegment> = None;
    let mut root_open = false;
    let mut root_closed = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if !root_open => {
                expect_root(&e)?;
                root_open = true;
            }
            Ok(Event::Empty(e)) if !root_open => {
                expect_root(&e)?;
                root_open = true;
                root_closed = true;
            }
            Ok(Event::Start(e)) if e.name().as_ref() == b"text" => {
                current = Some(segment_from_element(&e)?);
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"text" => {
                segments.push(segment_from_element(&e)?);
            }
            Ok(Event::Text(e)) => {
                if let Some(segment) = current.as_mut() {
                    let text = e.unescape().map_err(|e| {
                        TranscriptError::Malformed(format!("invalid caption text: {}", e))
                    })?;
                    segment.text.push_str(&decode_entities(&text));
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(segment) = current.as_mut() {
                    segment
                        .text
                        .push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"text" => {
                if let Some(segment) = current.take() {
                    segments.push(segment);
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"transcript" => {
                root_closed = true;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TranscriptError::Malformed(format!(
                    "XML parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if !root_open {
        return Err(TranscriptError::Malformed(
            "no <transcript> element in document".to_string(),
        ));
    }

    if current.is_some() || !root_closed {
        return Err(TranscriptError::Malformed(
            "document ended before </transcript>".to_string(),
        ));
    }

    Ok(segments)
}

fn expect_root(element: &BytesStart) -> Result<(), TranscriptError> {
    if element.name().as_ref() == b"transcript" {
        return Ok(());
    }

    Err(TranscriptError::Malformed(format!(
        "unexpected root element <{}>",
        String::from_utf8_lossy(element.name().as_ref())
    )))
}

fn segment_from_element(element: &BytesStart) -> Result<TranscriptSegment, TranscriptError> {
    let mut segment = TranscriptSegment {
        start: 0.0,
        duration: 0.0,
        text: String::new(),
    };

    for attribute in element.attributes() {
        let attribute = attribute
            .map_err(|e| TranscriptError::Malformed(format!("invalid attribute: {}", e)))?;
        let value = attribute
            .unescape_value()
            .map_err(|e| TranscriptError::Malformed(format!("invalid attribute value: {}", e)))?;

        match attribute.key.as_ref() {
            b"start" => segment.start = parse_seconds(&value)?,
            b"dur" => segment.duration = parse_seconds(&value)?,
            _ => {}
        }
    }

    Ok(segment)
}

fn parse_seconds(value: &str) -> Result<f64, TranscriptError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| TranscriptError::Malformed(format!("invalid timestamp: {:?}", value)))
}

// Caption text arrives escaped twice ("&amp;#39;"); a bare '&' left after the
// first pass is kept literally.
fn decode_entities(text: &str) -> String {
    quick_xml::escape::unescape(text)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| text.to_string())
}
