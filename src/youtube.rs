use async_trait::async_trait;
use eyre::{Result, bail};
use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::{Segment, Transcript};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

pub const YOUTUBE_BASE: &str = "https://www.youtube.com";

/// Why a transcript could not be produced.
///
/// The variants are assigned by [`classify_failure`], which matches on the
/// wording of upstream error messages and is therefore best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("No transcript available for this video. The video may not have captions enabled.")]
    NoTranscript,

    #[error("Video is unavailable or private.")]
    Unavailable,

    #[error("Error retrieving transcript: {0}")]
    Retrieval(String),
}

/// Anything that can turn a video ID into caption fragments
#[async_trait]
pub trait CaptionSource: Send + Sync {
    async fn fetch(&self, video_id: &str) -> Result<Transcript>;
}

/// Fetch a transcript and fold any upstream failure into a [`TranscriptError`]
pub async fn fetch_transcript<C>(source: &C, video_id: &str) -> Result<Transcript, TranscriptError>
where
    C: CaptionSource + ?Sized,
{
    match source.fetch(video_id).await {
        Ok(transcript) if transcript.text().is_empty() => {
            debug!("Caption source returned no text for {video_id}");
            Err(TranscriptError::NoTranscript)
        }
        Ok(transcript) => Ok(transcript),
        Err(e) => {
            let message = format!("{e:#}");
            warn!("Caption retrieval failed for {video_id}: {message}");
            Err(classify_failure(&message))
        }
    }
}

/// Map an upstream error message onto a [`TranscriptError`].
///
/// Relies on the exact English phrasing of the caption service's errors; a
/// reworded or localized message falls through to `Retrieval`.
pub fn classify_failure(message: &str) -> TranscriptError {
    if message.contains("No transcript found") || message.contains("Transcript disabled") {
        TranscriptError::NoTranscript
    } else if message.contains("Video unavailable") {
        TranscriptError::Unavailable
    } else {
        TranscriptError::Retrieval(message.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    #[serde(rename = "playabilityStatus")]
    playability_status: Option<PlayabilityStatus>,
    captions: Option<CaptionsData>,
    #[serde(rename = "videoDetails")]
    video_details: Option<VideoDetails>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
}

/// YouTube's built-in captions, read through the InnerTube player API
#[derive(Debug, Clone)]
pub struct InnerTube {
    client: reqwest::Client,
    lang: String,
    base_url: String,
}

impl InnerTube {
    pub fn new(client: reqwest::Client, lang: impl Into<String>) -> Self {
        Self {
            client,
            lang: lang.into(),
            base_url: YOUTUBE_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl CaptionSource for InnerTube {
    async fn fetch(&self, video_id: &str) -> Result<Transcript> {
        // Step 1: Fetch the watch page to get the InnerTube API key
        let watch_url = format!("{}/watch?v={video_id}", self.base_url);
        debug!("Fetching watch page: {watch_url}");

        let page_html = self
            .client
            .get(&watch_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let api_key = extract_api_key(&page_html)?;
        debug!("Extracted InnerTube API key: {api_key}");

        // Step 2: Call InnerTube player endpoint
        let player_url = format!("{}/youtubei/v1/player?key={api_key}&prettyPrint=false", self.base_url);

        let body = serde_json::json!({
            "context": {
                "client": {
                    "hl": self.lang,
                    "gl": "US",
                    "clientName": "WEB",
                    "clientVersion": "2.20241126.01.00"
                }
            },
            "videoId": video_id
        });

        let resp: InnerTubePlayerResponse = self
            .client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let (title, track) = select_track(resp, video_id, &self.lang)?;
        debug!("Using caption track: lang={}", track.language_code);

        // Step 3: Fetch the caption XML
        let caption_xml = self
            .client
            .get(&track.base_url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let segments = parse_caption_xml(&caption_xml)?;
        if segments.is_empty() {
            bail!("No transcript found for video {video_id}: caption track is empty");
        }

        Ok(Transcript {
            video_id: video_id.to_string(),
            title,
            language: track.language_code,
            segments,
        })
    }
}

/// Check the player response and pick the caption track for `lang`, or the first one
fn select_track(resp: InnerTubePlayerResponse, video_id: &str, lang: &str) -> Result<(String, CaptionTrack)> {
    if let Some(status) = resp.playability_status.as_ref().filter(|s| s.status != "OK") {
        let reason = status.reason.as_deref().unwrap_or(&status.status);
        bail!("Video unavailable ({video_id}): {reason}");
    }

    let title = resp
        .video_details
        .as_ref()
        .and_then(|vd| vd.title.clone())
        .unwrap_or_default();

    let Some(renderer) = resp.captions.and_then(|c| c.player_captions_tracklist_renderer) else {
        bail!("Transcript disabled for video {video_id}");
    };

    let mut tracks = renderer.caption_tracks.unwrap_or_default();
    if tracks.is_empty() {
        bail!("No transcript found for video {video_id}");
    }

    let index = tracks.iter().position(|t| t.language_code == lang).unwrap_or(0);
    Ok((title, tracks.swap_remove(index)))
}

fn extract_api_key(html: &str) -> Result<String> {
    let re = Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#)?;
    if let Some(caps) = re.captures(html) {
        return Ok(caps[1].to_string());
    }

    // Fallback: try the newer pattern
    let re2 = Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#)?;
    if let Some(caps) = re2.captures(html) {
        return Ok(caps[1].to_string());
    }

    bail!("could not extract InnerTube API key from watch page");
}

fn parse_caption_xml(xml: &str) -> Result<Vec<Segment>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current_start: Option<f64> = None;
    let mut current_dur: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = None;
                let mut dur = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"start" => {
                            start = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        b"dur" => {
                            dur = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        _ => {}
                    }
                }
                current_start = start;
                current_dur = dur;
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(start), Some(dur)) = (current_start.take(), current_dur.take()) {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    let text = html_escape::decode_html_entities(&raw_text).to_string();
                    if !text.is_empty() {
                        segments.push(Segment {
                            text,
                            start,
                            duration: dur,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("error parsing caption XML: {e}"),
            _ => {}
        }
    }

    Ok(segments)
}
