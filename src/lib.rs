pub mod config;
pub mod output;
pub mod pipeline;
pub mod server;
pub mod summarize;
pub mod youtube;

use std::sync::LazyLock;

use regex::Regex;

/// Hosts accepted as YouTube video links
const YOUTUBE_HOSTS: [&str; 4] = ["youtube.com", "youtu.be", "www.youtube.com", "m.youtube.com"];

static DIRECT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)([^&\n?#]+)")
        .expect("valid regex")
});

static QUERY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtube\.com/watch\?.*v=([^&\n?#]+)").expect("valid regex"));

/// A single captioned segment
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Complete transcript for a video
#[derive(Debug, Clone)]
pub struct Transcript {
    pub video_id: String,
    pub title: String,
    pub language: String,
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// Plain text of the transcript: fragments in order, separated by single spaces
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.replace('\n', " "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Title for display, falling back to the video ID when the source gave none
    pub fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            format!("Video ID: {}", self.video_id)
        } else {
            self.title.clone()
        }
    }
}

/// Check whether the input is a URL whose network location is exactly one of
/// the known YouTube hosts.
///
/// The whole authority is compared, so credentials or any explicit port (even
/// the scheme default) make the URL invalid. Anything that fails to parse as a
/// URL is simply not valid.
pub fn validate_youtube_url(input: &str) -> bool {
    let input = input.trim();
    if url::Url::parse(input).is_err() {
        return false;
    }

    // `Url` drops default ports when normalizing, so read the authority from the raw input
    network_location(input)
        .map(|netloc| YOUTUBE_HOSTS.contains(&netloc.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Text between `scheme://` and the first `/`, `?` or `#`
fn network_location(input: &str) -> Option<&str> {
    let (_, rest) = input.split_once("://")?;
    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Extract video ID from the supported YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<String> {
    [&*DIRECT_ID, &*QUERY_ID]
        .iter()
        .find_map(|re| re.captures(input))
        .map(|caps| caps[1].to_string())
}
