//! Runs one URL through validate, extract, fetch and summarize.
//!
//! A failure up to and including the transcript fetch stops the run with a
//! [`PipelineError`] and nothing else. Once a transcript is in hand the run
//! always produces a [`Report`]; a failed summary is carried inside it.

use std::fmt;

use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::summarize::{SummaryOutcome, TextGenerator, generate_summary};
use crate::youtube::{CaptionSource, TranscriptError, fetch_transcript};
use crate::{extract_video_id, validate_youtube_url};

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validate,
    Extract,
    Fetch,
    Summarize,
    Done,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Validate,
        Stage::Extract,
        Stage::Fetch,
        Stage::Summarize,
        Stage::Done,
    ];

    /// Percentage shown by a progress bar when this stage starts
    pub fn progress(self) -> u8 {
        match self {
            Stage::Validate => 0,
            Stage::Extract => 10,
            Stage::Fetch => 33,
            Stage::Summarize => 66,
            Stage::Done => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Validate => "Validating URL...",
            Stage::Extract => "Extracting video ID...",
            Stage::Fetch => "Extracting transcript...",
            Stage::Summarize => "Generating AI summary...",
            Stage::Done => "Complete!",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Validate => write!(f, "validate"),
            Stage::Extract => write!(f, "extract"),
            Stage::Fetch => write!(f, "fetch"),
            Stage::Summarize => write!(f, "summarize"),
            Stage::Done => write!(f, "done"),
        }
    }
}

/// Notified as the pipeline enters each stage
pub trait ProgressObserver {
    fn stage(&self, stage: Stage);
}

/// Observer that ignores progress
#[derive(Debug, Clone, Copy, Default)]
pub struct Quiet;

impl ProgressObserver for Quiet {
    fn stage(&self, _stage: Stage) {}
}

impl<F: Fn(Stage)> ProgressObserver for F {
    fn stage(&self, stage: Stage) {
        self(stage)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("Please enter a YouTube URL.")]
    EmptyUrl,

    #[error("Please enter a valid YouTube URL.")]
    InvalidUrl,

    #[error("Could not extract video ID from the URL. Please check the URL format.")]
    NoVideoId,

    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

impl PipelineError {
    /// Stage at which the run stopped
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::EmptyUrl | PipelineError::InvalidUrl => Stage::Validate,
            PipelineError::NoVideoId => Stage::Extract,
            PipelineError::Transcript(_) => Stage::Fetch,
        }
    }
}

/// Everything a run produces once the transcript has been fetched
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub video_id: String,
    pub title: String,
    pub transcript: String,
    pub summary: SummaryOutcome,
}

pub struct Pipeline<C: ?Sized, G: ?Sized> {
    captions: Box<C>,
    generator: Box<G>,
}

impl<C, G> Pipeline<C, G>
where
    C: CaptionSource + ?Sized,
    G: TextGenerator + ?Sized,
{
    pub fn new(captions: Box<C>, generator: Box<G>) -> Self {
        Self { captions, generator }
    }

    pub async fn run(&self, url: &str, observer: &(dyn ProgressObserver + Sync)) -> Result<Report, PipelineError> {
        let url = url.trim();

        observer.stage(Stage::Validate);
        if url.is_empty() {
            return Err(PipelineError::EmptyUrl);
        }
        if !validate_youtube_url(url) {
            debug!("Rejected URL: {url}");
            return Err(PipelineError::InvalidUrl);
        }

        observer.stage(Stage::Extract);
        let video_id = extract_video_id(url).ok_or(PipelineError::NoVideoId)?;
        info!("Processing video {video_id}");

        observer.stage(Stage::Fetch);
        let transcript = fetch_transcript(&*self.captions, &video_id).await?;
        let text = transcript.text();
        info!("Transcript for {video_id}: {} segments, {} chars", transcript.segments.len(), text.len());

        observer.stage(Stage::Summarize);
        let summary = generate_summary(&*self.generator, &text).await;
        match &summary {
            SummaryOutcome::Generated(generated) => info!("Summary for {video_id}: {} chars", generated.len()),
            SummaryOutcome::Failed(reason) => warn!("No summary for {video_id}: {reason}"),
        }

        observer.stage(Stage::Done);

        Ok(Report {
            video_id,
            title: transcript.display_title(),
            transcript: text,
            summary,
        })
    }
}
