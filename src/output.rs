use std::path::{Path, PathBuf};

use eyre::Result;
use log::debug;
use pulldown_cmark::{Event, Options, Parser, html};

use crate::pipeline::Report;
use crate::summarize::SummaryOutcome;

/// Prefix for downloaded files, named after the hosting service
const SERVICE: &str = "youtube";

pub fn summary_file_name(video_id: &str) -> String {
    format!("{SERVICE}_summary_{video_id}.txt")
}

pub fn transcript_file_name(video_id: &str) -> String {
    format!("{SERVICE}_transcript_{video_id}.txt")
}

/// Render summary markdown to HTML; raw HTML in the input is shown as text
pub fn render_markdown(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut out = String::new();
    html::push_html(&mut out, events);
    out
}

/// Write the transcript, and the summary when one was generated, into `dir`
pub fn write_downloads(dir: &Path, report: &Report) -> Result<(Option<PathBuf>, PathBuf)> {
    std::fs::create_dir_all(dir)?;

    let summary_path = match &report.summary {
        SummaryOutcome::Generated(summary) => {
            let path = dir.join(summary_file_name(&report.video_id));
            std::fs::write(&path, summary)?;
            debug!("Wrote summary: {}", path.display());
            Some(path)
        }
        SummaryOutcome::Failed(_) => None,
    };

    let transcript_path = dir.join(transcript_file_name(&report.video_id));
    std::fs::write(&transcript_path, &report.transcript)?;
    debug!("Wrote transcript: {}", transcript_path.display());

    Ok((summary_path, transcript_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(summary: SummaryOutcome) -> Report {
        Report {
            video_id: "abc123".to_string(),
            title: "Test".to_string(),
            transcript: "Never gonna give".to_string(),
            summary,
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ytsum-{name}-{}", std::process::id()))
    }

    #[test]
    fn test_file_names() {
        assert_eq!(summary_file_name("dQw4w9WgXcQ"), "youtube_summary_dQw4w9WgXcQ.txt");
        assert_eq!(transcript_file_name("dQw4w9WgXcQ"), "youtube_transcript_dQw4w9WgXcQ.txt");
    }

    #[test]
    fn test_write_downloads_literal_content() {
        let dir = scratch_dir("literal");
        let report = report(SummaryOutcome::Generated("* point".to_string()));

        let (summary_path, transcript_path) = write_downloads(&dir, &report).unwrap();
        let summary_path = summary_path.unwrap();
        assert_eq!(summary_path.file_name().unwrap(), "youtube_summary_abc123.txt");
        assert_eq!(std::fs::read_to_string(&summary_path).unwrap(), "* point");
        assert_eq!(std::fs::read_to_string(&transcript_path).unwrap(), "Never gonna give");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_downloads_failed_summary_keeps_transcript() {
        let dir = scratch_dir("failed");
        let report = report(SummaryOutcome::Failed("Failed to generate summary.".to_string()));

        let (summary_path, transcript_path) = write_downloads(&dir, &report).unwrap();
        assert!(summary_path.is_none());
        assert!(!dir.join("youtube_summary_abc123.txt").exists());
        assert_eq!(std::fs::read_to_string(&transcript_path).unwrap(), "Never gonna give");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_render_markdown_lists_and_emphasis() {
        let html = render_markdown("## Key points\n\n* **one**\n* two\n");
        assert!(html.contains("<h2>Key points</h2>"));
        assert!(html.contains("<li><strong>one</strong></li>"));
        assert!(html.contains("<li>two</li>"));
    }

    #[test]
    fn test_render_markdown_escapes_raw_html() {
        let html = render_markdown("hello <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
