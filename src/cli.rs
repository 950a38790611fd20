use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ytsum",
    about = "Summarize YouTube videos from their captions",
    version
)]
pub struct Cli {
    /// YouTube video URL
    #[arg(required_unless_present = "serve")]
    pub url: Option<String>,

    /// Start the web UI instead of summarizing a single URL
    #[arg(long, conflicts_with = "url")]
    pub serve: bool,

    /// Address for the web UI
    #[arg(long)]
    pub host: Option<String>,

    /// Port for the web UI
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Write the summary and transcript files into this directory
    #[arg(short, long)]
    pub save: Option<PathBuf>,

    /// Preferred caption language
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Gemini model for summarization
    #[arg(long)]
    pub model: Option<String>,

    /// Also print the full transcript
    #[arg(short, long)]
    pub transcript: bool,

    /// Show pipeline stages and video metadata
    #[arg(short, long)]
    pub verbose: bool,
}
