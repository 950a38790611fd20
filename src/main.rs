use std::path::PathBuf;

use eyre::{Result, bail};
use log::{debug, info};

use ytsum::config::{self, Config};
use ytsum::pipeline::{Pipeline, Stage};
use ytsum::server::{self, DynPipeline};
use ytsum::summarize::{Gemini, SummaryOutcome, TextGenerator};
use ytsum::youtube::{CaptionSource, InnerTube};

mod cli;

use cli::Cli;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytsum.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytsum")
        .join("logs")
}

fn build_after_help() -> String {
    let key_line = match config::api_key_from_env() {
        Some(_) => "  \x1b[32m✅\x1b[0m GOOGLE_API_KEY  set".to_string(),
        None => "  \x1b[31m❌\x1b[0m GOOGLE_API_KEY  (not set — summaries will fail)".to_string(),
    };

    format!(
        "\nENVIRONMENT:\n{key_line}\n\nConfig: {}\nLogs are written to: {}",
        config::config_path().display(),
        log_dir().join("ytsum.log").display()
    )
}

fn build_pipeline(config: &Config) -> DynPipeline {
    let client = reqwest::Client::new();
    let captions: Box<dyn CaptionSource> = Box::new(InnerTube::new(client.clone(), config.lang.clone()));
    let generator: Box<dyn TextGenerator> = Box::new(Gemini::new(client, config));
    Pipeline::new(captions, generator)
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid); CLI flags take priority
    let mut config = Config::load().unwrap_or_default();
    if let Some(lang) = cli.lang.clone() {
        config.lang = lang;
    }
    if let Some(model) = cli.model.clone() {
        config.model = model;
    }
    if let Some(host) = cli.host.clone() {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    let config = config.with_api_key(config::api_key_from_env());
    debug!("Using model {} with caption language {}", config.model, config.lang);

    let pipeline = build_pipeline(&config);

    if cli.serve {
        return server::run_serve(&config.host, config.port, pipeline).await;
    }

    let Some(url) = cli.url.as_deref() else {
        bail!("no URL provided\n\nUsage: ytsum <URL>\n       ytsum --serve");
    };

    let verbose = cli.verbose;
    let observer = move |stage: Stage| {
        if verbose {
            eprintln!("[{:>3}%] {}", stage.progress(), stage.label());
        }
    };

    let report = pipeline.run(url, &observer).await?;

    if cli.verbose {
        eprintln!("Video: {} ({})", report.title, report.video_id);
    }

    let summary_error = match &report.summary {
        SummaryOutcome::Generated(summary) => {
            println!("{summary}");
            None
        }
        SummaryOutcome::Failed(reason) => {
            eprintln!("Summary failed: {reason}");
            Some(reason.clone())
        }
    };

    // A failed summary still leaves the transcript to show and save
    if cli.transcript || summary_error.is_some() {
        println!("\n--- Transcript ---\n{}", report.transcript);
    }

    if let Some(ref dir) = cli.save {
        let (summary_path, transcript_path) = ytsum::output::write_downloads(dir, &report)?;
        if cli.verbose {
            if let Some(path) = summary_path {
                eprintln!("Summary written to: {}", path.display());
            }
            eprintln!("Transcript written to: {}", transcript_path.display());
        }
    }

    if let Some(reason) = summary_error {
        bail!(reason);
    }

    Ok(())
}
