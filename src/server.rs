//! Single-page web UI and its JSON endpoints.
//!
//! The page drives its progress bar from `/ws/summarize`, which streams one
//! message per pipeline stage followed by the result or the error.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::output::{render_markdown, summary_file_name, transcript_file_name};
use crate::pipeline::{Pipeline, PipelineError, Report, Stage};
use crate::summarize::{SummaryOutcome, TextGenerator};
use crate::validate_youtube_url;
use crate::youtube::{CaptionSource, TranscriptError};

const INDEX_HTML: &str = include_str!("../static/index.html");

pub type DynPipeline = Pipeline<dyn CaptionSource, dyn TextGenerator>;

pub struct AppState {
    pub pipeline: DynPipeline,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/validate", get(validate))
        .route("/api/summarize", post(summarize))
        .route("/ws/summarize", get(ws_summarize))
        .with_state(state)
}

/// Bind `host:port` and serve until the process is stopped
pub async fn run_serve(host: &str, port: u16, pipeline: DynPipeline) -> eyre::Result<()> {
    let app = router(Arc::new(AppState { pipeline }));

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}");
    eprintln!("YouTube Video Summarizer running at http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Deserialize)]
struct ValidateQuery {
    #[serde(default)]
    url: String,
}

#[derive(Serialize)]
struct ValidateResponse {
    valid: bool,
}

#[derive(Deserialize)]
struct SummarizeRequest {
    url: String,
}

/// A fetched transcript plus either a summary or the reason there is none
#[derive(Debug, Serialize)]
struct SummarizeResponse {
    video_id: String,
    title: String,
    transcript: String,
    transcript_file: String,
    summary: Option<String>,
    summary_html: Option<String>,
    summary_file: Option<String>,
    summary_error: Option<String>,
}

impl From<Report> for SummarizeResponse {
    fn from(report: Report) -> Self {
        let (summary, summary_error) = match report.summary {
            SummaryOutcome::Generated(text) => (Some(text), None),
            SummaryOutcome::Failed(reason) => (None, Some(reason)),
        };

        Self {
            transcript_file: transcript_file_name(&report.video_id),
            summary_file: summary.as_ref().map(|_| summary_file_name(&report.video_id)),
            summary_html: summary.as_deref().map(render_markdown),
            summary,
            summary_error,
            video_id: report.video_id,
            title: report.title,
            transcript: report.transcript,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    stage: Stage,
}

impl From<&PipelineError> for ErrorResponse {
    fn from(err: &PipelineError) -> Self {
        Self {
            error: err.to_string(),
            stage: err.stage(),
        }
    }
}

/// Messages sent over `/ws/summarize`
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ProgressMessage {
    Stage {
        stage: Stage,
        progress: u8,
        label: &'static str,
    },
    Result(SummarizeResponse),
    Error(ErrorResponse),
}

impl ProgressMessage {
    fn stage(stage: Stage) -> Self {
        ProgressMessage::Stage {
            stage,
            progress: stage.progress(),
            label: stage.label(),
        }
    }

    fn to_ws(&self) -> Option<Message> {
        serde_json::to_string(self).ok().map(|json| Message::Text(json.into()))
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn validate(Query(query): Query<ValidateQuery>) -> Json<ValidateResponse> {
    Json(ValidateResponse {
        valid: validate_youtube_url(&query.url),
    })
}

async fn summarize(State(state): State<Arc<AppState>>, Json(req): Json<SummarizeRequest>) -> Response {
    let observer = |stage: Stage| debug!("Stage: {stage}");

    match state.pipeline.run(&req.url, &observer).await {
        Ok(report) => Json(SummarizeResponse::from(report)).into_response(),
        Err(e) => {
            info!("Request failed at {}: {e}", e.stage());
            (status_for(&e), Json(ErrorResponse::from(&e))).into_response()
        }
    }
}

async fn ws_summarize(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_summarize_socket(socket, state))
}

/// Read one request from the socket, then stream the run's progress back
async fn handle_summarize_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let request = loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => break serde_json::from_str::<SummarizeRequest>(text.as_str()),
            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
            Some(Ok(_)) => continue,
        }
    };

    let url = match request {
        Ok(req) => req.url,
        Err(e) => {
            warn!("Malformed summarize request: {e}");
            let reply = ProgressMessage::Error(ErrorResponse {
                error: format!("Invalid request: {e}"),
                stage: Stage::Validate,
            });
            if let Some(msg) = reply.to_ws() {
                let _ = sender.send(msg).await;
            }
            let _ = sender.close().await;
            return;
        }
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressMessage>();

    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let Some(msg) = message.to_ws() else { continue };
            if sender.send(msg).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    stream_summary(&state.pipeline, &url, &tx).await;
    drop(tx);
    let _ = send_task.await;
}

/// Run the pipeline, sending a message as each stage starts and one final
/// result or error
async fn stream_summary(pipeline: &DynPipeline, url: &str, tx: &mpsc::UnboundedSender<ProgressMessage>) {
    let observer = |stage: Stage| {
        debug!("Stage: {stage}");
        let _ = tx.send(ProgressMessage::stage(stage));
    };

    let last = match pipeline.run(url, &observer).await {
        Ok(report) => ProgressMessage::Result(report.into()),
        Err(e) => {
            info!("Request failed at {}: {e}", e.stage());
            ProgressMessage::Error(ErrorResponse::from(&e))
        }
    };
    let _ = tx.send(last);
}

fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::EmptyUrl | PipelineError::InvalidUrl | PipelineError::NoVideoId => StatusCode::BAD_REQUEST,
        PipelineError::Transcript(TranscriptError::NoTranscript | TranscriptError::Unavailable) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        PipelineError::Transcript(TranscriptError::Retrieval(_)) => StatusCode::BAD_GATEWAY,
    }
}
