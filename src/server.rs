//! HTTP surface: form page, batch analysis and report download.

use crate::{
    page::{self, PageView, ResultView},
    pipeline::{AnalysisOutcome, Pipeline, Upload},
    util::is_job_id,
};
use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path as AxumPath, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

const MAIN_JS: &str = include_str!("../ui/main.js");
const STYLE_CSS: &str = include_str!("../ui/style.css");

/// Shared across handlers. Models inside the pipeline are read-only.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub out_root: PathBuf,
    /// Job id of the most recent successful analysis, served by `/download`.
    pub latest: Arc<Mutex<Option<String>>>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, out_root: PathBuf) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            out_root,
            latest: Arc::new(Mutex::new(None)),
        }
    }

    fn report_path(&self, job_id: &str) -> PathBuf {
        self.out_root
            .join(job_id)
            .join(&self.pipeline.config().report.pdf_filename)
    }

    fn set_latest(&self, job_id: &str) {
        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some(job_id.to_string());
        }
    }

    fn latest(&self) -> Option<String> {
        self.latest.lock().ok().and_then(|l| l.clone())
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.pipeline.config().server.max_body_bytes;
    Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze))
        .route("/download", get(download_latest))
        .route("/download/:job_id", get(download_job))
        .route("/static/main.js", get(main_js))
        .route("/static/style.css", get(style_css))
        .route("/health", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub async fn serve(state: AppState, bind_addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
        .with_context(|| "http server failed")
}

async fn index() -> Html<String> {
    Html(page::render(&PageView::default()))
}

async fn main_js() -> Response {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        MAIN_JS,
    )
        .into_response()
}

async fn style_css() -> Response {
    ([(header::CONTENT_TYPE, "text/css")], STYLE_CSS).into_response()
}

fn page_response(status: StatusCode, view: &PageView) -> Response {
    (status, Html(page::render(view))).into_response()
}

async fn analyze(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut uploads = Vec::new();
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("images") {
                    continue;
                }
                let filename = field.file_name().unwrap_or("").to_string();
                match field.bytes().await {
                    Ok(bytes) => uploads.push(Upload::new(filename, bytes.to_vec())),
                    Err(e) => {
                        warn!("failed to read upload bytes: {e}");
                        return page_response(
                            StatusCode::BAD_REQUEST,
                            &PageView::error("Failed to read uploaded file.", Vec::new()),
                        );
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("malformed multipart body: {e}");
                return page_response(
                    StatusCode::BAD_REQUEST,
                    &PageView::error("Failed to read uploaded file.", Vec::new()),
                );
            }
        }
    }

    if uploads.first().is_none_or(|u| u.filename.is_empty()) {
        return page_response(
            StatusCode::OK,
            &PageView::error("Please upload an image.", Vec::new()),
        );
    }

    let pipeline = state.pipeline.clone();
    let out_root = state.out_root.clone();
    let outcome =
        tokio::task::spawn_blocking(move || pipeline.run_batch(&uploads, &out_root)).await;

    match outcome {
        Ok(Ok(AnalysisOutcome::Report {
            job_id,
            aggregate,
            skipped,
            ..
        })) => {
            state.set_latest(&job_id);
            let view = PageView {
                error: None,
                result: Some(ResultView::new(&aggregate, format!("/download/{job_id}"))),
                skipped,
            };
            page_response(StatusCode::OK, &view)
        }
        Ok(Ok(AnalysisOutcome::NoValidImages { skipped, .. })) => page_response(
            StatusCode::OK,
            &PageView::error("No valid house images found.", skipped),
        ),
        Ok(Err(err)) => {
            error!("analysis failed: {:#}", err);
            page_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &PageView::error("Analysis failed. Please try again.", Vec::new()),
            )
        }
        Err(err) => {
            error!("analysis task panicked: {err}");
            page_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &PageView::error("Analysis failed. Please try again.", Vec::new()),
            )
        }
    }
}

async fn download_latest(State(state): State<AppState>) -> Response {
    match state.latest() {
        Some(job_id) => send_report(&state, &job_id).await,
        None => (StatusCode::NOT_FOUND, "no report generated yet").into_response(),
    }
}

async fn download_job(State(state): State<AppState>, AxumPath(job_id): AxumPath<String>) -> Response {
    if !is_job_id(&job_id) {
        return (StatusCode::NOT_FOUND, "unknown report").into_response();
    }
    send_report(&state, &job_id).await
}

async fn send_report(state: &AppState, job_id: &str) -> Response {
    let path = state.report_path(job_id);
    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!(
                        "attachment; filename=\"{}\"",
                        state.pipeline.config().report.pdf_filename
                    ),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => {
            warn!("report unavailable {}: {err}", path.display());
            (StatusCode::NOT_FOUND, "unknown report").into_response()
        }
    }
}
