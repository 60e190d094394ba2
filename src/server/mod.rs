use anyhow::{Context, Result};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::transcript::{AcquisitionResult, ErrorKind, TranscriptService};

/// JSON body returned by the transcript endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApiResponse {
    Success { transcript: String },
    Error { message: String },
}

impl From<AcquisitionResult> for ApiResponse {
    fn from(result: AcquisitionResult) -> Self {
        match result {
            AcquisitionResult::Success { text } => Self::Success { transcript: text },
            AcquisitionResult::Failure { message, .. } => Self::Error { message },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TranscriptQuery {
    pub video_id: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    service: Arc<TranscriptService>,
}

/// HTTP status for an acquisition outcome
pub fn status_code(result: &AcquisitionResult) -> StatusCode {
    match result.kind() {
        None => StatusCode::OK,
        Some(ErrorKind::TranscriptsDisabled | ErrorKind::NoTranscriptFound) => StatusCode::NOT_FOUND,
        Some(ErrorKind::TransientParseFailure) => StatusCode::SERVICE_UNAVAILABLE,
        Some(ErrorKind::UnexpectedFailure) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn router(service: Arc<TranscriptService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/get_transcript", get(get_transcript))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: &ServerConfig, service: Arc<TranscriptService>) -> Result<()> {
    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!("Serving transcripts on http://{}/get_transcript?video_id=VIDEO_ID", address);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// A query string that fails to deserialize is answered like a missing id,
/// so every 400 carries the same JSON body.
pub async fn get_transcript(
    State(state): State<AppState>,
    query: Result<Query<TranscriptQuery>, QueryRejection>,
) -> (StatusCode, Json<ApiResponse>) {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            tracing::debug!("Rejected query string: {}", rejection.body_text());
            TranscriptQuery::default()
        }
    };

    let Some(video_id) = query.video_id.filter(|id| !id.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::Error {
                message: "Missing 'video_id' parameter".to_string(),
            }),
        );
    };

    let result = state.service.acquire(&video_id).await;
    (status_code(&result), Json(result.into()))
}
