use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::MentorError;
use crate::service::MentorService;
use crate::types::{BuildReport, MentorListing, QueryProfile, RecommendResponse};

type AppState = Arc<MentorService>;

pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/mentors", get(mentors))
        .route("/build-index", post(build_index))
        .route("/recommend", post(recommend))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

#[derive(Debug, Serialize)]
struct Liveness {
    message: &'static str,
}

async fn root() -> Json<Liveness> {
    Json(Liveness {
        message: "Mentor RAG service running",
    })
}

async fn mentors(State(service): State<AppState>) -> Result<Json<MentorListing>, ApiError> {
    let listing = blocking(move || service.list_mentors(false)).await??;
    Ok(Json(listing))
}

/// `stdout` carries the step log on success, `stderr` the log plus the
/// failure reason otherwise.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum BuildResponse {
    Ok { stdout: String, report: BuildReport },
    Error { stderr: String, report: BuildReport },
}

async fn build_index(State(service): State<AppState>) -> Result<Json<BuildResponse>, ApiError> {
    let report = blocking(move || service.rebuild()).await?;
    let output = report.output();
    Ok(Json(if report.is_success() {
        BuildResponse::Ok {
            stdout: output,
            report,
        }
    } else {
        BuildResponse::Error {
            stderr: output,
            report,
        }
    }))
}

async fn recommend(
    State(service): State<AppState>,
    Json(profile): Json<QueryProfile>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let response = blocking(move || service.recommend(&profile)).await??;
    Ok(Json(response))
}

/// Embedding and file I/O block; keep them off the async workers.
async fn blocking<F, T>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!(error = %e, "blocking task failed");
        ApiError {
            detail: format!("internal task failed: {e}"),
        }
    })
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    detail: String,
}

impl From<MentorError> for ApiError {
    fn from(err: MentorError) -> Self {
        tracing::warn!(code = %err.status_code(), error = %err, "request failed");
        Self {
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}
