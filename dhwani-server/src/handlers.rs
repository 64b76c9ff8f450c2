use crate::state::AppState;
use axum::{
    extract::{Form, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use dhwani_core::request::RawRequest;
use dhwani_core::SynthesisError;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// Responses that hand out artifact paths must never be cached: the files
/// behind them are swept on a TTL.
fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    headers
}

/// Liveness page, independent of model availability.
pub async fn home() -> impl IntoResponse {
    (StatusCode::OK, no_cache_headers(), "dhwani text-to-speech service")
}

#[derive(Serialize)]
pub struct StatusResponse {
    status: String,
    model_root_present: bool,
    artifact_dir_writable: bool,
}

/// Deployment status. Always 200; the body says what is missing.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let artifact_dir = state.service.store().dir();
    let writable = std::fs::metadata(artifact_dir)
        .map(|meta| !meta.permissions().readonly())
        .unwrap_or(false);

    Json(StatusResponse {
        status: "ok".to_string(),
        model_root_present: state.service.checker().root_present(),
        artifact_dir_writable: writable,
    })
}

/// All fields optional: admission in the core owns missing-field errors, so
/// the client gets a 400 with a reason instead of a framework 422.
#[derive(Deserialize)]
pub struct SynthesizeForm {
    text: Option<String>,
    language: Option<String>,
    gender: Option<String>,
    alpha: Option<String>,
}

#[derive(Serialize)]
struct SuccessResponse {
    status: &'static str,
    audio_path: String,
    process_time: f64,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    message: String,
}

pub async fn synthesize(
    State(state): State<AppState>,
    Form(form): Form<SynthesizeForm>,
) -> Response {
    let raw = RawRequest {
        text: form.text,
        language: form.language,
        gender: form.gender,
        alpha: form.alpha,
    };

    match state.service.synthesize(raw).await {
        Ok(output) => {
            let body = SuccessResponse {
                status: "success",
                audio_path: format!("/static/audio/{}", output.file_name),
                process_time: output.elapsed.as_secs_f64(),
            };
            (StatusCode::OK, no_cache_headers(), Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn error_response(err: SynthesisError) -> Response {
    // Full detail goes to the log; the client sees a stable status and a
    // message without internal paths or stderr.
    let status = match &err {
        SynthesisError::Validation(reason) => {
            warn!(%reason, "Rejected invalid request");
            StatusCode::BAD_REQUEST
        }
        SynthesisError::ResourceNotFound {
            which,
            language,
            gender,
        } => {
            warn!(%which, %language, %gender, "Requested resource is not installed");
            StatusCode::SERVICE_UNAVAILABLE
        }
        SynthesisError::PoolSaturated => {
            warn!("Synthesis pool saturated, rejecting request");
            StatusCode::SERVICE_UNAVAILABLE
        }
        SynthesisError::TimedOut => {
            error!("Synthesis timed out");
            StatusCode::GATEWAY_TIMEOUT
        }
        SynthesisError::ProcessFailed {
            exit_code,
            stderr_tail,
        } => {
            error!(exit_code, stderr = %stderr_tail, "Synthesis worker failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        SynthesisError::ArtifactMissing => {
            error!("Worker exited cleanly but produced no artifact");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        SynthesisError::Internal(source) => {
            error!(error = ?source, "Unexpected error handling synthesis request");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let body = ErrorResponse {
        status: "error",
        message: err.public_message(),
    };
    (status, Json(body)).into_response()
}
