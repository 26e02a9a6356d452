use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    application::{
        error::{HttpError, codes},
        render::artifact_name,
    },
    domain::entities::JobStatusView,
};

use super::HttpState;

const SOURCE: &str = "infra::http::jobs";

#[derive(Debug, Deserialize)]
pub struct SubmitJobRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    pub id: Uuid,
}

/// Accept either a raw text body or `{"content": "..."}` when sent as JSON.
pub async fn submit_job(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<SubmitJobResponse>), HttpError> {
    let content = extract_content(&headers, &body)?;
    let id = state.jobs.submit_job(&content).await?;
    Ok((StatusCode::ACCEPTED, Json(SubmitJobResponse { id })))
}

pub async fn job_status(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<Json<JobStatusView>, HttpError> {
    let id = parse_job_id(&id)?;
    let view = state.jobs.get_job_status(id).await?;
    Ok(Json(view))
}

pub async fn download_artifact(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<Response, HttpError> {
    let id = parse_job_id(&id)?;
    let bytes = state.jobs.download_artifact(id).await?;
    let disposition = format!("attachment; filename=\"{}\"", artifact_name(id));

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

pub async fn health() -> &'static str {
    "ok"
}

fn extract_content(headers: &HeaderMap, body: &Bytes) -> Result<String, HttpError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));

    if is_json {
        let request: SubmitJobRequest = serde_json::from_slice(body).map_err(|err| {
            HttpError::from_error(
                SOURCE,
                StatusCode::BAD_REQUEST,
                codes::BAD_REQUEST,
                "Malformed JSON body",
                &err,
            )
            .with_hint("expected {\"content\": \"...\"}")
        })?;
        return Ok(request.content);
    }

    String::from_utf8(body.to_vec()).map_err(|err| {
        HttpError::from_error(
            SOURCE,
            StatusCode::BAD_REQUEST,
            codes::BAD_REQUEST,
            "Body must be UTF-8 text",
            &err,
        )
    })
}

fn parse_job_id(raw: &str) -> Result<Uuid, HttpError> {
    Uuid::parse_str(raw).map_err(|err| {
        HttpError::from_error(
            SOURCE,
            StatusCode::BAD_REQUEST,
            codes::BAD_REQUEST,
            "Malformed job id",
            &err,
        )
        .with_hint("job ids are UUIDs")
    })
}
