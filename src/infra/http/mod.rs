//! HTTP surface: submit, poll and download.

mod jobs;
mod middleware;

pub use jobs::{SubmitJobRequest, SubmitJobResponse};
pub use middleware::RequestContext;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};

use crate::application::jobs::JobService;

#[derive(Clone)]
pub struct HttpState {
    pub jobs: JobService,
}

impl HttpState {
    pub fn new(jobs: JobService) -> Self {
        Self { jobs }
    }
}

pub fn build_router(state: HttpState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/jobs", post(jobs::submit_job))
        .route("/jobs/{id}", get(jobs::job_status))
        .route("/jobs/{id}/artifact", get(jobs::download_artifact))
        .route("/health", get(jobs::health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(from_fn(middleware::log_responses))
        .layer(from_fn(middleware::set_request_context))
        .with_state(state)
}
