use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use spiralpress::{
    application::{
        jobs::{JobService, Scheduler, TickOutcome},
        render::{PageGeometry, SpiralRenderUnit},
        repos::ArtifactStore,
    },
    infra::{
        db::MemoryJobStore,
        http::{HttpState, build_router},
        storage::FsArtifactStore,
    },
};
use tempfile::TempDir;
use tower::ServiceExt;

const BODY_LIMIT: usize = 64 * 1024;

struct TestApp {
    _dir: TempDir,
    router: Router,
    scheduler: Scheduler,
}

fn app() -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(MemoryJobStore::new());
    let artifacts: Arc<dyn ArtifactStore> =
        Arc::new(FsArtifactStore::new(dir.path().to_path_buf()).expect("artifact store"));
    let renderer = Arc::new(SpiralRenderUnit::new(artifacts.clone(), PageGeometry::A4));
    let scheduler = Scheduler::new(store.clone(), renderer, Duration::from_millis(10));
    let router = build_router(
        HttpState::new(JobService::new(store, artifacts)),
        BODY_LIMIT,
    );

    TestApp {
        _dir: dir,
        router,
        scheduler,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    (status, body.to_vec())
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    send(router, request).await
}

async fn submit_text(router: &Router, content: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri("/jobs")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(content.to_string()))
        .expect("request");
    send(router, request).await
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("json body")
}

#[tokio::test]
async fn job_moves_from_accepted_to_downloadable() {
    let app = app();

    let (status, body) = submit_text(&app.router, "alpha,beta,gamma").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let id = json(&body)["id"].as_str().expect("id").to_string();

    let (status, body) = get(&app.router, &format!("/jobs/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let view = json(&body);
    assert_eq!(view["status"], "pending");
    assert!(view.get("artifact_ref").is_none());

    let (status, body) = get(&app.router, &format!("/jobs/{id}/artifact")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json(&body)["error"]["code"], "not_ready");

    assert!(matches!(app.scheduler.tick().await, TickOutcome::Completed(_)));

    let (status, body) = get(&app.router, &format!("/jobs/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let view = json(&body);
    assert_eq!(view["status"], "completed");
    assert_eq!(view["artifact_ref"], format!("{id}.pdf"));

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/jobs/{id}/artifact"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert!(body.starts_with(b"%PDF-1.4"));
}

#[tokio::test]
async fn json_submissions_are_accepted() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/jobs")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"content":"one,two"}"#))
        .expect("request");

    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(json(&body)["id"].is_string());
}

#[tokio::test]
async fn malformed_json_is_rejected() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/jobs")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request");

    let (status, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"]["code"], "bad_request");
}

#[tokio::test]
async fn blank_content_is_rejected() {
    let app = app();
    for content in ["", "   ", ",,,"] {
        let (status, body) = submit_text(&app.router, content).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{content:?}");
        assert_eq!(json(&body)["error"]["code"], "validation_error");
    }
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let app = app();

    let (status, body) = get(&app.router, "/jobs/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"]["code"], "bad_request");

    let missing = uuid::Uuid::new_v4();
    let (status, _) = get(&app.router, &format!("/jobs/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app.router, &format!("/jobs/{missing}/artifact")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = app();
    let content = "word,".repeat(BODY_LIMIT);
    let (status, _) = submit_text(&app.router, &content).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app();
    let (status, body) = get(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}
