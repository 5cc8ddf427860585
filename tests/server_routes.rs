mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use common::*;
use graminscore::{
    config::Config,
    server::{build_router, AppState},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

const BOUNDARY: &str = "graminscore-test-boundary";

fn app(out_root: &std::path::Path) -> Router {
    let cfg = Config::default();
    let p = pipeline(
        &cfg,
        KeyedClassifier::new(&[(1, HOUSE_ROOF), (2, CAT)]),
        Some(KeyedCondition::constant(0.82)),
    );
    build_router(AppState::new(p, out_root.to_path_buf()))
}

fn multipart(files: &[(&str, Vec<u8>)]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, bytes) in files {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"images\"; filename=\"{name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(resp: axum::response::Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[tokio::test]
async fn index_serves_form() {
    let tmp = tempfile::tempdir().unwrap();
    let resp = app(tmp.path()).oneshot(get("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("action=\"/analyze\""));
    assert!(html.contains("name=\"images\""));
}

#[tokio::test]
async fn analyze_then_download() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(tmp.path());

    let resp = app
        .clone()
        .oneshot(multipart(&[
            ("front.png", png_bytes(1)),
            ("cat.png", png_bytes(2)),
        ]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("<span class=\"score\">82</span>/100"));
    assert!(html.contains("Roof: 82"));
    assert!(html.contains("Walls: Data Not Available"));
    assert!(html.contains("cat.png (Detected: cat)"));
    assert!(html.contains("href=\"/download/"));

    let resp = app.clone().oneshot(get("/download")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    assert!(resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("attachment"));
    let pdf = resp.into_body().collect().await.unwrap().to_bytes();
    assert!(pdf.starts_with(b"%PDF"));
}

#[tokio::test]
async fn no_valid_images_reports_error() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(tmp.path());

    let resp = app
        .clone()
        .oneshot(multipart(&[("cat.png", png_bytes(2))]))
        .await
        .unwrap();
    let html = body_text(resp).await;
    assert!(html.contains("No valid house images found."));
    assert!(html.contains("cat.png (Detected: cat)"));

    let resp = app.oneshot(get("/download")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_submission_asks_for_upload() {
    let tmp = tempfile::tempdir().unwrap();
    let resp = app(tmp.path())
        .oneshot(multipart(&[("", Vec::new())]))
        .await
        .unwrap();
    let html = body_text(resp).await;
    assert!(html.contains("Please upload an image."));
}

#[tokio::test]
async fn download_rejects_bad_job_ids() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(tmp.path());
    let resp = app.clone().oneshot(get("/download/not-a-job")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let unknown = "0".repeat(64);
    let resp = app.oneshot(get(&format!("/download/{unknown}"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_assets_and_health() {
    let tmp = tempfile::tempdir().unwrap();
    let app = app(tmp.path());
    let resp = app.clone().oneshot(get("/static/main.js")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(body_text(resp).await, "ok");
}
