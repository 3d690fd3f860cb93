// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Receipt upload route tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

const BOUNDARY: &str = "subtrack-test-boundary";

fn multipart_request(cookie: &str, field: &str, file_name: &str, mime: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n",
            b = BOUNDARY
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/intake")
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_known_service_screenshot() {
    let app = common::create_test_app();
    let (cookie, _) = common::create_test_session(&app.state, "ada@example.com").await;

    let response = app
        .router
        .oneshot(multipart_request(
            &cookie,
            "file",
            "Netflix-receipt.png",
            "image/png",
            b"\x89PNG fake",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["file_name"], "Netflix-receipt.png");
    assert_eq!(body["detected"]["name"], "Netflix");
    assert_eq!(body["detected"]["cost"], 15.99);
    assert_eq!(body["detected"]["billing_cycle"], "monthly");
    assert_eq!(body["detected"]["source"], "known_service");
}

#[tokio::test]
async fn test_pdf_gets_placeholder() {
    let app = common::create_test_app();
    let (cookie, _) = common::create_test_session(&app.state, "bea@example.com").await;

    let response = app
        .router
        .oneshot(multipart_request(
            &cookie,
            "file",
            "spotify-invoice.pdf",
            "application/pdf",
            b"%PDF-1.4",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["detected"]["name"], "Subscription from PDF");
    assert_eq!(body["detected"]["source"], "placeholder");
}

#[tokio::test]
async fn test_unsupported_type_rejected() {
    let app = common::create_test_app();
    let (cookie, _) = common::create_test_session(&app.state, "cy@example.com").await;

    let response = app
        .router
        .oneshot(multipart_request(
            &cookie,
            "file",
            "archive.zip",
            "application/zip",
            b"PK",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "unsupported_file");
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let app = common::create_test_app();
    let (cookie, _) = common::create_test_session(&app.state, "dot@example.com").await;
    let data = vec![b'a'; 10 * 1024 * 1024 + 1];

    let response = app
        .router
        .oneshot(multipart_request(
            &cookie,
            "file",
            "notes.txt",
            "text/plain",
            &data,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = common::body_json(response).await;
    assert!(body["details"].as_str().unwrap().contains("too large"));
}

#[tokio::test]
async fn test_upload_past_body_limit_reports_size_limit() {
    let app = common::create_test_app();
    let (cookie, _) = common::create_test_session(&app.state, "fay@example.com").await;
    let data = vec![0u8; 12 * 1024 * 1024];

    let response = app
        .router
        .oneshot(multipart_request(&cookie, "file", "netflix.png", "image/png", &data))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "unsupported_file");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("Maximum size is 10MB"));
}

#[tokio::test]
async fn test_declared_length_past_body_limit_rejected_up_front() {
    let app = common::create_test_app();
    let (cookie, _) = common::create_test_session(&app.state, "gil@example.com").await;
    let data = vec![0u8; 12 * 1024 * 1024];

    let mut request = multipart_request(&cookie, "file", "netflix.png", "image/png", &data);
    let length = axum::body::HttpBody::size_hint(request.body()).exact().unwrap();
    request
        .headers_mut()
        .insert(header::CONTENT_LENGTH, length.into());

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = common::body_json(response).await;
    let details = body["details"].as_str().unwrap();
    assert!(details.contains(&format!("({} bytes)", length)));
    assert!(details.contains("Maximum size is 10MB"));
}

#[tokio::test]
async fn test_missing_file_field() {
    let app = common::create_test_app();
    let (cookie, _) = common::create_test_session(&app.state, "eve@example.com").await;

    let response = app
        .router
        .oneshot(multipart_request(
            &cookie,
            "attachment",
            "netflix.png",
            "image/png",
            b"x",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_intake_requires_session() {
    let app = common::create_test_app();

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/intake")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
