mod common;

use axum::http::StatusCode;
use tower::ServiceExt;

use common::{authed_request, body_json, register_user, test_app, upload_request};

#[tokio::test]
async fn upload_stores_file_and_reports_counter() {
    let (app, state, _dir) = test_app().await;
    let (_, token) = register_user(&app, "alice@example.com", "password123").await;

    let response = app
        .clone()
        .oneshot(upload_request(&token, "report.pdf", b"fake pdf bytes"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["original_filename"], "report.pdf");
    assert_eq!(body["free_docs_used"], 1);

    let stored_filename = body["stored_filename"].as_str().unwrap();
    assert!(stored_filename.ends_with(".pdf"));
    assert_ne!(stored_filename, "report.pdf");

    // The bytes really are on disk under the server-chosen name.
    let path = format!("{}/{}", state.config.upload.storage_dir, stored_filename);
    let on_disk = tokio::fs::read(&path).await.unwrap();
    assert_eq!(on_disk, b"fake pdf bytes");
}

#[tokio::test]
async fn upload_requires_authentication() {
    let (app, _state, _dir) = test_app().await;

    let response = app
        .clone()
        .oneshot(upload_request("bogus-token", "a.txt", b"hi"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn upload_without_file_field_is_rejected() {
    let (app, _state, _dir) = test_app().await;
    let (_, token) = register_user(&app, "alice@example.com", "password123").await;

    let boundary = "test-boundary-1d8f3a";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{b}--\r\n",
        b = boundary
    );
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/documents/upload")
        .header("authorization", format!("Bearer {}", token))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(axum::body::Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "Upload error: No file uploaded");
}

#[tokio::test]
async fn free_quota_allows_three_uploads_then_blocks() {
    let (app, state, _dir) = test_app().await;
    let (_, token) = register_user(&app, "alice@example.com", "password123").await;

    for expected in 1..=3 {
        let response = app
            .clone()
            .oneshot(upload_request(&token, "doc.txt", b"contents"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["free_docs_used"], expected);
    }

    let response = app
        .clone()
        .oneshot(upload_request(&token, "doc.txt", b"contents"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(
        body_json(response).await["detail"],
        "Free limit reached. Subscribe to upload unlimited documents."
    );

    // The rejected attempt neither bumped the counter nor left a file.
    let me = app
        .clone()
        .oneshot(authed_request("GET", "/me", &token))
        .await
        .unwrap();
    assert_eq!(body_json(me).await["free_docs_used"], 3);

    let mut files = 0;
    let mut entries = tokio::fs::read_dir(&state.config.upload.storage_dir)
        .await
        .unwrap();
    while entries.next_entry().await.unwrap().is_some() {
        files += 1;
    }
    assert_eq!(files, 3);
}

#[tokio::test]
async fn concurrent_uploads_cannot_both_take_the_last_slot() {
    let (app, _state, _dir) = test_app().await;
    let (_, token) = register_user(&app, "alice@example.com", "password123").await;

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(upload_request(&token, "doc.txt", b"contents"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // One free slot left, two racing uploads.
    let (a, b) = tokio::join!(
        app.clone()
            .oneshot(upload_request(&token, "left.txt", b"left")),
        app.clone()
            .oneshot(upload_request(&token, "right.txt", b"right"))
    );
    let statuses = [a.unwrap().status(), b.unwrap().status()];
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::OK).count(),
        1,
        "exactly one upload should win the last slot, got {:?}",
        statuses
    );
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == StatusCode::PAYMENT_REQUIRED)
            .count(),
        1
    );

    // Counter settled exactly at the cap.
    let me = app
        .clone()
        .oneshot(authed_request("GET", "/me", &token))
        .await
        .unwrap();
    assert_eq!(body_json(me).await["free_docs_used"], 3);
}

#[tokio::test]
async fn listing_returns_own_documents_newest_first() {
    let (app, _state, _dir) = test_app().await;
    let (_, token) = register_user(&app, "alice@example.com", "password123").await;

    for name in ["first.txt", "second.txt"] {
        let response = app
            .clone()
            .oneshot(upload_request(&token, name, b"contents"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/documents", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["original_filename"], "second.txt");
    assert_eq!(items[1]["original_filename"], "first.txt");
    assert_eq!(items[0]["status"], "uploaded");
}

#[tokio::test]
async fn documents_are_invisible_across_users() {
    let (app, _state, _dir) = test_app().await;
    let (_, alice) = register_user(&app, "alice@example.com", "password123").await;
    let (_, bob) = register_user(&app, "bob@example.com", "password123").await;

    let response = app
        .clone()
        .oneshot(upload_request(&alice, "private.txt", b"alice's"))
        .await
        .unwrap();
    let document_id = body_json(response).await["document_id"].as_i64().unwrap();

    // Bob sees an empty list, and Alice's document 404s for him exactly like
    // a document that does not exist at all.
    let listing = app
        .clone()
        .oneshot(authed_request("GET", "/documents", &bob))
        .await
        .unwrap();
    assert_eq!(body_json(listing).await.as_array().unwrap().len(), 0);

    let foreign = app
        .clone()
        .oneshot(authed_request(
            "GET",
            &format!("/documents/{}", document_id),
            &bob,
        ))
        .await
        .unwrap();
    let missing = app
        .clone()
        .oneshot(authed_request("GET", "/documents/999999", &bob))
        .await
        .unwrap();
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(foreign).await, body_json(missing).await);
}

#[tokio::test]
async fn document_detail_and_review_views() {
    let (app, _state, _dir) = test_app().await;
    let (_, token) = register_user(&app, "alice@example.com", "password123").await;

    let response = app
        .clone()
        .oneshot(upload_request(&token, "thesis.pdf", b"contents"))
        .await
        .unwrap();
    let document_id = body_json(response).await["document_id"].as_i64().unwrap();

    let detail = app
        .clone()
        .oneshot(authed_request(
            "GET",
            &format!("/documents/{}", document_id),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(detail.status(), StatusCode::OK);
    let body = body_json(detail).await;
    assert_eq!(body["original_filename"], "thesis.pdf");
    assert_eq!(body["status"], "uploaded");
    assert!(body["review_notes"].is_null());
    assert!(body["stored_path"].as_str().is_some());

    let review = app
        .clone()
        .oneshot(authed_request(
            "GET",
            &format!("/documents/{}/review", document_id),
            &token,
        ))
        .await
        .unwrap();
    assert_eq!(review.status(), StatusCode::OK);
    let body = body_json(review).await;
    assert_eq!(body["status"], "uploaded");
    assert!(body["review_notes"].is_null());
}

#[tokio::test]
async fn orphan_sweep_removes_unreferenced_files_only() {
    let (app, state, _dir) = test_app().await;
    let (_, token) = register_user(&app, "alice@example.com", "password123").await;

    let response = app
        .clone()
        .oneshot(upload_request(&token, "keep.txt", b"keep me"))
        .await
        .unwrap();
    let kept = body_json(response).await["stored_filename"]
        .as_str()
        .unwrap()
        .to_string();

    // A file that never made it into the table, as after a crash between
    // write and record.
    let stray = format!("{}/deadbeef.tmp", state.config.upload.storage_dir);
    tokio::fs::write(&stray, b"leftover").await.unwrap();

    let removed = state.documents.sweep_orphan_files().await.unwrap();
    assert_eq!(removed, 1);
    assert!(tokio::fs::metadata(&stray).await.is_err());

    let kept_path = format!("{}/{}", state.config.upload.storage_dir, kept);
    assert!(tokio::fs::metadata(&kept_path).await.is_ok());
}

#[tokio::test]
async fn orphan_sweep_tolerates_missing_storage_dir() {
    let (_app, state, _dir) = test_app().await;
    // Nothing uploaded yet, so the storage dir does not even exist.
    assert_eq!(state.documents.sweep_orphan_files().await.unwrap(), 0);
}
