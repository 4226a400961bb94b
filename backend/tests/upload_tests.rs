mod common;

use common::*;

use backend_storage::share_record::ShareRecordStore;
use http::StatusCode;
use peekonce_backend::share::MAX_UPLOAD_BYTES;
use pretty_assertions::assert_eq;

// Happy path tests

#[tokio::test]
async fn test_upload_image_happy_path() {
    let setup = TestSetup::new();
    let data = generate_test_image(1024);

    let response = setup
        .send_upload_request("cat.png", "image/png", &data)
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let body = parse_response_body(response).await;
    let token = body["token"].as_str().unwrap();
    let share_url = body["share_url"].as_str().unwrap();
    assert_eq!(share_url, format!("{TEST_LINK_ORIGIN}/view/{token}"));

    let record = setup
        .records
        .find_by_token(token)
        .await
        .unwrap()
        .expect("share record should exist");
    assert!(!record.viewed);

    let (stored, content_type) = setup
        .objects
        .get_by_address(&record.object_address)
        .expect("object should be stored");
    assert_eq!(stored.as_ref(), data.as_slice());
    assert_eq!(content_type, "image/png");
}

#[tokio::test]
async fn test_upload_exactly_max_size_is_accepted() {
    let setup = TestSetup::new();
    let data = generate_test_image(MAX_UPLOAD_BYTES);

    let response = setup
        .send_upload_request("big.jpg", "image/jpeg", &data)
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(setup.objects.len(), 1);
}

// Validation error tests

#[tokio::test]
async fn test_upload_one_byte_over_limit_is_rejected_before_store() {
    let setup = TestSetup::new();
    let data = generate_test_image(MAX_UPLOAD_BYTES + 1);

    let response = setup
        .send_upload_request("big.jpg", "image/jpeg", &data)
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let body = parse_response_body(response).await;
    assert_eq!(body["error"]["code"], "file_too_large");
    assert_eq!(body["allowRetry"], false);
    assert_eq!(setup.objects.put_calls(), 0);
    assert_eq!(setup.records.calls(), 0);
}

#[tokio::test]
async fn test_upload_far_over_body_limit_is_rejected() {
    let setup = TestSetup::new();
    let data = generate_test_image(MAX_UPLOAD_BYTES + 1024 * 1024);

    let response = setup
        .send_upload_request("huge.jpg", "image/jpeg", &data)
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(setup.objects.put_calls(), 0);
}

#[tokio::test]
async fn test_upload_non_image_is_rejected() {
    let setup = TestSetup::new();

    let response = setup
        .send_upload_request("notes.txt", "text/plain", b"hello")
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"]["code"], "not_an_image");
    assert!(setup.objects.is_empty());
}

#[tokio::test]
async fn test_upload_empty_file_is_rejected() {
    let setup = TestSetup::new();

    let response = setup
        .send_upload_request("empty.png", "image/png", b"")
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"]["code"], "invalid_file");
}

#[tokio::test]
async fn test_upload_without_file_field_is_rejected() {
    let setup = TestSetup::new();
    let (boundary, body) = multipart_body("other", "cat.png", "image/png", b"pixels");

    let request = axum::http::Request::builder()
        .uri("/v1/images")
        .method("POST")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(axum::body::Body::from(body))
        .unwrap();
    let response = tower::ServiceExt::oneshot(setup.router.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(setup.objects.is_empty());
}

// Store failure tests

#[tokio::test]
async fn test_upload_object_store_failure_produces_no_link() {
    let setup = TestSetup::new();
    setup.objects.fail_puts(true);

    let response = setup
        .send_upload_request("cat.png", "image/png", b"pixels")
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = parse_response_body(response).await;
    assert!(body.get("token").is_none());
    assert_eq!(body["allowRetry"], true);
    assert!(setup.records.is_empty());
}

#[tokio::test]
async fn test_upload_record_store_failure_produces_no_link() {
    let setup = TestSetup::new();
    setup.records.fail_inserts(true);

    let response = setup
        .send_upload_request("cat.png", "image/png", b"pixels")
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"]["code"], "store_error");
    assert!(body.get("share_url").is_none());
    assert!(setup.records.is_empty());
}

// Service endpoints

#[tokio::test]
async fn test_health() {
    let setup = TestSetup::new();

    let response = setup.send_get_request("/health").await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_openapi_schema_lists_share_routes() {
    let setup = TestSetup::new();

    let response = setup.send_get_request("/openapi.json").await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert!(body["paths"]["/v1/images"].is_object());
    assert!(body["paths"]["/v1/shares/{token}/redeem"].is_object());
}
