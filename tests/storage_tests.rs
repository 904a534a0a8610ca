mod common;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use common::{MockRepo, create_test_state, guard_user};
use community_portal::{
    config::AppConfig,
    handlers,
    models::PresignedUrlRequest,
    storage::{MockStorageService, S3StorageClient, StorageService},
};
use std::sync::Arc;

// --- Mock storage behavior ---

#[tokio::test]
async fn test_mock_success() {
    let mock = MockStorageService::new();
    let result = mock
        .get_presigned_upload_url("guest-id.jpg", "image/jpeg")
        .await;
    assert!(result.is_ok());

    let url = result.unwrap();
    assert!(url.contains("signature=fake"));
    assert!(url.contains("guest-id.jpg"));
}

#[tokio::test]
async fn test_mock_failure() {
    let mock = MockStorageService::new_failing();
    let result = mock
        .get_presigned_upload_url("guest-id.jpg", "image/jpeg")
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_mock_sanitization() {
    let mock = MockStorageService::new();
    let result = mock
        .get_presigned_upload_url("../../etc/passwd", "text/plain")
        .await;
    assert!(result.is_ok());

    // The traversal components must not survive into the signed URL.
    let url = result.unwrap();
    assert!(!url.contains(".."));
}

#[tokio::test]
async fn test_s3_client_creation() {
    // Just testing that construction from config doesn't panic.
    let _client = S3StorageClient::from_config(&AppConfig::default()).await;
}

// --- Presigned-URL handler ---

#[tokio::test]
async fn test_presigned_handler_generates_a_unique_key() {
    let state = create_test_state(Arc::new(MockRepo::default()), MockStorageService::new());

    let response = handlers::get_presigned_url(
        guard_user(),
        State(state),
        Json(PresignedUrlRequest {
            filename: "ktp photo.jpg".to_string(),
            file_type: "image/jpeg".to_string(),
        }),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let payload: community_portal::models::PresignedUrlResponse =
        serde_json::from_slice(&bytes).unwrap();

    // Key shape: uploads/<uuid>.<original extension>.
    assert!(payload.resource_key.starts_with("uploads/"));
    assert!(payload.resource_key.ends_with(".jpg"));
    assert!(payload.upload_url.contains(&payload.resource_key));
}

#[tokio::test]
async fn test_presigned_handler_surfaces_storage_failure_as_500() {
    let state = create_test_state(Arc::new(MockRepo::default()), MockStorageService::new_failing());

    let response = handlers::get_presigned_url(
        guard_user(),
        State(state),
        Json(PresignedUrlRequest {
            filename: "ktp.jpg".to_string(),
            file_type: "image/jpeg".to_string(),
        }),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
