mod common;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::{json, Value};
use warp::http::StatusCode;

use art_screener::config::Environment;
use art_screener::routes::configure_routes;
use art_screener::state::AppState;

use common::{DocBuilder, FakeChat, FakeDocs, FakeDrive, FakePosts, FakeProbe, FakeVision};

const BOUNDARY: &str = "screener-test-boundary";
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-data";

fn similar_urls() -> Vec<String> {
    (1..=7).map(|i| format!("https://img.example.com/{}.jpg", i)).collect()
}

fn default_state() -> (AppState, Arc<FakeChat>) {
    let urls = similar_urls();
    let refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let chat = FakeChat::classifying_as("Antique");
    let state = common::test_state(Environment::Production, FakeVision::with_similar(&refs), chat.clone(), None);
    (state, chat)
}

fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            field, filename, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn json_of(body: &Bytes) -> Value {
    serde_json::from_slice(body).expect("response body is JSON")
}

async fn post_json(state: &AppState, path: &str, body: Value) -> (StatusCode, Value) {
    let routes = configure_routes(state.clone());
    let response = warp::test::request()
        .method("POST")
        .path(path)
        .json(&body)
        .reply(&routes)
        .await;
    (response.status(), json_of(response.body()))
}

async fn upload(state: &AppState, field: &str, content_type: &str) -> (StatusCode, Value) {
    let routes = configure_routes(state.clone());
    let response = warp::test::request()
        .method("POST")
        .path("/upload-image")
        .header("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
        .body(multipart_body(field, "vase.png", content_type, PNG_BYTES))
        .reply(&routes)
        .await;
    (response.status(), json_of(response.body()))
}

#[tokio::test]
async fn test_health_check() {
    let (state, _) = default_state();
    let routes = configure_routes(state);

    let response = warp::test::request().method("GET").path("/").reply(&routes).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_of(response.body());
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "art_screener");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (state, _) = default_state();
    let routes = configure_routes(state);

    let response = warp::test::request().method("GET").path("/nope").reply(&routes).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_of(response.body());
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let (state, _) = default_state();
    let routes = configure_routes(state);

    let response = warp::test::request()
        .method("POST")
        .path("/classify-item")
        .header("content-type", "application/json")
        .body("{not json")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_of(response.body())["success"], false);
}

#[tokio::test]
async fn test_upload_without_image_field() {
    let (state, _) = default_state();

    let (status, body) = upload(&state, "document", "image/png").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No image file uploaded");
    assert_eq!(state.sessions.len().await, 0);
}

#[tokio::test]
async fn test_upload_rejects_non_image() {
    let (state, _) = default_state();

    let (status, body) = upload(&state, "image", "application/pdf").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_upload_creates_session_and_serves_image() {
    let (state, chat) = default_state();

    let (status, body) = upload(&state, "image", "image/png").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["itemType"], "Antique");
    let session_id = body["sessionId"].as_str().expect("sessionId").to_string();
    assert_eq!(
        body["customerImageUrl"],
        format!("{}/image/{}", common::BASE_URL, session_id)
    );
    assert_eq!(body["similarImageUrls"].as_array().map(Vec::len), Some(7));

    let session = state.sessions.get(&session_id).await.expect("session stored");
    assert_eq!(session.similar_image_urls, similar_urls());
    // classification saw only the customer image
    assert_eq!(chat.image_counts(), vec![1]);

    let routes = configure_routes(state.clone());
    let response = warp::test::request()
        .method("GET")
        .path(&format!("/image/{}", session_id))
        .reply(&routes)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(response.body().as_ref(), PNG_BYTES);
}

#[tokio::test]
async fn test_upload_falls_back_to_art_on_bad_classification() {
    let chat = FakeChat::classifying_as("Probably a teapot");
    let state = common::test_state(Environment::Production, FakeVision::with_similar(&[]), chat, None);

    let (status, body) = upload(&state, "image", "image/png").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["itemType"], "Art");
}

#[tokio::test]
async fn test_upload_fails_when_vision_fails() {
    let vision = Arc::new(FakeVision {
        similar: Vec::new(),
        fail: true,
        calls: Default::default(),
    });
    let (state, images) = common::state_with_images(
        common::test_config(Environment::Production),
        vision,
        FakeChat::classifying_as("Art"),
        None,
    );

    let (status, body) = upload(&state, "image", "image/png").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error processing image");
    assert!(body.get("error").is_none());
    assert_eq!(state.sessions.len().await, 0);
    // the stored upload is removed with the failed session
    assert!(images.is_empty().await);
}

async fn get_image_status(state: &AppState, session_id: &str) -> StatusCode {
    let routes = configure_routes(state.clone());
    warp::test::request()
        .method("GET")
        .path(&format!("/image/{}", session_id))
        .reply(&routes)
        .await
        .status()
}

#[tokio::test]
async fn test_expired_session_image_is_gone() {
    let mut config = common::test_config(Environment::Production);
    config.session_ttl = Duration::from_millis(50);
    let (state, images) = common::state_with_images(
        config,
        FakeVision::with_similar(&[]),
        FakeChat::classifying_as("Art"),
        None,
    );

    let (status, body) = upload(&state, "image", "image/png").await;
    assert_eq!(status, StatusCode::OK);
    let session_id = body["sessionId"].as_str().expect("sessionId").to_string();
    assert_eq!(get_image_status(&state, &session_id).await, StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(100)).await;

    // expired but not yet swept
    assert_eq!(get_image_status(&state, &session_id).await, StatusCode::NOT_FOUND);

    assert_eq!(state.purge_expired_sessions().await, 1);
    assert_eq!(state.sessions.len().await, 0);
    assert!(images.is_empty().await);
    assert_eq!(get_image_status(&state, &session_id).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sweeper_removes_expired_images() {
    let mut config = common::test_config(Environment::Production);
    config.session_ttl = Duration::from_millis(20);
    let (state, images) = common::state_with_images(
        config,
        FakeVision::with_similar(&[]),
        FakeChat::classifying_as("Art"),
        None,
    );
    let (status, _) = upload(&state, "image", "image/png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(images.len().await, 1);

    let sweeper = state.spawn_session_sweeper(Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(150)).await;
    sweeper.abort();

    assert_eq!(state.sessions.len().await, 0);
    assert!(images.is_empty().await);
}

#[tokio::test]
async fn test_get_image_unknown_session() {
    let (state, _) = default_state();
    let routes = configure_routes(state);

    let response = warp::test::request()
        .method("GET")
        .path("/image/does-not-exist")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_of(response.body())["message"], "Image not found");
}

#[tokio::test]
async fn test_classify_requires_input() {
    let (state, _) = default_state();

    let (status, body) = post_json(&state, "/classify-item", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "imageUrl or sessionId is required");
}

#[tokio::test]
async fn test_classify_unknown_session() {
    let (state, _) = default_state();

    let (status, body) = post_json(&state, "/classify-item", json!({"sessionId": "missing"})).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Session not found");
}

#[tokio::test]
async fn test_classify_by_url() {
    let (state, _) = default_state();

    let (status, body) = post_json(
        &state,
        "/classify-item",
        json!({"imageUrl": "https://img.example.com/chair.jpg"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "classification": "Antique"}));
}

#[tokio::test]
async fn test_classify_by_session_updates_item_type() {
    let vision = FakeVision::with_similar(&[]);
    let state = common::test_state(Environment::Production, vision, FakeChat::classifying_as("Art"), None);
    let (_, body) = upload(&state, "image", "image/png").await;
    let session_id = body["sessionId"].as_str().expect("sessionId").to_string();
    state
        .sessions
        .update(&session_id, |s| s.item_type = art_screener::models::ItemType::Antique)
        .await;

    let (status, body) = post_json(&state, "/classify-item", json!({"sessionId": session_id})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["classification"], "Art");
    let session = state.sessions.get(&session_id).await.expect("session");
    assert_eq!(session.item_type, art_screener::models::ItemType::Art);
}

#[tokio::test]
async fn test_invalid_classification_hides_details_in_production() {
    let chat = FakeChat::classifying_as("I cannot tell");
    let state = common::test_state(Environment::Production, FakeVision::with_similar(&[]), chat, None);

    let (status, body) = post_json(&state, "/classify-item", json!({"imageUrl": "https://x.test/a.jpg"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error classifying item");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_invalid_classification_shows_details_in_development() {
    let chat = FakeChat::classifying_as("I cannot tell");
    let state = common::test_state(Environment::Development, FakeVision::with_similar(&[]), chat, None);

    let (status, body) = post_json(&state, "/classify-item", json!({"imageUrl": "https://x.test/a.jpg"})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error classifying item");
    let detail = body["error"].as_str().expect("error detail");
    assert!(detail.contains("Invalid classification response"));
}

#[tokio::test]
async fn test_generate_analysis_validation() {
    let (state, _) = default_state();

    let (status, body) = post_json(&state, "/generate-analysis", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "sessionId is required");

    let (status, body) = post_json(&state, "/generate-analysis", json!({"sessionId": "gone"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Session not found");
}

#[tokio::test]
async fn test_generate_analysis_caps_reference_images() {
    let (state, chat) = default_state();
    let (_, body) = upload(&state, "image", "image/png").await;
    let session_id = body["sessionId"].as_str().expect("sessionId").to_string();

    let (status, body) = post_json(&state, "/generate-analysis", json!({"sessionId": session_id})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"], "A 19th century oil portrait.");
    // customer image plus at most five of the seven similar images
    assert_eq!(chat.image_counts(), vec![1, 6]);

    let session = state.sessions.get(&session_id).await.expect("session");
    assert_eq!(session.analysis.as_deref(), Some("A 19th century oil portrait."));
}

#[tokio::test]
async fn test_enhance_analysis_validation() {
    let (state, _) = default_state();

    let (status, body) = post_json(&state, "/enhance-analysis", json!({"sessionId": "abc"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "sessionId and analysisText are required");

    let (status, body) = post_json(
        &state,
        "/enhance-analysis",
        json!({"sessionId": "abc", "analysisText": "A portrait"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Session not found");
}

#[tokio::test]
async fn test_enhance_analysis_stores_results() {
    let (state, _) = default_state();
    let (_, body) = upload(&state, "image", "image/png").await;
    let session_id = body["sessionId"].as_str().expect("sessionId").to_string();

    let (status, body) = post_json(
        &state,
        "/enhance-analysis",
        json!({"sessionId": session_id, "analysisText": "A 19th century oil portrait."}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "enhancedAnalysis": "Enhanced: a 19th century oil portrait.",
            "offerText": "Order a full appraisal today."
        })
    );
    let session = state.sessions.get(&session_id).await.expect("session");
    assert_eq!(session.offer_text.as_deref(), Some("Order a full appraisal today."));
}

#[tokio::test]
async fn test_generate_pdf_requires_post_id() {
    let (state, _) = default_state();

    let (status, body) = post_json(&state, "/generate-pdf", json!({"session_ID": "abc"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "postId is required");
}

#[tokio::test]
async fn test_generate_pdf_not_configured() {
    let (state, _) = default_state();

    let (status, body) = post_json(&state, "/generate-pdf", json!({"postId": 12})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error generating PDF");
}

#[tokio::test]
async fn test_generate_pdf_returns_links() {
    let posts = FakePosts::new(
        json!({
            "title": {"rendered": "Oil &amp; Canvas"},
            "date": "2024-01-15T10:00:00",
            "acf": {"value": "1500"}
        }),
        &[],
    );
    let docs = FakeDocs::new(DocBuilder::new().paragraph("{{appraisal_title}}\n").build());
    let drive = Arc::new(FakeDrive::default());
    let reports = common::report_generator(posts.clone(), docs, drive, FakeProbe::allowing(&[]));
    let state = common::test_state(
        Environment::Production,
        FakeVision::with_similar(&[]),
        FakeChat::classifying_as("Art"),
        Some(Arc::new(reports)),
    );

    let (status, body) = post_json(&state, "/generate-pdf", json!({"postId": "77", "session_ID": "sess-1"})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "PDF generated successfully");
    assert_eq!(body["pdfLink"], "https://drive.google.com/file/d/pdf-1/view");
    assert_eq!(body["docLink"], "https://docs.google.com/document/d/doc-copy/edit");
    assert_eq!(posts.updates.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_generate_pdf_unknown_post_is_server_error() {
    let posts = FakePosts::new(json!({"title": {"rendered": "x"}, "acf": {}}), &[]);
    let docs = FakeDocs::new(DocBuilder::new().paragraph("{{appraisal_title}}\n").build());
    let reports = common::report_generator(posts, docs, Arc::new(FakeDrive::default()), FakeProbe::allowing(&[]));
    let state = common::test_state(
        Environment::Development,
        FakeVision::with_similar(&[]),
        FakeChat::classifying_as("Art"),
        Some(Arc::new(reports)),
    );

    let (status, body) = post_json(&state, "/generate-pdf", json!({"postId": 404})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Error generating PDF");
    assert!(body["error"].as_str().unwrap_or_default().contains("Post 404 not found"));
}
