//! API integration tests for vistazo-server.
//!
//! These tests drive the router in-process with `oneshot`, using synthetic
//! catalog images indexed in memory.

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use image::{DynamicImage, RgbImage};
use serde_json::{json, Value};
use tower::ServiceExt;
use vistazo_core::embedding::{MockVectorSearch, Neighbor, NeighborMetadata, NeighborQueryConfig};
use vistazo_core::{
    Catalog, Index, Product, ScoringConfig, SearchEngine, SignatureExtractor,
};
use vistazo_server::{create_router, AppState, Config};

const BOUNDARY: &str = "----TestBoundary7MA4YWxkTrZu0gW";

/// A garment-colored block on a white background with a variant-specific
/// stripe pattern.
fn product_png(garment: [u8; 3], variant: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(96, 96, |x, y| {
        if !((16..80).contains(&x) && (12..84).contains(&y)) {
            return image::Rgb([255, 255, 255]);
        }
        let stripe = ((x / 6 + y / (6 + variant)) % 2) as u8 * 30;
        image::Rgb([
            garment[0].saturating_sub(stripe),
            garment[1].saturating_sub(stripe),
            garment[2].saturating_sub(stripe),
        ])
    });
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}

fn red_front() -> Vec<u8> {
    product_png([200, 30, 40], 0)
}

fn test_engine() -> SearchEngine {
    let extractor = SignatureExtractor::default();
    let entries = vec![
        extractor
            .signature_from_bytes("red hoodie/front.png", &red_front())
            .unwrap()
            .with_product_id(Some("p1".into())),
        extractor
            .signature_from_bytes("red hoodie/back.png", &product_png([200, 30, 40], 1))
            .unwrap()
            .with_product_id(Some("p1".into())),
        extractor
            .signature_from_bytes("blue cap/front.png", &product_png([30, 60, 200], 3))
            .unwrap()
            .with_product_id(Some("p2".into())),
    ];
    SearchEngine::new(
        Arc::new(Index::from_signatures(entries)),
        ScoringConfig::default(),
        extractor,
    )
}

fn catalog() -> Catalog {
    Catalog::from_products(vec![
        Product {
            id: "p1".into(),
            name: "Red Hoodie".into(),
        },
        Product {
            id: "p2".into(),
            name: "Blue Cap".into(),
        },
    ])
}

fn small_vectors() -> NeighborQueryConfig {
    NeighborQueryConfig {
        expected_dimensions: 4,
        ..NeighborQueryConfig::default()
    }
}

fn app_with_index() -> Router {
    let state = AppState::new(Some(test_engine()), &Config::default()).with_catalog(catalog());
    create_router(state)
}

fn app_without_index() -> Router {
    create_router(AppState::new(None, &Config::default()))
}

fn multipart_body(file: Option<(&[u8], &str)>, fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();

    if let Some((content, content_type)) = file {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"file\"; filename=\"query.png\"\r\n",
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }

    for (name, value) in fields {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/search")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ============================================================================
// Health & Readiness Tests
// ============================================================================

#[tokio::test]
async fn test_health_reports_loaded_index() {
    let (status, json) = send(app_with_index(), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "vistazo-server");
    assert_eq!(json["index_entries"], 3);
    assert_eq!(json["vector_search"], false);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_health_is_degraded_without_index() {
    let (status, json) = send(app_without_index(), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["index_loaded"], false);
}

#[tokio::test]
async fn test_ready_endpoint() {
    let (status, json) = send(app_with_index(), get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], true);

    let (status, json) = send(app_without_index(), get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["ready"], false);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (status, json) = send(app_with_index(), get("/api-docs/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/search"].is_object());
    assert!(json["paths"]["/vector-search"].is_object());
}

// ============================================================================
// Multipart Search Tests
// ============================================================================

#[tokio::test]
async fn test_search_exact_match_ranks_first() {
    let body = multipart_body(Some((&red_front(), "image/png")), &[]);
    let (status, json) = send(app_with_index(), multipart_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["preset"], "strict");
    assert_eq!(json["threshold"], 24);

    let results = json["results"].as_array().unwrap();
    assert_eq!(json["count"], results.len());
    assert_eq!(results[0]["filename"], "red hoodie/front.png");
    assert_eq!(results[0]["distance"], 0);
    assert_eq!(results[0]["productId"], "p1");
    assert_eq!(results[0]["productName"], "Red Hoodie");

    // One hit per product
    let red = results.iter().filter(|r| r["productId"] == "p1").count();
    assert_eq!(red, 1);

    assert_eq!(json["query"]["phash"].as_str().unwrap().len(), 16);
    assert_eq!(json["query"]["ahash"].as_str().unwrap().len(), 16);
    assert_eq!(json["query"]["color"].as_str().unwrap().len(), 6);
}

#[tokio::test]
async fn test_search_respects_limit_and_preset() {
    let body = multipart_body(
        Some((&red_front(), "image/png")),
        &[("limit", "1"), ("preset", "permissive")],
    );
    let (status, json) = send(app_with_index(), multipart_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["preset"], "permissive");
    assert_eq!(json["count"], 1);
}

#[tokio::test]
async fn test_search_threshold_zero_keeps_only_exact_match() {
    let body = multipart_body(Some((&red_front(), "image/png")), &[("threshold", "0")]);
    let (status, json) = send(app_with_index(), multipart_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["threshold"], 0);
    let results = json["results"].as_array().unwrap();
    assert!(results.iter().all(|r| r["distance"] == 0));
}

#[tokio::test]
async fn test_search_without_file_returns_400() {
    let body = multipart_body(None, &[("limit", "5")]);
    let (status, json) = send(app_with_index(), multipart_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_search_rejects_non_image_upload() {
    let body = multipart_body(Some((b"<html></html>", "text/html")), &[]);
    let (status, _) = send(app_with_index(), multipart_request(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let body = multipart_body(Some((b"not an image", "application/octet-stream")), &[]);
    let (status, _) = send(app_with_index(), multipart_request(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_rejects_upload_over_size_limit() {
    let mut state = AppState::new(Some(test_engine()), &Config::default());
    state.max_file_size = 64;
    let image = red_front();
    assert!(image.len() > 64);

    let body = multipart_body(Some((&image, "image/png")), &[]);
    let (status, json) = send(create_router(state), multipart_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("too large"));
}

#[tokio::test]
async fn test_search_rejects_empty_upload() {
    let body = multipart_body(Some((b"", "image/png")), &[]);
    let (status, json) = send(app_with_index(), multipart_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Empty"));
}

#[tokio::test]
async fn test_search_rejects_unknown_preset() {
    let body = multipart_body(Some((&red_front(), "image/png")), &[("preset", "loose")]);
    let (status, json) = send(app_with_index(), multipart_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("preset"));
}

#[tokio::test]
async fn test_search_without_index_returns_503() {
    let body = multipart_body(Some((&red_front(), "image/png")), &[]);
    let (status, json) = send(app_without_index(), multipart_request(body)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "INDEX_MISSING");
    assert!(json["error"].as_str().unwrap().contains("rebuild the index"));
}

// ============================================================================
// JSON Search Tests
// ============================================================================

#[tokio::test]
async fn test_search_json_with_data_uri() {
    let uri = format!("data:image/png;base64,{}", BASE64.encode(red_front()));
    let request = json_request("/search/json", json!({ "image": uri, "limit": 5 }));
    let (status, json) = send(app_with_index(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"][0]["filename"], "red hoodie/front.png");
    assert_eq!(json["results"][0]["distance"], 0);
}

#[tokio::test]
async fn test_search_json_with_bare_base64() {
    let request = json_request(
        "/search/json",
        json!({ "image": BASE64.encode(red_front()) }),
    );
    let (status, json) = send(app_with_index(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"][0]["productId"], "p1");
}

#[tokio::test]
async fn test_search_json_invalid_base64_returns_400() {
    let request = json_request(
        "/search/json",
        json!({ "image": "data:image/png;base64,!!!not-base64!!!" }),
    );
    let (status, json) = send(app_with_index(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_IMAGE");
}

// ============================================================================
// Vector Search Tests
// ============================================================================

fn neighbors() -> Vec<Neighbor> {
    vec![
        Neighbor {
            id: "dp-far".into(),
            distance: Some(3.0),
            score: None,
            metadata: NeighborMetadata {
                color: Some("red".into()),
                ..NeighborMetadata::default()
            },
        },
        Neighbor {
            id: "dp-near".into(),
            distance: Some(0.25),
            score: None,
            metadata: NeighborMetadata {
                gcs_uri: Some("gs://catalog-images/hoodies/front.jpg".into()),
                product_id: Some("p1".into()),
                color: Some("Red".into()),
                ..NeighborMetadata::default()
            },
        },
    ]
}

fn vector_app(provider: MockVectorSearch, with_index: bool) -> Router {
    let engine = with_index.then(test_engine);
    let state = AppState::new(engine, &Config::default())
        .with_neighbor_config(small_vectors())
        .with_vector_search(Arc::new(provider));
    create_router(state)
}

#[tokio::test]
async fn test_vector_search_ranks_neighbors() {
    let request = json_request(
        "/vector-search",
        json!({ "feature_vector": [0.1, 0.2, 0.3, 0.4], "color": "red" }),
    );
    let (status, json) = send(vector_app(MockVectorSearch::new(neighbors()), true), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "vector");
    assert!(json["requestId"].as_str().unwrap().len() >= 32);
    assert!(json["timestamp"].is_string());
    assert_eq!(json["resultsBeforeFilter"], 2);
    assert_eq!(json["resultsAfterFilter"], 2);

    let results = json["results"].as_array().unwrap();
    assert_eq!(results[0]["id"], "dp-near");
    assert_eq!(results[0]["similarity"], 0.8);
    assert_eq!(
        results[0]["imageUrl"],
        "https://storage.googleapis.com/catalog-images/hoodies/front.jpg"
    );
    assert_eq!(results[1]["id"], "dp-far");
}

#[tokio::test]
async fn test_vector_search_accepts_prediction_payload() {
    let request = json_request(
        "/vector-search",
        json!({
            "feature_vector": {"predictions": [{"imageEmbedding": [1.0, 0.0, 0.0, 0.0]}]},
            "neighbor_count": 1
        }),
    );
    let (status, json) = send(vector_app(MockVectorSearch::new(neighbors()), true), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["resultsBeforeFilter"], 1);
}

#[tokio::test]
async fn test_vector_search_wrong_dimension_returns_400() {
    let request = json_request("/vector-search", json!({ "feature_vector": [0.1, 0.2] }));
    let (status, json) = send(vector_app(MockVectorSearch::new(neighbors()), true), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_DIMENSIONS");
}

#[tokio::test]
async fn test_vector_search_unknown_shape_returns_400() {
    let request = json_request(
        "/vector-search",
        json!({ "feature_vector": {"values": [0.1, 0.2, 0.3, 0.4]} }),
    );
    let (status, json) = send(vector_app(MockVectorSearch::new(neighbors()), true), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_EMBEDDING");
}

#[tokio::test]
async fn test_vector_search_falls_back_to_local_index() {
    let uri = format!("data:image/png;base64,{}", BASE64.encode(red_front()));
    let request = json_request(
        "/vector-search",
        json!({ "feature_vector": [0.1, 0.2, 0.3, 0.4], "image": uri }),
    );
    let (status, json) = send(
        vector_app(MockVectorSearch::failing("index offline"), true),
        request,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["source"], "local");
    assert!(json["fallbackReason"]
        .as_str()
        .unwrap()
        .contains("index offline"));
    assert_eq!(json["results"][0]["filename"], "red hoodie/front.png");
    assert_eq!(json["results"][0]["productName"], "Red Hoodie");
}

#[tokio::test]
async fn test_vector_search_failure_without_image_returns_503() {
    let request = json_request(
        "/vector-search",
        json!({ "feature_vector": [0.1, 0.2, 0.3, 0.4] }),
    );
    let (status, json) = send(
        vector_app(MockVectorSearch::failing("index offline"), true),
        request,
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "VECTOR_SEARCH_UNAVAILABLE");
}

#[tokio::test]
async fn test_vector_search_without_provider_or_index_returns_503() {
    let uri = format!("data:image/png;base64,{}", BASE64.encode(red_front()));
    let state = AppState::new(None, &Config::default()).with_neighbor_config(small_vectors());
    let request = json_request(
        "/vector-search",
        json!({ "feature_vector": [0.1, 0.2, 0.3, 0.4], "image": uri }),
    );
    let (status, _) = send(create_router(state), request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
