//! HTTP request handlers and the router that wires them together.

use std::collections::BTreeMap;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tracing::error;
use utoipa::OpenApi;

use blkstat_core::storage::DeviceSnapshot;

use crate::access_log::AccessLogLayer;
use crate::openapi::ApiDoc;
use crate::state::{AppState, SharedStore};

/// Builds the application router over `store`.
pub(crate) fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(handle_stats))
        .route("/health", get(handle_health))
        .route("/api-docs/openapi.json", get(handle_openapi))
        .with_state(store)
        .layer(AccessLogLayer)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
}

// ============================================================
// Stats
// ============================================================

/// Latest rates for every device that has completed two reads.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Latest snapshot per device, keyed by device name",
            body = BTreeMap<String, DeviceSnapshot>),
        (status = 500, description = "Snapshots could not be serialized")
    )
)]
pub(crate) async fn handle_stats(State(store): AppState) -> Response {
    let snapshots = store.read_all();
    match serde_json::to_vec(&snapshots) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, devices = snapshots.len(), "failed to serialize snapshots");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// ============================================================
// Health
// ============================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = String)
    )
)]
pub(crate) async fn handle_health() -> &'static str {
    "ok"
}

async fn handle_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request};
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    use blkstat_core::registry::DeviceRegistry;
    use blkstat_core::storage::SnapshotStore;

    fn store(devices: &str) -> SharedStore {
        Arc::new(SnapshotStore::new(&DeviceRegistry::parse(devices).unwrap()))
    }

    fn snapshot() -> DeviceSnapshot {
        DeviceSnapshot {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            reads_per_second: 10,
            bytes_read_per_second: 102400,
            read_wait_milliseconds: 5,
            writes_per_second: 4,
            bytes_written_per_second: 40960,
            write_wait_milliseconds: 2,
            in_flight: 5,
            queue_wait_milliseconds: 9,
        }
    }

    async fn get(store: SharedStore, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = router(store)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, body.to_vec())
    }

    #[tokio::test]
    async fn test_empty_store_returns_empty_object() {
        let (status, content_type, body) = get(store("sda,sdb"), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(body, b"{}");
    }

    #[tokio::test]
    async fn test_stats_body_uses_wire_names() {
        let store = store("sda,sdb");
        store.publish("sda", snapshot()).unwrap();

        let (status, _, body) = get(store, "/").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let devices = json.as_object().unwrap();
        assert_eq!(devices.len(), 1);
        assert!(!devices.contains_key("sdb"));

        let sda = &json["sda"];
        assert_eq!(sda["timestamp"], "2024-05-01T12:00:00Z");
        assert_eq!(sda["reads-per-second"], 10);
        assert_eq!(sda["bytes-read-per-second"], 102400);
        assert_eq!(sda["read-wait-milliseconds"], 5);
        assert_eq!(sda["writes-per-second"], 4);
        assert_eq!(sda["bytes-written-per-second"], 40960);
        assert_eq!(sda["write-wait-milliseconds"], 2);
        assert_eq!(sda["in-flight"], 5);
        assert_eq!(sda["queue-wait-milliseconds"], 9);
    }

    #[tokio::test]
    async fn test_cleared_device_disappears() {
        let store = store("sda");
        store.publish("sda", snapshot()).unwrap();
        store.clear("sda").unwrap();

        let (_, _, body) = get(store, "/").await;
        assert_eq!(body, b"{}");
    }

    #[tokio::test]
    async fn test_health() {
        let (status, _, body) = get(store("sda"), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"ok");
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let (status, _, body) = get(store("sda"), "/api-docs/openapi.json").await;
        assert_eq!(status, StatusCode::OK);

        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(doc["paths"].get("/").is_some());
        assert!(doc["paths"].get("/health").is_some());
        assert!(doc["components"]["schemas"].get("DeviceSnapshot").is_some());
    }

    #[tokio::test]
    async fn test_only_get_is_routed() {
        let response = router(store("sda"))
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let (status, _, _) = get(store("sda"), "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
