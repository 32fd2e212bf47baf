use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use tower::ServiceExt;
use transcode_core::{
    HttpFetcher, HttpResponse, ImageGateway, ImagePolicy, ObjectStore, OriginResolver,
    OutputFormat, RoutingPolicy, SourceError, StoredObject, TranscodeInput, TranscodeResult,
    TransformEngine, TransformError,
};
use transcode_gateway::{build_router, AppState};
use url::Url;

struct MemoryStore {
    objects: HashMap<String, StoredObject>,
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_object(&self, key: &str) -> Result<Option<StoredObject>, SourceError> {
        Ok(self.objects.get(key).cloned())
    }
}

/// 呼ばれたら失敗する（ストレージキーだけを扱うテスト用）
struct NoNetwork;

#[async_trait]
impl HttpFetcher for NoNetwork {
    async fn get(&self, url: &Url) -> Result<HttpResponse, SourceError> {
        Err(SourceError::Upstream {
            url: url.to_string(),
            reason: "network disabled in tests".to_string(),
        })
    }
}

/// 受け取った出力候補を記録し、入力をそのまま返すエンジン
#[derive(Default)]
struct RecordingEngine {
    seen: Mutex<Vec<Vec<OutputFormat>>>,
}

impl TransformEngine for RecordingEngine {
    fn transcode(&self, input: TranscodeInput) -> Result<TranscodeResult, TransformError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(input.accepted_formats.clone());
        }
        let format = input
            .accepted_formats
            .first()
            .copied()
            .unwrap_or(OutputFormat::Png);
        Ok(TranscodeResult {
            bytes: input.source.bytes,
            content_type: format.content_type().to_string(),
            max_age_seconds: 120,
        })
    }
}

/// 上限時間を超えて処理し続けるエンジン
struct StalledEngine;

impl TransformEngine for StalledEngine {
    fn transcode(&self, input: TranscodeInput) -> Result<TranscodeResult, TransformError> {
        std::thread::sleep(Duration::from_millis(400));
        RecordingEngine::default().transcode(input)
    }
}

const PIXELS: &[u8] = &[0x89, b'P', b'N', b'G', 0, 1, 2, 3, 250, 251];

fn app(engine: Arc<RecordingEngine>) -> Router {
    app_with(engine, None)
}

fn app_with(engine: Arc<dyn TransformEngine>, timeout: Option<Duration>) -> Router {
    let store = MemoryStore {
        objects: HashMap::from([(
            "photos/a.png".to_string(),
            StoredObject {
                body: Some(Bytes::from_static(PIXELS)),
                content_type: Some("image/png".to_string()),
                cache_control: None,
            },
        )]),
    };

    let policy = ImagePolicy {
        sizes: vec![200, 400],
        ..ImagePolicy::default()
    };
    let mut gateway = ImageGateway::new(
        policy,
        OriginResolver::new(Arc::new(store), Arc::new(NoNetwork)),
        engine,
    );
    if let Some(timeout) = timeout {
        gateway = gateway.with_timeout(timeout);
    }
    let state = AppState::new(gateway, &RoutingPolicy::default()).unwrap();

    build_router(state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Bytes) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body)
}

#[tokio::test]
async fn test_health() {
    let (status, _, body) = send(
        app(Arc::default()),
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_transform_returns_raw_bytes() {
    let engine = Arc::new(RecordingEngine::default());
    let request = Request::get("/transform/image?url=%2Fphotos%2Fa.png&w=200&q=75")
        .header(header::ACCEPT, "image/avif,image/webp,*/*")
        .body(Body::empty())
        .unwrap();

    let (status, headers, body) = send(app(engine.clone()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], PIXELS);
    assert_eq!(headers[header::CONTENT_TYPE], "image/webp");
    assert_eq!(headers[header::CACHE_CONTROL], "public,max-age=120,immutable");
    assert_eq!(headers[header::VARY], "Accept");
    assert_eq!(*engine.seen.lock().unwrap(), vec![vec![OutputFormat::WebP]]);
}

#[tokio::test]
async fn test_transform_without_accept_keeps_no_candidates() {
    let engine = Arc::new(RecordingEngine::default());
    let request = Request::get("/transform/image?url=photos/a.png&w=400&q=50")
        .header("x-accept-override", "image/webp")
        .body(Body::empty())
        .unwrap();

    let (status, headers, _) = send(app(engine.clone()), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(*engine.seen.lock().unwrap(), vec![Vec::<OutputFormat>::new()]);
}

#[tokio::test]
async fn test_missing_object_is_cached_failure() {
    let engine = Arc::new(RecordingEngine::default());
    let request = Request::get("/transform/image?url=/photos/missing.png&w=200&q=75")
        .body(Body::empty())
        .unwrap();

    let (status, headers, body) = send(app(engine.clone()), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers[header::CACHE_CONTROL], "public,max-age=3600,immutable");
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert!(String::from_utf8_lossy(&body).contains("photos/missing.png"));
    assert!(engine.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_width_outside_policy_is_rejected() {
    let engine = Arc::new(RecordingEngine::default());
    let request = Request::get("/transform/image?url=/photos/a.png&w=300&q=75")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(app(engine.clone()), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8_lossy(&body).contains("300"));
    assert!(engine.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_remote_url_outside_policy_never_reaches_network() {
    let request = Request::get("/transform/image?url=https%3A%2F%2Fevil.test%2Fa.png&w=200&q=75")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(app(Arc::default()), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!String::from_utf8_lossy(&body).contains("network disabled"));
}

#[tokio::test]
async fn test_slow_transform_keeps_failure_headers() {
    let request = Request::get("/transform/image?url=/photos/a.png&w=200&q=75")
        .body(Body::empty())
        .unwrap();

    let (status, headers, body) = send(
        app_with(Arc::new(StalledEngine), Some(Duration::from_millis(50))),
        request,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers[header::VARY], "Accept");
    assert_eq!(headers[header::CACHE_CONTROL], "public,max-age=3600,immutable");
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert!(String::from_utf8_lossy(&body).contains("timed out"));
}
