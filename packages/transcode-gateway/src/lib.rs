//! オンデマンド画像変換ゲートウェイの HTTP フロント
//!
//! - `GET /transform/image?url=..&w=..&q=..` 画像変換
//! - `GET /health` 死活監視

pub mod config;
pub mod fetch;
pub mod handler;
pub mod plan;
pub mod storage;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use transcode_core::{
    Behavior, ImageGateway, OriginResolver, RasterEngine, RoutingPolicy, IMAGE_PATH,
};

pub use config::GatewayConfig;

use crate::fetch::ReqwestFetcher;
use crate::storage::S3ObjectStore;

#[derive(Clone)]
pub struct AppState {
    pub gateway: ImageGateway,
    /// エッジがこのゲートウェイに適用する振る舞い
    pub behavior: Arc<Behavior>,
}

impl AppState {
    /// ルーティング方針からゲートウェイ向けの振る舞いを取り出して状態を作る
    pub fn new(gateway: ImageGateway, routing: &RoutingPolicy) -> anyhow::Result<Self> {
        let behavior = routing
            .gateway_behavior()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("routing policy has no transcoding gateway behavior"))?;

        Ok(Self {
            gateway,
            behavior: Arc::new(behavior),
        })
    }
}

/// ルーターを構築する
///
/// タイムアウトはゲートウェイ内で失敗レスポンスに変換されるため、ここでは掛けない。
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handler::health))
        .route(IMAGE_PATH, get(handler::transform))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 設定から実クライアント（S3 / reqwest / ラスタエンジン）を組み立てる
pub async fn build_state(config: &GatewayConfig) -> anyhow::Result<AppState> {
    let storage = S3ObjectStore::from_config(&config.storage).await;
    let fetcher = ReqwestFetcher::new(config.server.fetch_timeout())?;
    let engine = RasterEngine::new(config.engine.clone());

    let gateway = ImageGateway::new(
        config.policy.clone(),
        OriginResolver::new(Arc::new(storage), Arc::new(fetcher)),
        Arc::new(engine),
    )
    .with_timeout(config.server.timeout());

    AppState::new(gateway, &RoutingPolicy::default())
}

/// tracing を初期化する（JSON 形式）
pub fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .json()
        .init();
}

/// サーバーを起動し、SIGTERM / Ctrl+C まで待つ
pub async fn start_server(config: GatewayConfig) -> anyhow::Result<()> {
    config.validate()?;

    let state = build_state(&config).await?;
    let app = build_router(state);
    let addr = config.server.socket_addr()?;

    tracing::info!(
        addr = %addr,
        bucket = %config.storage.bucket,
        timeout_secs = config.server.timeout_secs,
        "starting image gateway"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
