use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::GatewayError;
use crate::origin::OriginResolver;
use crate::request::ImageRequest;
use crate::response::{compose, GatewayResponse};
use crate::transform::{TranscodeInput, TranscodeResult, TransformEngine};
use crate::validation::{validate_params, ImagePolicy};

/// オンデマンド画像変換ゲートウェイ
///
/// リクエストごとに状態を持たない。キャッシュはエッジ層の責務。
#[derive(Clone)]
pub struct ImageGateway {
    policy: Arc<ImagePolicy>,
    resolver: OriginResolver,
    engine: Arc<dyn TransformEngine>,
    timeout: Option<Duration>,
}

impl ImageGateway {
    pub fn new(policy: ImagePolicy, resolver: OriginResolver, engine: Arc<dyn TransformEngine>) -> Self {
        Self {
            policy: Arc::new(policy),
            resolver,
            engine,
            timeout: None,
        }
    }

    /// 1リクエストの処理時間の上限
    ///
    /// 超過しても失敗レスポンスとして組み立てられる。実行中の変換タスクは中断されない。
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn policy(&self) -> &ImagePolicy {
        &self.policy
    }

    /// パラメータを検証し、ソースを取得して変換する
    ///
    /// 検証はフェッチより前に完了し、失敗した場合はネットワークに一切触れない。
    pub async fn validate_and_transcode(
        &self,
        request: &ImageRequest,
    ) -> Result<TranscodeResult, GatewayError> {
        let params = validate_params(request, &self.policy)?;

        let source = self.resolver.fetch_source(params.source_ref()).await?;

        tracing::info!(
            source = %params.source_ref(),
            w = params.width(),
            q = params.quality(),
            accepted = ?params.accepted_formats(),
            "transforming image"
        );

        let input = TranscodeInput {
            source,
            width: params.width(),
            quality: params.quality(),
            accepted_formats: params.accepted_formats().to_vec(),
        };
        let engine = Arc::clone(&self.engine);

        // 変換は CPU バウンドなのでブロッキングプールで実行する
        let result = tokio::task::spawn_blocking(move || engine.transcode(input))
            .await
            .map_err(|e| GatewayError::Internal(format!("transform task failed: {e}")))??;

        Ok(result)
    }

    /// 1リクエストを処理し、必ずちょうど1つのレスポンスを返す
    pub async fn handle(
        &self,
        query_params: HashMap<String, String>,
        request_headers: HashMap<String, String>,
    ) -> GatewayResponse {
        let outcome = match ImageRequest::new(query_params, request_headers) {
            Ok(request) => match self.timeout {
                Some(limit) => tokio::time::timeout(limit, self.validate_and_transcode(&request))
                    .await
                    .unwrap_or(Err(GatewayError::Timeout(limit))),
                None => self.validate_and_transcode(&request).await,
            },
            Err(err) => Err(err),
        };

        if let Err(err) = &outcome {
            if err.is_client_fault() {
                tracing::warn!(error = %err, "image request rejected");
            } else {
                tracing::error!(error = %err, "image request failed");
            }
        }

        compose(outcome)
    }
}
