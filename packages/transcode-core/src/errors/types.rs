use std::time::Duration;

use thiserror::Error;

/// ゲートウェイ境界で扱うリクエスト単位の統合エラー型
///
/// どのバリアントも最終的には失敗レスポンスに変換され、呼び出し元へ漏れることはない。
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    InvalidParams(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("image request timed out after {0:?}")]
    Timeout(Duration),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// クライアント起因のエラーかどうか（ログレベルの判定に使う）
    pub fn is_client_fault(&self) -> bool {
        match self {
            GatewayError::InvalidParams(_) => true,
            GatewayError::Source(SourceError::NotFound { .. }) => true,
            GatewayError::Transform(TransformError::UnsupportedSource(_)) => true,
            _ => false,
        }
    }
}

/// デプロイ時のドメイン検証エラー（プロビジョニングを中断する）
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid domain name: {0:?}")]
    Invalid(String),
}

/// ソース画像の取得エラー
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not fetch image {key} from bucket")]
    NotFound { key: String },

    #[error("could not fetch image from {url} (status {status})")]
    UpstreamStatus { url: String, status: u16 },

    #[error("could not fetch image from {url}: {reason}")]
    Upstream { url: String, reason: String },

    #[error("storage error for {key}: {reason}")]
    Storage { key: String, reason: String },

    #[error("source image too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },
}

/// 画像変換エラー
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("the requested resource isn't a valid image: {0}")]
    UnsupportedSource(String),

    #[error("image resolution exceeds maximum ({width}x{height})")]
    ResolutionTooLarge { width: u32, height: u32 },

    #[error("processing failed: {0}")]
    ProcessingFailed(String),
}
