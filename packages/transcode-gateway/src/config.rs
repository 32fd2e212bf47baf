use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use transcode_core::{EngineConfig, ImagePolicy};

/// ゲートウェイ設定
///
/// `gateway.toml`（任意）を読み、`IMAGE_GATEWAY__*` 環境変数で上書きする。
/// 例: `IMAGE_GATEWAY__STORAGE__BUCKET=my-assets`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub policy: ImagePolicy,

    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// リクエスト全体のタイムアウト秒数
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// 上流フェッチのタイムアウト秒数
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

/// ソース画像を置くオブジェクトストレージ
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// バケット名（serve 時は必須）
    #[serde(default)]
    pub bucket: String,

    #[serde(default)]
    pub region: Option<String>,

    /// S3 互換エンドポイント（MinIO など）
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub force_path_style: bool,
}

impl GatewayConfig {
    /// 設定ファイルと環境変数から読み込む
    pub fn load() -> anyhow::Result<Self> {
        let config: GatewayConfig = config::Config::builder()
            .add_source(config::File::with_name("gateway").required(false))
            .add_source(
                config::Environment::with_prefix("IMAGE_GATEWAY")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// 起動前の検証
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.bucket.trim().is_empty() {
            anyhow::bail!("storage.bucket is not set (IMAGE_GATEWAY__STORAGE__BUCKET)");
        }
        if self.policy.formats.is_empty() {
            tracing::warn!("policy.formats is empty, responses will keep the source format");
        }
        if self.policy.min_quality == 0 || self.policy.min_quality > self.policy.max_quality {
            anyhow::bail!(
                "policy quality range {}..={} is invalid",
                self.policy.min_quality,
                self.policy.max_quality
            );
        }
        Ok(())
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr.parse()?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_fetch_timeout_secs() -> u64 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.timeout_secs, 10);
        assert_eq!(cfg.policy, ImagePolicy::default());
        assert_eq!(cfg.engine, EngineConfig::default());
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_validate_requires_bucket() {
        let mut cfg = GatewayConfig::default();
        assert!(cfg.validate().is_err());

        cfg.storage.bucket = "site-assets".to_string();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_policy_from_toml() {
        let cfg: GatewayConfig = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [storage]
                bucket = "site-assets"

                [policy]
                sizes = [200, 400]
                formats = ["image/avif", "image/webp"]
                domains = ["images.example.com"]

                [[policy.remote_patterns]]
                hostname = "**.cdn.example.com"
                protocol = "https"

                [engine]
                minimum_cache_ttl = 300
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.storage.bucket, "site-assets");
        assert_eq!(cfg.policy.sizes, vec![200, 400]);
        assert_eq!(cfg.policy.max_quality, 100);
        assert_eq!(cfg.policy.remote_patterns.len(), 1);
        assert_eq!(cfg.engine.minimum_cache_ttl, 300);
        assert_eq!(cfg.engine.avif_speed, 6);
    }
}
