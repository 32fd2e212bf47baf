use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use transcode_core::{ObjectStore, SourceError, StoredObject};

use crate::config::StorageConfig;

/// 名前付きバケットからソース画像を読む S3 クライアント
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// 設定から S3 クライアントを作成する
    ///
    /// 認証情報は AWS の標準チェーン（環境変数・プロファイル・ロール）から解決される。
    pub async fn from_config(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared_config = loader.load().await;

        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if config.force_path_style {
            s3_builder = s3_builder.force_path_style(true);
        }

        Self::new(Client::from_conf(s3_builder.build()), config.bucket.clone())
    }

    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, key: &str) -> Result<Option<StoredObject>, SourceError> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    tracing::warn!(key = %key, bucket = %self.bucket, "object not found");
                    return Ok(None);
                }
                let err = storage_error(key, &service_err);
                tracing::error!(key = %key, bucket = %self.bucket, error = %err, "storage read failed");
                return Err(err);
            }
        };

        let content_type = output.content_type().map(str::to_string);
        let cache_control = output.cache_control().map(str::to_string);

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| storage_error(key, &e))?
            .into_bytes();

        Ok(Some(StoredObject {
            body: Some(body).filter(|bytes| !bytes.is_empty()),
            content_type,
            cache_control,
        }))
    }
}

/// SDK エラーは Display だけだと "unhandled error" になりやすいので、原因の連鎖ごと残す
fn storage_error(key: &str, err: &(dyn std::error::Error + 'static)) -> SourceError {
    SourceError::Storage {
        key: key.to_string(),
        reason: DisplayErrorContext(err).to_string(),
    }
}
