use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::constants::MAX_INPUT_SIZE;
use crate::errors::SourceError;
use crate::source::{FetchedSource, SourceReference};

/// オブジェクトストレージから読み出した1オブジェクト
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// 本文がなければ None
    pub body: Option<Bytes>,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
}

/// 名前付きバケット内のキーで1オブジェクトを読むストレージ
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// オブジェクトが存在しなければ `Ok(None)`
    async fn get_object(&self, key: &str) -> Result<Option<StoredObject>, SourceError>;
}

/// 上流 HTTP レスポンス
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub body: Bytes,
}

/// 絶対 URL への GET
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(&self, url: &Url) -> Result<HttpResponse, SourceError>;
}

/// ソース画像をリモートオリジンか内部ストレージから取得する
///
/// 本文は常に全体をメモリに読み込む。内部でリトライはしない。
#[derive(Clone)]
pub struct OriginResolver {
    storage: Arc<dyn ObjectStore>,
    http: Arc<dyn HttpFetcher>,
}

impl OriginResolver {
    pub fn new(storage: Arc<dyn ObjectStore>, http: Arc<dyn HttpFetcher>) -> Self {
        Self { storage, http }
    }

    pub async fn fetch_source(&self, source: &SourceReference) -> Result<FetchedSource, SourceError> {
        let fetched = match source {
            SourceReference::RemoteUrl(url) => self.fetch_remote(url).await?,
            SourceReference::StorageKey(key) => self.fetch_stored(key).await?,
        };

        let size = fetched.bytes.len() as u64;
        if size > MAX_INPUT_SIZE {
            return Err(SourceError::TooLarge {
                size,
                max: MAX_INPUT_SIZE,
            });
        }

        Ok(fetched)
    }

    async fn fetch_remote(&self, url: &Url) -> Result<FetchedSource, SourceError> {
        tracing::info!(url = %url, "fetching image from remote origin");
        let response = self.http.get(url).await?;

        if !(200..300).contains(&response.status) {
            tracing::warn!(url = %url, status = response.status, "remote origin returned error status");
            return Err(SourceError::UpstreamStatus {
                url: url.to_string(),
                status: response.status,
            });
        }

        Ok(FetchedSource {
            bytes: response.body,
            content_type: response.content_type,
            cache_control: response.cache_control,
            status_hint: response.status,
        })
    }

    async fn fetch_stored(&self, key: &str) -> Result<FetchedSource, SourceError> {
        tracing::info!(key = %key, "fetching image from object storage");
        let not_found = || SourceError::NotFound { key: key.to_string() };

        let object = self.storage.get_object(key).await?.ok_or_else(not_found)?;
        let bytes = object.body.ok_or_else(not_found)?;

        Ok(FetchedSource {
            bytes,
            content_type: object.content_type,
            cache_control: object.cache_control,
            status_hint: 200,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 呼び出し回数を数えるメモリ上のストレージ
    #[derive(Default)]
    pub struct MemoryStore {
        pub objects: HashMap<String, StoredObject>,
        pub calls: AtomicUsize,
    }

    impl MemoryStore {
        pub fn with(key: &str, object: StoredObject) -> Self {
            Self {
                objects: HashMap::from([(key.to_string(), object)]),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn get_object(&self, key: &str) -> Result<Option<StoredObject>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.objects.get(key).cloned())
        }
    }

    /// 固定レスポンスを返す HTTP クライアント
    #[derive(Default)]
    pub struct StaticFetcher {
        pub responses: HashMap<String, HttpResponse>,
        pub calls: AtomicUsize,
    }

    impl StaticFetcher {
        pub fn with(url: &str, response: HttpResponse) -> Self {
            Self {
                responses: HashMap::from([(url.to_string(), response)]),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpFetcher for StaticFetcher {
        async fn get(&self, url: &Url) -> Result<HttpResponse, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| SourceError::Upstream {
                    url: url.to_string(),
                    reason: "connection refused".to_string(),
                })
        }
    }
}
