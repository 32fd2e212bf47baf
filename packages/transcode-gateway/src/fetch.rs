use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::Client;
use transcode_core::{HttpFetcher, HttpResponse, SourceError};
use url::Url;

/// リモートオリジンから画像を取得する HTTP クライアント
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// タイムアウトは転送層に任せる（ここでは設定値を渡すだけ）
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("transcode-gateway/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

fn header_value(headers: &reqwest::header::HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &Url) -> Result<HttpResponse, SourceError> {
        let upstream_error = |e: reqwest::Error| SourceError::Upstream {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(upstream_error)?;

        let status = response.status().as_u16();
        let content_type = header_value(response.headers(), CONTENT_TYPE);
        let cache_control = header_value(response.headers(), CACHE_CONTROL);

        let body = response.bytes().await.map_err(upstream_error)?;

        Ok(HttpResponse {
            status,
            content_type,
            cache_control,
            body,
        })
    }
}
