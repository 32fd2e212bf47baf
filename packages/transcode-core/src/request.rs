use std::collections::HashMap;

use crate::errors::GatewayError;

/// 変換リクエスト
///
/// `raw_path` は `url` クエリパラメータで、空にはならない。
/// ヘッダキーは構築時に小文字へ正規化される（上流とエッジで大文字小文字が揃わないため）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    raw_path: String,
    query_params: HashMap<String, String>,
    request_headers: HashMap<String, String>,
}

impl ImageRequest {
    pub fn new(
        query_params: HashMap<String, String>,
        request_headers: HashMap<String, String>,
    ) -> Result<Self, GatewayError> {
        let raw_path = query_params
            .get("url")
            .filter(|url| !url.is_empty())
            .cloned()
            .ok_or_else(|| GatewayError::InvalidParams(r#""url" parameter is required"#.to_string()))?;

        Ok(Self {
            raw_path,
            query_params,
            request_headers: normalize_headers(request_headers),
        })
    }

    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// ヘッダを名前の大文字小文字を区別せずに取得する
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request_headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// ヘッダキーを小文字に揃える
fn normalize_headers(headers: HashMap<String, String>) -> HashMap<String, String> {
    headers
        .into_iter()
        .map(|(key, value)| (key.to_ascii_lowercase(), value))
        .collect()
}
