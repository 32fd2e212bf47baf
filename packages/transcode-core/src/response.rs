use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;

use crate::constants::FAILURE_MAX_AGE;
use crate::errors::GatewayError;
use crate::transform::TranscodeResult;

pub const HEADER_CACHE_CONTROL: &str = "Cache-Control";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_VARY: &str = "Vary";

/// ゲートウェイが返す唯一の外部成果物
///
/// プロキシ統合の JSON 形式（`statusCode` / `headers` / `body` / `isBase64Encoded`）で直列化される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    #[serde(rename = "isBase64Encoded")]
    pub body_is_base64: bool,
}

fn immutable_cache_control(max_age: u64) -> String {
    format!("public,max-age={max_age},immutable")
}

fn headers(content_type: &str, cache_control: String) -> BTreeMap<String, String> {
    BTreeMap::from([
        (HEADER_VARY.to_string(), "Accept".to_string()),
        (HEADER_CACHE_CONTROL.to_string(), cache_control),
        (HEADER_CONTENT_TYPE.to_string(), content_type.to_string()),
    ])
}

/// 変換結果またはエラーから最終レスポンスを組み立てる
///
/// 失敗時は1時間の public キャッシュを付け、同一の不正リクエストをエッジで吸収させる。
pub fn compose(outcome: Result<TranscodeResult, GatewayError>) -> GatewayResponse {
    match outcome {
        Ok(result) => GatewayResponse {
            status_code: 200,
            headers: headers(
                &result.content_type,
                immutable_cache_control(result.max_age_seconds),
            ),
            body: STANDARD.encode(&result.bytes),
            body_is_base64: true,
        },
        Err(err) => GatewayResponse {
            status_code: 500,
            headers: headers("application/json", immutable_cache_control(FAILURE_MAX_AGE)),
            body: err.to_string(),
            body_is_base64: false,
        },
    }
}
