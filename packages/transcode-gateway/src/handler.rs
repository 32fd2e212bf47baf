use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use transcode_core::GatewayResponse;

use crate::AppState;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// 画像変換エンドポイント
///
/// エッジと同じく、ルーティング方針で許可されたヘッダだけをゲートウェイに渡す。
pub async fn transform(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let forwarded = forwarded_headers(&state, &headers);

    let response = state.gateway.handle(query, forwarded).await;
    into_http_response(response)
}

fn forwarded_headers(state: &AppState, headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter(|(name, _)| state.behavior.forwards_header(name.as_str()))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

/// GatewayResponse を HTTP レスポンスに変換する
///
/// base64 本文は関数 URL のフロントと同じく生バイトに戻して返す。
pub fn into_http_response(response: GatewayResponse) -> Response {
    let body = if response.body_is_base64 {
        match STANDARD.decode(response.body.as_bytes()) {
            Ok(bytes) => Body::from(bytes),
            Err(e) => {
                tracing::error!(error = %e, "gateway produced an invalid base64 body");
                return (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response();
            }
        }
    } else {
        Body::from(response.body)
    };

    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut http_response = (status, body).into_response();

    for (name, value) in &response.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                http_response.headers_mut().insert(name, value);
            }
            _ => tracing::warn!(header = %name, "dropping header that is not valid HTTP"),
        }
    }

    http_response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use std::collections::BTreeMap;

    fn gateway_response(status_code: u16, body: &str, body_is_base64: bool) -> GatewayResponse {
        GatewayResponse {
            status_code,
            headers: BTreeMap::from([
                ("Vary".to_string(), "Accept".to_string()),
                ("Content-Type".to_string(), "image/png".to_string()),
                ("Cache-Control".to_string(), "public,max-age=60,immutable".to_string()),
            ]),
            body: body.to_string(),
            body_is_base64,
        }
    }

    #[test]
    fn test_into_http_response_copies_headers() {
        let response = into_http_response(gateway_response(200, "AAEC", true));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::VARY], "Accept");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public,max-age=60,immutable"
        );
    }

    #[test]
    fn test_into_http_response_rejects_bad_base64() {
        let response = into_http_response(gateway_response(200, "%%%", true));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
