//! エッジのパスパターンごとのオリジン・キャッシュ方針
//!
//! デプロイ層が組み立てる静的な表。ゲートウェイはここから自分の担当パスと
//! 転送されるヘッダを知る。

use serde::Serialize;

/// 変換ゲートウェイが担当するパス
pub const IMAGE_PATH: &str = "/transform/image";

const DAY: u64 = 24 * 60 * 60;
const YEAR: u64 = 365 * DAY;

/// 転送先オリジン
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    Application,
    TranscodingGateway,
    ObjectStorage,
}

/// エッジキャッシュ方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CachePolicy {
    /// キャッシュしない（そのまま転送）
    Disabled,
    /// TTL 範囲内でオリジンの Cache-Control に従う
    Ttl {
        default_secs: u64,
        min_secs: u64,
        max_secs: u64,
        query_string_aware: bool,
    },
    /// コンテンツアドレスな静的アセット
    Immutable { ttl_secs: u64 },
}

/// クエリ文字列の転送方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryForwarding {
    None,
    All,
}

/// 1つのパスパターンに対する振る舞い
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Behavior {
    pub pattern: &'static str,
    pub origin: OriginKind,
    pub cache: CachePolicy,
    pub forwarded_query: QueryForwarding,
    /// 転送するヘッダ名（小文字）
    pub forwarded_headers: Vec<&'static str>,
}

impl Behavior {
    /// ヘッダがオリジンへ転送されるか（大文字小文字を区別しない）
    pub fn forwards_header(&self, name: &str) -> bool {
        self.forwarded_headers
            .iter()
            .any(|header| header.eq_ignore_ascii_case(name))
    }
}

/// パスパターン → 振る舞いの表
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingPolicy {
    pub default_behavior: Behavior,
    pub behaviors: Vec<Behavior>,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        let static_assets = |pattern| Behavior {
            pattern,
            origin: OriginKind::ObjectStorage,
            cache: CachePolicy::Immutable { ttl_secs: YEAR },
            forwarded_query: QueryForwarding::None,
            forwarded_headers: vec![],
        };

        Self {
            default_behavior: Behavior {
                pattern: "/*",
                origin: OriginKind::Application,
                cache: CachePolicy::Disabled,
                forwarded_query: QueryForwarding::None,
                forwarded_headers: vec![],
            },
            behaviors: vec![
                Behavior {
                    pattern: "/transform/image*",
                    origin: OriginKind::TranscodingGateway,
                    cache: CachePolicy::Ttl {
                        default_secs: DAY,
                        min_secs: 0,
                        max_secs: YEAR,
                        query_string_aware: true,
                    },
                    forwarded_query: QueryForwarding::All,
                    forwarded_headers: vec!["accept"],
                },
                static_assets("/assets/static/*"),
                static_assets("/static/*"),
            ],
        }
    }
}

impl RoutingPolicy {
    /// パスに適用される振る舞いを選ぶ（最初に一致した追加パターン、なければデフォルト）
    pub fn select(&self, path: &str) -> &Behavior {
        self.behaviors
            .iter()
            .find(|behavior| path_matches(behavior.pattern, path))
            .unwrap_or(&self.default_behavior)
    }

    /// 変換ゲートウェイ向けの振る舞い
    pub fn gateway_behavior(&self) -> Option<&Behavior> {
        self.behaviors
            .iter()
            .find(|behavior| behavior.origin == OriginKind::TranscodingGateway)
    }
}

/// `*`（0文字以上）と `?`（1文字）のみを解釈するパスパターン照合
pub fn path_matches(pattern: &str, path: &str) -> bool {
    fn matches(pattern: &[u8], path: &[u8]) -> bool {
        match pattern.split_first() {
            None => path.is_empty(),
            Some((b'*', rest)) => (0..=path.len()).any(|skip| matches(rest, &path[skip..])),
            Some((b'?', rest)) => !path.is_empty() && matches(rest, &path[1..]),
            Some((c, rest)) => path.first() == Some(c) && matches(rest, &path[1..]),
        }
    }

    matches(pattern.as_bytes(), path.as_bytes())
}
