use std::fmt;

use bytes::Bytes;
use url::Url;

/// 正規化済みのソース参照
///
/// 生の参照文字列が `http` で始まるかどうかだけで分類する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceReference {
    /// リモートオリジンの絶対 URL
    RemoteUrl(Url),
    /// 内部オブジェクトストレージのキー（先頭の区切り文字なし）
    StorageKey(String),
}

/// 分類のみ行った段階の参照（URL パース前）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawReference<'a> {
    Remote(&'a str),
    Storage(&'a str),
}

/// 生の参照をリモートかストレージかに分類する
///
/// 大文字小文字を区別せず `http` で始まればリモート。
/// それ以外は先頭の区切り文字を1つだけ取り除いたストレージキー。
pub fn classify(raw: &str) -> RawReference<'_> {
    let is_remote = raw
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("http"));

    if is_remote {
        RawReference::Remote(raw)
    } else {
        RawReference::Storage(raw.strip_prefix('/').unwrap_or(raw))
    }
}

impl fmt::Display for SourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceReference::RemoteUrl(url) => write!(f, "{url}"),
            SourceReference::StorageKey(key) => write!(f, "{key}"),
        }
    }
}

/// オリジンから取得したソース画像
///
/// リクエストごとに作られ、変換エンジンに一度だけ渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSource {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub status_hint: u16,
}
