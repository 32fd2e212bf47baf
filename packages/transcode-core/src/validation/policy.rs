use serde::{Deserialize, Serialize};
use url::Url;

use crate::transform::OutputFormat;

/// 変換ポリシー
///
/// 許可するリモートホスト、幅、品質、出力フォーマットを定義する。起動時に設定から読み込む。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImagePolicy {
    /// 許可する幅の一覧（空なら `1..=max_width` の任意の幅）
    #[serde(default = "default_sizes")]
    pub sizes: Vec<u32>,

    #[serde(default = "default_max_width")]
    pub max_width: u32,

    #[serde(default = "default_min_quality")]
    pub min_quality: u8,

    #[serde(default = "default_max_quality")]
    pub max_quality: u8,

    /// 出力候補（優先順）
    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,

    /// 完全一致で許可するリモートホスト名
    #[serde(default)]
    pub domains: Vec<String>,

    #[serde(default)]
    pub remote_patterns: Vec<RemotePattern>,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            sizes: default_sizes(),
            max_width: default_max_width(),
            min_quality: default_min_quality(),
            max_quality: default_max_quality(),
            formats: default_formats(),
            domains: Vec::new(),
            remote_patterns: Vec::new(),
        }
    }
}

/// デバイス幅と画像幅の既定値
fn default_sizes() -> Vec<u32> {
    vec![
        16, 32, 48, 64, 96, 128, 256, 384, 640, 750, 828, 1080, 1200, 1920, 2048, 3840,
    ]
}

fn default_max_width() -> u32 {
    3840
}

fn default_min_quality() -> u8 {
    1
}

fn default_max_quality() -> u8 {
    100
}

fn default_formats() -> Vec<OutputFormat> {
    vec![OutputFormat::WebP]
}

impl ImagePolicy {
    pub fn is_width_allowed(&self, width: u32) -> bool {
        if self.sizes.is_empty() {
            (1..=self.max_width).contains(&width)
        } else {
            self.sizes.contains(&width)
        }
    }

    pub fn is_quality_allowed(&self, quality: u8) -> bool {
        (self.min_quality..=self.max_quality).contains(&quality)
    }

    /// リモート URL が `domains` か `remote_patterns` のいずれかに一致するか
    pub fn is_remote_allowed(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        self.domains.iter().any(|domain| domain.eq_ignore_ascii_case(host))
            || self.remote_patterns.iter().any(|pattern| pattern.matches(url))
    }
}

/// リモート画像の許可パターン
///
/// `hostname` の `*` は1ラベル、`**` は任意個のラベルに一致する。
/// `pathname` も同様に `/` 区切りのセグメント単位で照合する（省略時は全パス）。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RemotePattern {
    #[serde(default)]
    pub protocol: Option<String>,
    pub hostname: String,
    #[serde(default)]
    pub port: Option<String>,
    #[serde(default)]
    pub pathname: Option<String>,
}

impl RemotePattern {
    pub fn matches(&self, url: &Url) -> bool {
        if let Some(protocol) = &self.protocol
            && !protocol.trim_end_matches(':').eq_ignore_ascii_case(url.scheme())
        {
            return false;
        }

        if let Some(port) = &self.port {
            let actual = url.port().map(|p| p.to_string()).unwrap_or_default();
            if *port != actual {
                return false;
            }
        }

        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_lowercase();
        let hostname = self.hostname.to_lowercase();
        if !glob_match(&hostname, &host, '.') {
            return false;
        }

        match &self.pathname {
            Some(pathname) => glob_match(pathname, url.path(), '/'),
            None => true,
        }
    }
}

/// 区切り文字単位のグロブ照合
fn glob_match(pattern: &str, target: &str, separator: char) -> bool {
    let pattern: Vec<&str> = pattern.split(separator).collect();
    let target: Vec<&str> = target.split(separator).collect();
    match_segments(&pattern, &target)
}

fn match_segments(pattern: &[&str], target: &[&str]) -> bool {
    match pattern.split_first() {
        None => target.is_empty(),
        Some((&"**", rest)) => (0..=target.len()).any(|skip| match_segments(rest, &target[skip..])),
        Some((head, rest)) => match target.split_first() {
            Some((segment, remaining)) => {
                match_wildcard(head.as_bytes(), segment.as_bytes()) && match_segments(rest, remaining)
            }
            None => false,
        },
    }
}

/// セグメント内の `*` を任意文字列として照合する
fn match_wildcard(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((b'*', rest)) => (0..=text.len()).any(|skip| match_wildcard(rest, &text[skip..])),
        Some((c, rest)) => text
            .split_first()
            .is_some_and(|(t, remaining)| t == c && match_wildcard(rest, remaining)),
    }
}
