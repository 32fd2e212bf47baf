use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::source::FetchedSource;

/// 出力フォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Avif,
}

impl OutputFormat {
    /// `f` パラメータの短い名前から OutputFormat を作成
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "avif" => Some(Self::Avif),
            _ => None,
        }
    }

    /// MIME タイプから OutputFormat を作成（パラメータ部分は無視）
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::WebP),
            "image/avif" => Some(Self::Avif),
            _ => None,
        }
    }

    /// Content-Type を取得
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Avif => "image/avif",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content_type())
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_mime(&value)
            .or_else(|| Self::from_name(&value))
            .ok_or_else(|| format!("unsupported output format: {value}"))
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> Self {
        format.content_type().to_string()
    }
}

/// 変換エンジンへの入力
#[derive(Debug, Clone)]
pub struct TranscodeInput {
    pub source: FetchedSource,
    pub width: u32,
    pub quality: u8,
    /// 優先順に並んだ出力候補（空ならソースのフォーマットを維持）
    pub accepted_formats: Vec<OutputFormat>,
}

/// 変換エンジンの出力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeResult {
    pub bytes: Bytes,
    pub content_type: String,
    pub max_age_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_name() {
        assert_eq!(OutputFormat::from_name("jpeg"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_name("JPG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_name("png"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_name("webp"), Some(OutputFormat::WebP));
        assert_eq!(OutputFormat::from_name("avif"), Some(OutputFormat::Avif));
        assert_eq!(OutputFormat::from_name("unknown"), None);
    }

    #[test]
    fn test_output_format_from_mime() {
        assert_eq!(OutputFormat::from_mime("image/webp"), Some(OutputFormat::WebP));
        assert_eq!(OutputFormat::from_mime("Image/AVIF"), Some(OutputFormat::Avif));
        assert_eq!(OutputFormat::from_mime("image/png;q=0.8"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_mime("image/svg+xml"), None);
        assert_eq!(OutputFormat::from_mime("*/*"), None);
    }

    #[test]
    fn test_content_type() {
        assert_eq!(OutputFormat::Jpeg.content_type(), "image/jpeg");
        assert_eq!(OutputFormat::Png.content_type(), "image/png");
        assert_eq!(OutputFormat::WebP.content_type(), "image/webp");
        assert_eq!(OutputFormat::Avif.content_type(), "image/avif");
    }

    #[test]
    fn test_output_format_deserialize() {
        let formats: Vec<OutputFormat> =
            serde_json::from_str(r#"["image/avif", "webp"]"#).unwrap();
        assert_eq!(formats, vec![OutputFormat::Avif, OutputFormat::WebP]);
        assert!(serde_json::from_str::<OutputFormat>(r#""image/tiff""#).is_err());
    }
}
