use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MINIMUM_CACHE_TTL, MAX_DIMENSION, MAX_PIXELS};
use crate::errors::TransformError;
use crate::transform::decode::{animated_format, decode_image, is_svg};
use crate::transform::dimensions::fit_width;
use crate::transform::encode::{encodable_format, encode_image};
use crate::transform::negotiate::max_age_from_cache_control;
use crate::transform::orientation::correct_orientation;
use crate::transform::params::{OutputFormat, TranscodeInput, TranscodeResult};
use crate::transform::resize::resize_image;

/// 画像変換エンジン
///
/// ソースバイト列とパラメータを受け取り、変換後のバイト列・Content-Type・max-age を返す。
/// CPU バウンドな同期処理として呼び出される。
pub trait TransformEngine: Send + Sync {
    fn transcode(&self, input: TranscodeInput) -> Result<TranscodeResult, TransformError>;
}

/// エンジン設定
///
/// 起動時に一度だけ構築して注入する。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_minimum_cache_ttl")]
    pub minimum_cache_ttl: u64,

    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,

    #[serde(default = "default_max_pixels")]
    pub max_pixels: u64,

    #[serde(default = "default_avif_speed")]
    pub avif_speed: u8,

    /// SVG を無変換で通すか
    #[serde(default)]
    pub allow_svg: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            minimum_cache_ttl: default_minimum_cache_ttl(),
            max_dimension: default_max_dimension(),
            max_pixels: default_max_pixels(),
            avif_speed: default_avif_speed(),
            allow_svg: false,
        }
    }
}

fn default_minimum_cache_ttl() -> u64 {
    DEFAULT_MINIMUM_CACHE_TTL
}

fn default_max_dimension() -> u32 {
    MAX_DIMENSION
}

fn default_max_pixels() -> u64 {
    MAX_PIXELS
}

fn default_avif_speed() -> u8 {
    6
}

/// image + fast_image_resize によるラスタ変換エンジン
#[derive(Debug, Clone, Default)]
pub struct RasterEngine {
    config: EngineConfig,
}

impl RasterEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn max_age(&self, cache_control: Option<&str>) -> u64 {
        cache_control
            .and_then(max_age_from_cache_control)
            .unwrap_or(0)
            .max(self.config.minimum_cache_ttl)
    }

    /// ソースの総ピクセル数を検証し、メモリ枯渇を防ぐ
    fn validate_source_dimensions(&self, width: u32, height: u32) -> Result<(), TransformError> {
        if width as u64 * height as u64 > self.config.max_pixels {
            return Err(TransformError::ResolutionTooLarge { width, height });
        }
        Ok(())
    }

    /// 出力幅だけを上限と比べる（高さは幅とアスペクト比から決まるため制限しない）
    fn validate_output_width(&self, width: u32, height: u32) -> Result<(), TransformError> {
        if width > self.config.max_dimension {
            return Err(TransformError::ResolutionTooLarge { width, height });
        }
        Ok(())
    }
}

/// 出力フォーマットを決定する
///
/// 受理リストの先頭、なければ再エンコード可能な元フォーマット、それも無理なら JPEG。
fn determine_output_format(
    accepted: &[OutputFormat],
    source_format: Option<OutputFormat>,
) -> OutputFormat {
    accepted
        .first()
        .copied()
        .or(source_format)
        .unwrap_or(OutputFormat::Jpeg)
}

impl TransformEngine for RasterEngine {
    /// メタデータ (EXIF/XMP) はデコード・エンコードサイクルで削除される。
    fn transcode(&self, input: TranscodeInput) -> Result<TranscodeResult, TransformError> {
        let TranscodeInput {
            source,
            width,
            quality,
            accepted_formats,
        } = input;
        let max_age_seconds = self.max_age(source.cache_control.as_deref());

        if is_svg(source.content_type.as_deref(), &source.bytes) {
            if !self.config.allow_svg {
                return Err(TransformError::UnsupportedSource(
                    "SVG sources are not allowed".to_string(),
                ));
            }
            return Ok(TranscodeResult {
                bytes: source.bytes,
                content_type: "image/svg+xml".to_string(),
                max_age_seconds,
            });
        }

        // アニメーションは1フレームに潰さず、そのまま返す
        if let Some(format) = animated_format(&source.bytes) {
            return Ok(TranscodeResult {
                bytes: source.bytes,
                content_type: format.to_mime_type().to_string(),
                max_age_seconds,
            });
        }

        let (img, source_format) = decode_image(&source.bytes)?;
        let img = correct_orientation(img, &source.bytes);

        let (src_w, src_h) = (img.width(), img.height());
        self.validate_source_dimensions(src_w, src_h)?;

        let (dst_w, dst_h) = fit_width(src_w, src_h, width);
        self.validate_output_width(dst_w, dst_h)?;

        let resized = if (dst_w, dst_h) != (src_w, src_h) {
            resize_image(&img, dst_w, dst_h, self.config.max_pixels)?
        } else {
            img
        };

        let output_format =
            determine_output_format(&accepted_formats, source_format.and_then(encodable_format));
        let output = encode_image(&resized, output_format, quality, self.config.avif_speed)?;

        Ok(TranscodeResult {
            bytes: Bytes::from(output),
            content_type: output_format.content_type().to_string(),
            max_age_seconds,
        })
    }
}
