use crate::errors::TransformError;
use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

/// 画像バイト列をデコードし、DynamicImage と元のフォーマットを返す
pub fn decode_image(input: &[u8]) -> Result<(DynamicImage, Option<ImageFormat>), TransformError> {
    let reader = ImageReader::new(Cursor::new(input))
        .with_guessed_format()
        .map_err(|e| TransformError::ProcessingFailed(format!("failed to guess format: {e}")))?;

    let source_format = reader.format();
    if source_format.is_none() {
        return Err(TransformError::UnsupportedSource(
            "unrecognized image format".to_string(),
        ));
    }

    let img = reader
        .decode()
        .map_err(|e| TransformError::ProcessingFailed(format!("decode failed: {e}")))?;

    Ok((img, source_format))
}

/// SVG かどうか（ラスタ形式として推測できないため Content-Type と先頭バイトで判定）
/// 複数フレームを持つ GIF / APNG / WebP ならそのフォーマットを返す
pub fn animated_format(input: &[u8]) -> Option<ImageFormat> {
    let format = image::guess_format(input).ok()?;
    let animated = match format {
        ImageFormat::Gif => GifDecoder::new(Cursor::new(input))
            .map(|decoder| decoder.into_frames().take(2).count() > 1)
            .unwrap_or(false),
        ImageFormat::Png => PngDecoder::new(Cursor::new(input))
            .and_then(|decoder| decoder.is_apng())
            .unwrap_or(false),
        ImageFormat::WebP => WebPDecoder::new(Cursor::new(input))
            .map(|decoder| decoder.has_animation())
            .unwrap_or(false),
        _ => false,
    };
    animated.then_some(format)
}

pub fn is_svg(content_type: Option<&str>, input: &[u8]) -> bool {
    if content_type.is_some_and(|ct| ct.trim().to_lowercase().starts_with("image/svg+xml")) {
        return true;
    }
    let head = &input[..input.len().min(256)];
    String::from_utf8_lossy(head).contains("<svg")
}
