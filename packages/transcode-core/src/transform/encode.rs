use std::io::Cursor;

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageFormat, ImageResult};

use crate::errors::TransformError;
use crate::transform::params::OutputFormat;

/// 出力フォーマットでエンコードする
///
/// `quality` は JPEG と AVIF のみに効く。WebP はロスレス、PNG は可逆なので無視される。
pub fn encode_image(
    img: &DynamicImage,
    format: OutputFormat,
    quality: u8,
    avif_speed: u8,
) -> Result<Vec<u8>, TransformError> {
    let mut out = Vec::new();

    let written: ImageResult<()> = {
        let sink = Cursor::new(&mut out);
        match format {
            // JPEG はアルファを持てない
            OutputFormat::Jpeg => img
                .to_rgb8()
                .write_with_encoder(JpegEncoder::new_with_quality(sink, quality)),
            OutputFormat::Png => img.write_with_encoder(PngEncoder::new(sink)),
            OutputFormat::WebP => img.write_with_encoder(WebPEncoder::new_lossless(sink)),
            OutputFormat::Avif => img.write_with_encoder(AvifEncoder::new_with_speed_quality(
                sink, avif_speed, quality,
            )),
        }
    };

    written.map_err(|e| TransformError::ProcessingFailed(format!("{format} encode failed: {e}")))?;
    Ok(out)
}

/// デコードしたソースのフォーマットが再エンコード可能ならその OutputFormat
pub fn encodable_format(format: ImageFormat) -> Option<OutputFormat> {
    match format {
        ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
        ImageFormat::Png => Some(OutputFormat::Png),
        ImageFormat::WebP => Some(OutputFormat::WebP),
        ImageFormat::Avif => Some(OutputFormat::Avif),
        _ => None,
    }
}
