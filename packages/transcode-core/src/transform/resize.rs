use crate::errors::TransformError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::DynamicImage;

/// 画像をリサイズする
///
/// fast_image_resize の Lanczos3 フィルタを使用。
/// アルファチャンネルを持つ画像は RGBA8 のまま処理する。
pub fn resize_image(
    img: &DynamicImage,
    target_w: u32,
    target_h: u32,
    max_pixels: u64,
) -> Result<DynamicImage, TransformError> {
    let total_pixels = target_w as u64 * target_h as u64;
    if total_pixels > max_pixels {
        return Err(TransformError::ResolutionTooLarge {
            width: target_w,
            height: target_h,
        });
    }

    let (width, height) = (img.width(), img.height());
    let has_alpha = img.color().has_alpha();
    let (raw, pixel_type) = if has_alpha {
        (img.to_rgba8().into_raw(), PixelType::U8x4)
    } else {
        (img.to_rgb8().into_raw(), PixelType::U8x3)
    };

    let src_image = Image::from_vec_u8(width, height, raw, pixel_type).map_err(|e| {
        TransformError::ProcessingFailed(format!("failed to create source image: {e}"))
    })?;
    let mut dst_image = Image::new(target_w, target_h, pixel_type);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    Resizer::new()
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| TransformError::ProcessingFailed(format!("resize failed: {e}")))?;

    let converted = if has_alpha {
        image::RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
            .map(DynamicImage::ImageRgba8)
    } else {
        image::RgbImage::from_raw(target_w, target_h, dst_image.into_vec())
            .map(DynamicImage::ImageRgb8)
    };

    converted.ok_or_else(|| {
        TransformError::ProcessingFailed("failed to convert resized image".to_string())
    })
}
