use std::io::Cursor;

use image::metadata::Orientation;
use image::DynamicImage;

/// ソースの EXIF から Orientation タグ (1〜8) を読む
///
/// EXIF を持たないフォーマットや範囲外の値は None。
pub fn read_orientation(data: &[u8]) -> Option<Orientation> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .ok()?;
    let raw = exif
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)?
        .value
        .get_uint(0)?;

    Orientation::from_exif(u8::try_from(raw).ok()?)
}

/// EXIF に従って画像を正立させる
///
/// 再エンコードでメタデータは落ちるため、回転はピクセルに焼き込む必要がある。
pub fn correct_orientation(mut img: DynamicImage, data: &[u8]) -> DynamicImage {
    if let Some(orientation) = read_orientation(data) {
        img.apply_orientation(orientation);
    }
    img
}
