/// 倍率を適用して新しい寸法を計算する（最小1px）
fn apply_scale(src_w: u32, src_h: u32, scale: f64) -> (u32, u32) {
    let new_w = (src_w as f64 * scale).round() as u32;
    let new_h = (src_h as f64 * scale).round() as u32;

    (new_w.max(1), new_h.max(1))
}

/// 幅指定でアスペクト比を維持した寸法を計算する
///
/// withoutEnlargement: 元画像より大きくしない
pub fn fit_width(src_w: u32, src_h: u32, target_w: u32) -> (u32, u32) {
    if src_w == 0 || src_h == 0 {
        return (src_w, src_h);
    }
    let scale = (target_w as f64 / src_w as f64).min(1.0);
    apply_scale(src_w, src_h, scale)
}
