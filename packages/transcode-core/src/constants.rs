/// 出力画像の最大寸法（幅・高さ）
pub const MAX_DIMENSION: u32 = 4096;

/// 画像の最大ピクセル数（1GP = 実質無制限、極端な攻撃のみ防止）
pub const MAX_PIXELS: u64 = 1_000_000_000;

/// 取得するソース画像の最大バイト数
pub const MAX_INPUT_SIZE: u64 = 50 * 1024 * 1024;

/// エンジンが保証する最小キャッシュ秒数
pub const DEFAULT_MINIMUM_CACHE_TTL: u64 = 60;

/// 失敗レスポンスをエッジにキャッシュさせる秒数（1時間後に再試行可能）
pub const FAILURE_MAX_AGE: u64 = 3600;
