/// ストレージキーの最大長
const MAX_KEY_LENGTH: usize = 1024;

/// S3 のキーとして避けるべき文字
const AVOIDED_CHARS: &[char] = &[
    '\\', '{', '}', '^', '%', '`', '[', ']', '"', '<', '>', '~', '#', '|',
];

/// オブジェクトキーを検証する
///
/// `.` / `..` のパスセグメントと空セグメントを拒否し、制御文字と S3 で避けるべき文字を検出する。
/// 先頭の区切り文字は分類段階で取り除かれている前提。
pub fn validate_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("key is empty".to_string());
    }

    if key.len() > MAX_KEY_LENGTH {
        return Err(format!("key is too long (max {MAX_KEY_LENGTH})"));
    }

    let decoded = urlencoding::decode(key).map_err(|_| "invalid URL encoding".to_string())?;

    if decoded
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err("path traversal detected".to_string());
    }

    if decoded
        .chars()
        .any(|c| c.is_control() || AVOIDED_CHARS.contains(&c))
    {
        return Err("invalid characters in key".to_string());
    }

    Ok(())
}
