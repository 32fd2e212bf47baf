use crate::transform::params::OutputFormat;

/// `Accept` ヘッダと許可フォーマットの積集合を許可リストの順で返す
///
/// ワイルドカード（`*/*`、`image/*`）は一致とみなさない。明示的に列挙された
/// MIME タイプだけが候補になる。`q=0` のエントリは除外する。
pub fn accepted_formats(accept: Option<&str>, allowed: &[OutputFormat]) -> Vec<OutputFormat> {
    let Some(accept) = accept else {
        return Vec::new();
    };

    let listed: Vec<OutputFormat> = accept
        .split(',')
        .filter(|entry| !is_refused(entry))
        .filter_map(OutputFormat::from_mime)
        .collect();

    allowed
        .iter()
        .copied()
        .filter(|format| listed.contains(format))
        .collect()
}

fn is_refused(entry: &str) -> bool {
    entry.split(';').skip(1).any(|param| {
        let param = param.trim();
        param
            .strip_prefix("q=")
            .and_then(|q| q.trim().parse::<f32>().ok())
            .is_some_and(|q| q <= 0.0)
    })
}

/// `Cache-Control` から `s-maxage`（優先）または `max-age` を取り出す
pub fn max_age_from_cache_control(cache_control: &str) -> Option<u64> {
    let directive = |name: &str| {
        cache_control.split(',').find_map(|part| {
            let (key, value) = part.trim().split_once('=')?;
            if key.trim().eq_ignore_ascii_case(name) {
                value.trim().trim_matches('"').parse::<u64>().ok()
            } else {
                None
            }
        })
    };

    directive("s-maxage").or_else(|| directive("max-age"))
}
