use url::Url;

use crate::errors::GatewayError;
use crate::request::ImageRequest;
use crate::source::{classify, RawReference, SourceReference};
use crate::transform::{accepted_formats, OutputFormat};
use crate::validation::key::validate_key;
use crate::validation::policy::ImagePolicy;

/// 検証済みの変換パラメータ
///
/// `validate_params` からのみ構築される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedParams {
    source_ref: SourceReference,
    width: u32,
    quality: u8,
    accepted_formats: Vec<OutputFormat>,
}

impl ValidatedParams {
    pub fn source_ref(&self) -> &SourceReference {
        &self.source_ref
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn accepted_formats(&self) -> &[OutputFormat] {
        &self.accepted_formats
    }
}

fn invalid(reason: impl Into<String>) -> GatewayError {
    GatewayError::InvalidParams(reason.into())
}

/// リクエストをポリシーに照らして検証する
///
/// ネットワークアクセスは一切行わない。失敗時は理由付きの `InvalidParams` を返す。
pub fn validate_params(
    request: &ImageRequest,
    policy: &ImagePolicy,
) -> Result<ValidatedParams, GatewayError> {
    let source_ref = validate_source(request.raw_path(), policy)?;

    let width = request
        .query("w")
        .ok_or_else(|| invalid(r#""w" parameter (width) is required"#))?
        .parse::<u32>()
        .ok()
        .filter(|w| *w > 0)
        .ok_or_else(|| invalid(r#""w" parameter (width) must be a number greater than 0"#))?;
    if !policy.is_width_allowed(width) {
        return Err(invalid(format!(r#""w" parameter (width) of {width} is not allowed"#)));
    }

    let quality_reason = format!(
        r#""q" parameter (quality) must be a number between {} and {}"#,
        policy.min_quality, policy.max_quality
    );
    let quality = request
        .query("q")
        .ok_or_else(|| invalid(r#""q" parameter (quality) is required"#))?
        .parse::<u8>()
        .ok()
        .filter(|q| policy.is_quality_allowed(*q))
        .ok_or_else(|| invalid(quality_reason))?;

    // `f` が指定されていれば Accept より優先する
    let accepted_formats = match request.query("f") {
        Some(name) => {
            let format = OutputFormat::from_name(name)
                .or_else(|| OutputFormat::from_mime(name))
                .filter(|format| policy.formats.contains(format))
                .ok_or_else(|| invalid(format!(r#""f" parameter (format) of {name} is not allowed"#)))?;
            vec![format]
        }
        None => accepted_formats(request.header("accept"), &policy.formats),
    };

    Ok(ValidatedParams {
        source_ref,
        width,
        quality,
        accepted_formats,
    })
}

fn validate_source(raw: &str, policy: &ImagePolicy) -> Result<SourceReference, GatewayError> {
    if raw.starts_with("//") {
        return Err(invalid(r#""url" parameter cannot be a protocol-relative URL (//)"#));
    }

    match classify(raw) {
        RawReference::Remote(href) => {
            let url = Url::parse(href).map_err(|_| invalid(r#""url" parameter is invalid"#))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(invalid(r#""url" parameter is invalid"#));
            }
            if !policy.is_remote_allowed(&url) {
                return Err(invalid(r#""url" parameter is not allowed"#));
            }
            Ok(SourceReference::RemoteUrl(url))
        }
        RawReference::Storage(key) => {
            validate_key(key).map_err(|reason| invalid(format!(r#""url" parameter is invalid: {reason}"#)))?;
            Ok(SourceReference::StorageKey(key.to_string()))
        }
    }
}
