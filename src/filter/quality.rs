use super::{FilterError, LinkContext, UrlFilter};
use async_trait::async_trait;
use std::collections::HashMap;
use url::Url;

const BINARY_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "svg", "ico", "bmp", "mp3", "mp4", "avi", "mov", "webm",
    "zip", "gz", "tar", "rar", "7z", "exe", "dmg", "iso", "woff", "woff2", "ttf", "css", "js",
];

const SESSION_PARAMS: &[&str] = &["sid", "sessionid", "session_id", "phpsessid", "jsessionid"];

/// Heuristic quality signal for a candidate URL, in [0, 1]
///
/// Starts at 1.0 and subtracts penalties for traits that usually mark
/// low-value or trap URLs: very long URLs, many query parameters, session
/// identifiers, deep paths, path segments repeated three or more times, binary
/// asset extensions, and blank anchor text.
pub fn url_quality(url: &Url, anchor_text: Option<&str>) -> f64 {
    let mut quality = 1.0;

    let length = url.as_str().len();
    if length > 200 {
        quality -= 0.35;
    } else if length > 120 {
        quality -= 0.2;
    }

    let params: Vec<String> = url
        .query_pairs()
        .map(|(k, _)| k.to_lowercase())
        .collect();
    if params.len() > 3 {
        quality -= 0.2;
    }
    if params.iter().any(|k| SESSION_PARAMS.contains(&k.as_str())) {
        quality -= 0.3;
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();
    if segments.len() > 6 {
        quality -= 0.15;
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for seg in &segments {
        *seen.entry(*seg).or_insert(0) += 1;
    }
    if seen.values().any(|&count| count >= 3) {
        quality -= 0.3;
    }

    if let Some(last) = segments.last() {
        if let Some((_, ext)) = last.rsplit_once('.') {
            if BINARY_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
                quality -= 0.5;
            }
        }
    }

    if matches!(anchor_text, Some(text) if text.trim().is_empty()) {
        quality -= 0.1;
    }

    f64::clamp(quality, 0.0, 1.0)
}

/// Rejects URLs whose heuristic quality falls below a threshold
#[derive(Debug, Clone)]
pub struct QualityFilter {
    threshold: f64,
}

impl QualityFilter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

#[async_trait]
impl UrlFilter for QualityFilter {
    fn name(&self) -> &str {
        "quality"
    }

    async fn evaluate(&self, url: &Url, ctx: &LinkContext) -> Result<bool, FilterError> {
        Ok(url_quality(url, ctx.anchor_text.as_deref()) >= self.threshold)
    }
}
