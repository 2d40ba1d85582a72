//! Values pulled from a post's ACF fields for the report template

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::wordpress::PostData;

/// ACF fields copied into `{{key}}` placeholders
pub const METADATA_KEYS: [&str; 15] = [
    "test",
    "ad_copy",
    "age_text",
    "age1",
    "condition",
    "signature1",
    "signature2",
    "style",
    "valuation_method",
    "conclusion1",
    "conclusion2",
    "authorship",
    "table",
    "glossary",
    "value",
];

/// Longer values are cut and suffixed with `...`
pub const MAX_METADATA_CHARS: usize = 5000;

/// ACF field holding the gallery's media ids
pub const GALLERY_FIELD: &str = "googlevision";

/// ACF image fields and the placeholders they fill
pub const IMAGE_FIELDS: [(&str, &str); 3] = [
    ("age", "age_image"),
    ("signature", "signature_image"),
    ("main", "main_image"),
];

/// Text of an ACF field, truncated to `MAX_METADATA_CHARS`
pub fn metadata_value(post: &PostData, key: &str) -> String {
    let value = match post.acf_field(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    };
    truncate(key, value)
}

fn truncate(key: &str, value: String) -> String {
    if value.chars().count() <= MAX_METADATA_CHARS {
        return value;
    }
    warn!("Metadata '{}' exceeds {} characters and was truncated", key, MAX_METADATA_CHARS);
    let mut cut: String = value.chars().take(MAX_METADATA_CHARS).collect();
    cut.push_str("...");
    cut
}

/// Leading decimal number of `raw`, the way a lenient float parse reads it
fn leading_number(raw: &str) -> Option<f64> {
    static NUMBER: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = NUMBER
        .get_or_init(|| Regex::new(r"^\s*[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").ok())
        .as_ref()?;
    pattern
        .find(raw)
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// Format as Spanish-locale US dollars: `1234,50 US$`, `12.345,00 US$`
///
/// Thousands are grouped only from five integer digits up, and the symbol
/// follows a non-breaking space.
pub fn format_currency_es(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let integer = (cents / 100).to_string();
    let fraction = cents % 100;

    let grouped = if integer.len() >= 5 {
        let mut out = String::with_capacity(integer.len() + integer.len() / 3);
        for (i, digit) in integer.chars().enumerate() {
            if i > 0 && (integer.len() - i) % 3 == 0 {
                out.push('.');
            }
            out.push(digit);
        }
        out
    } else {
        integer
    };

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}{},{:02}\u{a0}US$", sign, grouped, fraction)
}

/// `value` rendered for `{{appraisal_value}}`
pub fn appraisal_value(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    match leading_number(raw) {
        Some(amount) => format_currency_es(amount),
        None => raw.to_string(),
    }
}

/// All placeholder values for a post
pub fn template_values(post: &PostData) -> BTreeMap<String, String> {
    let mut values: BTreeMap<String, String> = METADATA_KEYS
        .iter()
        .map(|key| (key.to_string(), metadata_value(post, key)))
        .collect();

    let value = values.get("value").cloned().unwrap_or_default();
    values.insert("appraisal_value".to_string(), appraisal_value(&value));
    values.insert("appraisal_title".to_string(), post.decoded_title());
    values.insert("appraisal_date".to_string(), post.formatted_date());
    values
}

/// How an ACF image field points at its image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Url(String),
    MediaId(u64),
}

/// Interpret an ACF image field: URL string, media id, or object with `url`
pub fn image_ref(post: &PostData, field: &str) -> Option<ImageRef> {
    match post.acf_field(field)? {
        Value::String(s) if s.starts_with("http") => Some(ImageRef::Url(s.clone())),
        Value::Number(n) => n.as_u64().map(ImageRef::MediaId),
        Value::Object(obj) => obj
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(|url| ImageRef::Url(url.to_string())),
        Value::String(s) if s.is_empty() => None,
        Value::Bool(false) => None,
        other => {
            warn!("Unrecognized image field '{}': {}", field, other);
            None
        }
    }
}

/// Media ids listed in the gallery field, in order
pub fn gallery_media_ids(post: &PostData) -> Vec<u64> {
    let Some(Value::Array(items)) = post.acf_field(GALLERY_FIELD) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            Value::Object(obj) => obj.get("id").and_then(Value::as_u64),
            _ => None,
        })
        .collect()
}
