//! WordPress REST payloads for appraisal posts

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{"rendered": "..."}` wrapper WordPress uses for titles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
}

/// An appraisal post, fetched with `_fields=title,date,acf`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostData {
    #[serde(default)]
    pub title: Rendered,
    /// Site-local publish time, e.g. `2024-03-07T14:05:09`
    #[serde(default)]
    pub date: String,
    /// ACF fields; WordPress sends `[]` instead of `{}` when there are none
    #[serde(default, deserialize_with = "acf_map")]
    pub acf: Map<String, Value>,
}

impl PostData {
    /// Title with HTML entities decoded (`&#8211;` becomes `–`)
    pub fn decoded_title(&self) -> String {
        html_escape::decode_html_entities(&self.title.rendered).into_owned()
    }

    /// Publish date as `yyyy-MM-dd`, or empty when unparseable
    pub fn formatted_date(&self) -> String {
        let raw = self.date.trim();
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .map(|dt| dt.date())
            .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }

    pub fn acf_field(&self, name: &str) -> Option<&Value> {
        self.acf.get(name).filter(|v| !v.is_null())
    }
}

fn acf_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

/// `media/{id}?_fields=source_url`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Media {
    pub source_url: Option<String>,
}
