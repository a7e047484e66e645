//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Fence that opens and closes a front-matter block
const FENCE: &str = "---";

/// Custom deserializer that handles both a whitespace-separated string and a
/// list of scalars
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(value.split_whitespace().map(str::to_string).collect())
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<serde_yaml::Value>()? {
                match scalar_to_string(&item) {
                    Some(s) => vec.push(s),
                    None => return Err(de::Error::custom("tags must be scalars")),
                }
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Accept any YAML scalar as a string (`title: 1984` is a title, not a number)
fn opt_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(v) => scalar_to_string(&v)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("expected a scalar value")),
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Front-matter data from a post
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "opt_scalar")]
    pub title: Option<String>,
    #[serde(deserialize_with = "opt_scalar")]
    pub layout: Option<String>,
    #[serde(deserialize_with = "opt_scalar")]
    pub date: Option<String>,
    #[serde(deserialize_with = "opt_scalar")]
    pub slug: Option<String>,
    #[serde(deserialize_with = "string_or_vec")]
    pub tags: Vec<String>,
    pub published: bool,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for FrontMatter {
    fn default() -> Self {
        Self {
            title: None,
            layout: None,
            date: None,
            slug: None,
            tags: Vec::new(),
            published: true,
            extra: BTreeMap::new(),
        }
    }
}

impl FrontMatter {
    /// Split a document into its front-matter block and body.
    ///
    /// The first line must be `---`; the block ends at the next line that is
    /// `---` (or `...`). Returns `(yaml, body)`.
    pub fn split(content: &str) -> Result<(&str, &str), String> {
        let content = content.trim_start_matches('\u{feff}');

        let mut lines = content.split_inclusive('\n');
        let first = lines.next().unwrap_or("");
        if first.trim_end() != FENCE {
            return Err("document must begin with a `---` front-matter block".to_string());
        }

        let yaml_start = first.len();
        let mut offset = yaml_start;
        for line in lines {
            let trimmed = line.trim_end();
            if trimmed == FENCE || trimmed == "..." {
                let yaml = &content[yaml_start..offset];
                let body = &content[offset + line.len()..];
                return Ok((yaml, body));
            }
            offset += line.len();
        }

        Err("missing closing `---` for front-matter block".to_string())
    }

    /// Parse the YAML inside a front-matter block
    pub fn parse(yaml: &str) -> Result<Self, String> {
        if yaml.trim().is_empty() {
            return Ok(FrontMatter::default());
        }
        serde_yaml::from_str::<FrontMatter>(yaml).map_err(|e| e.to_string())
    }
}

/// Parse a front-matter date into a calendar date.
///
/// Times and zone offsets are accepted but only the date as written is kept.
pub fn parse_date_string(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    let naive_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in naive_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    let zoned_formats = ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M %z"];
    for fmt in zoned_formats {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_local().date());
        }
    }

    // RFC 3339 / ISO 8601
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local().date());
    }

    None
}
