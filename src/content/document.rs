//! Document model

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// One validated source document.
///
/// Created once per source file by the loader and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Unique identifier, derived from the filename unless overridden
    pub slug: String,

    /// Title from front-matter, falling back to the slug
    pub title: String,

    /// Layout template to use
    pub layout: String,

    /// Publication date; `None` marks a draft
    pub published_at: Option<NaiveDate>,

    /// Tag labels, trimmed but otherwise as written
    pub tags: BTreeSet<String>,

    /// Unpublished documents stay in the model but are never rendered
    pub published: bool,

    /// Raw body text, handed untouched to the renderer
    pub body: String,

    /// Source file path
    pub source: PathBuf,

    /// Front-matter keys outside the known schema
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Document {
    /// Whether the document belongs in public output
    pub fn is_public(&self) -> bool {
        self.published && self.published_at.is_some()
    }

    /// Whether the document has no publication date yet
    pub fn is_draft(&self) -> bool {
        self.published_at.is_none()
    }
}

/// Trim a raw tag label; `None` if it is blank or has no URL-safe form
pub fn normalize_tag(raw: &str) -> Option<String> {
    let label = raw.trim();
    if label.is_empty() || tag_slug(label).is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

/// URL segment of a tag label. Distinct labels may share one.
pub fn tag_slug(label: &str) -> String {
    slug::slugify(label)
}
