//! Render instructions produced by the site builder

use chrono::Datelike;
use std::path::PathBuf;

use crate::config::SiteConfig;
use crate::content::{tag_slug, Document};
use crate::helpers::output_file_for;

/// What a single output artifact shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderKind {
    /// One public document, by slug
    Document(String),
    /// Every public document carrying a tag
    Tag(String),
    /// All public documents, newest first
    Chronological,
    /// Overview of every tag
    TagList,
    /// Atom feed of the newest documents
    Feed,
}

/// One artifact to render: what it shows and where it goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderInstruction {
    pub kind: RenderKind,
    /// URL path relative to the site root, e.g. `2017/03/01/b/`
    pub path: String,
    /// Output file relative to the public directory
    pub output: PathBuf,
}

impl RenderInstruction {
    fn new(kind: RenderKind, path: String) -> Self {
        let output = PathBuf::from(output_file_for(&path));
        Self { kind, path, output }
    }

    pub fn document(config: &SiteConfig, doc: &Document) -> Self {
        Self::new(
            RenderKind::Document(doc.slug.clone()),
            document_path(config, doc),
        )
    }

    pub fn tag(config: &SiteConfig, tag: &str) -> Self {
        Self::new(RenderKind::Tag(tag.to_string()), tag_path(config, tag))
    }

    pub fn chronological() -> Self {
        Self::new(RenderKind::Chronological, String::new())
    }

    pub fn tag_list(config: &SiteConfig) -> Self {
        Self::new(
            RenderKind::TagList,
            format!("{}/", config.tag_dir.trim_matches('/')),
        )
    }

    pub fn feed(config: &SiteConfig) -> Self {
        Self::new(
            RenderKind::Feed,
            config.feed.path.trim_start_matches('/').to_string(),
        )
    }
}

/// Expand the permalink pattern for a document
pub fn document_path(config: &SiteConfig, doc: &Document) -> String {
    let mut path = config.permalink.clone();
    if let Some(date) = doc.published_at {
        // `:i_month` before `:month`, which is a substring of it
        path = path
            .replace(":i_month", &date.month().to_string())
            .replace(":i_day", &date.day().to_string())
            .replace(":year", &format!("{:04}", date.year()))
            .replace(":month", &format!("{:02}", date.month()))
            .replace(":day", &format!("{:02}", date.day()));
    }
    path.replace(":slug", &doc.slug)
        .replace(":title", &doc.slug)
        .trim_start_matches('/')
        .to_string()
}

/// URL path of a tag page
pub fn tag_path(config: &SiteConfig, tag: &str) -> String {
    format!("{}/{}/", config.tag_dir.trim_matches('/'), tag_slug(tag))
}
