//! Site index - the derived, read-only view over one build's documents

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::plan::RenderInstruction;
use crate::content::Document;

/// Derived aggregate of a successful build.
///
/// Recomputed from scratch on every build; never updated in place.
#[derive(Debug, Clone)]
pub struct SiteIndex {
    /// Every loaded document, including unpublished ones, by slug
    pub documents: BTreeMap<String, Arc<Document>>,
    /// Public documents, newest first
    pub chronological: Vec<Arc<Document>>,
    /// Public documents per tag, in chronological order
    pub by_tag: BTreeMap<String, Vec<Arc<Document>>>,
    /// Documents left out of public output (unpublished or undated)
    pub excluded: usize,
    /// Artifacts to render, in a stable order
    pub plan: Vec<RenderInstruction>,
}

impl SiteIndex {
    pub fn get(&self, slug: &str) -> Option<&Arc<Document>> {
        self.documents.get(slug)
    }

    /// Slugs of `chronological`, mostly for assertions and listings
    pub fn chronological_slugs(&self) -> Vec<&str> {
        self.chronological.iter().map(|d| d.slug.as_str()).collect()
    }

    pub fn tag_slugs(&self, tag: &str) -> Vec<&str> {
        self.by_tag
            .get(tag)
            .map(|docs| docs.iter().map(|d| d.slug.as_str()).collect())
            .unwrap_or_default()
    }

    /// Neighbours of a document in `chronological`: (newer, older)
    pub fn neighbours(&self, slug: &str) -> (Option<&Arc<Document>>, Option<&Arc<Document>>) {
        match self.chronological.iter().position(|d| d.slug == slug) {
            Some(pos) => (
                pos.checked_sub(1).and_then(|i| self.chronological.get(i)),
                self.chronological.get(pos + 1),
            ),
            None => (None, None),
        }
    }

    /// Newest publication date among public documents
    pub fn last_published(&self) -> Option<chrono::NaiveDate> {
        self.chronological.first().and_then(|d| d.published_at)
    }
}

/// Newest first; equal dates fall back to slug ascending
pub fn chronological_order(a: &Document, b: &Document) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| a.slug.cmp(&b.slug))
}
