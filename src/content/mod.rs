//! Content module - the document loader and document model

mod document;
mod frontmatter;
pub mod loader;
mod markdown;

pub use document::{normalize_tag, tag_slug, Document};
pub use frontmatter::{parse_date_string, FrontMatter};
pub use loader::{load_document, Corpus};
pub use markdown::{MarkdownRenderer, EXCERPT_MARKER};
