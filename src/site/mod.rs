//! Site builder - orders documents, groups them by tag, and plans the output

mod build;
mod index;
mod plan;

pub use build::build;
pub use index::{chronological_order, SiteIndex};
pub use plan::{document_path, tag_path, RenderInstruction, RenderKind};
