//! Helper functions shared by the renderers and the feed writer

mod html;
mod url;

pub use html::*;
pub use url::*;
