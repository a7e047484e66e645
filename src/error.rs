//! Build error taxonomy
//!
//! Every failure the core can report about a corpus is a [`BuildError`].
//! Errors are collected across the whole corpus and surfaced together as a
//! [`BuildFailure`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// A single problem found while loading or aggregating documents
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// Front-matter is missing, unterminated, or does not match the schema
    #[error("malformed front-matter in `{}`: {reason}", .path.display())]
    MalformedMetadata { path: PathBuf, reason: String },

    /// Two or more documents resolve to the same slug
    #[error("duplicate slug `{slug}` used by {paths}")]
    DuplicateSlug { slug: String, paths: SourceList },

    /// A publication date that is not a valid calendar date
    #[error("invalid date `{value}` in `{}`", .path.display())]
    InvalidDate { path: PathBuf, value: String },

    /// The source file could not be read
    #[error("IO error when reading `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl BuildError {
    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedMetadata {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn invalid_date(path: &Path, value: impl Into<String>) -> Self {
        Self::InvalidDate {
            path: path.to_path_buf(),
            value: value.into(),
        }
    }

    /// Path used to order errors in reports
    pub fn sort_key(&self) -> (&Path, u8) {
        match self {
            Self::MalformedMetadata { path, .. } => (path.as_path(), 0),
            Self::InvalidDate { path, .. } => (path.as_path(), 1),
            Self::Io { path, .. } => (path.as_path(), 2),
            Self::DuplicateSlug { paths, .. } => (
                paths.0.first().map(PathBuf::as_path).unwrap_or(Path::new("")),
                3,
            ),
        }
    }
}

/// Source files sharing one slug, in path order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceList(pub Vec<PathBuf>);

impl fmt::Display for SourceList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, path) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "`{}`", path.display())?;
        }
        Ok(())
    }
}

/// All errors found in one build; the build fails if this is non-empty
#[derive(Debug, Clone)]
pub struct BuildFailure {
    pub errors: Vec<BuildError>,
}

impl BuildFailure {
    pub fn new(mut errors: Vec<BuildError>) -> Self {
        errors.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self { errors }
    }

    /// Number of `DuplicateSlug` errors in the report
    pub fn duplicate_slugs(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| matches!(e, BuildError::DuplicateSlug { .. }))
            .count()
    }
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "build failed with {} error(s)", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n  - {}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for BuildFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BuildError::malformed(Path::new("_posts/a.md"), "missing closing `---`");
        let display = format!("{err}");
        assert!(display.contains("_posts/a.md"));
        assert!(display.contains("missing closing"));

        let err = BuildError::DuplicateSlug {
            slug: "hello".to_string(),
            paths: SourceList(vec![PathBuf::from("x.md"), PathBuf::from("y.md")]),
        };
        assert_eq!(
            format!("{err}"),
            "duplicate slug `hello` used by `x.md`, `y.md`"
        );
    }

    #[test]
    fn test_failure_lists_every_error_in_path_order() {
        let failure = BuildFailure::new(vec![
            BuildError::invalid_date(Path::new("b.md"), "2017-02-30"),
            BuildError::malformed(Path::new("a.md"), "no front-matter"),
        ]);
        let display = failure.to_string();
        assert!(display.starts_with("build failed with 2 error(s)"));
        let a = display.find("a.md").unwrap();
        let b = display.find("b.md").unwrap();
        assert!(a < b);
        assert_eq!(failure.duplicate_slugs(), 0);
    }
}
