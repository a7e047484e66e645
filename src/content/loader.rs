//! Content loader - turns source files into documents

use chrono::NaiveDate;
use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use super::document::{normalize_tag, tag_slug};
use super::frontmatter::parse_date_string;
use super::{Document, FrontMatter};
use crate::config::SiteConfig;
use crate::error::BuildError;

lazy_static! {
    /// `YYYY-MM-DD-name`, the Jekyll post filename convention
    static ref DATED_NAME: Regex = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})-(.+)$").unwrap();
}

/// Load a single document from its path and raw contents.
///
/// Pure: reads nothing from disk and touches no shared state.
pub fn load_document(
    path: &Path,
    contents: &str,
    config: &SiteConfig,
) -> Result<Document, BuildError> {
    let (yaml, body) =
        FrontMatter::split(contents).map_err(|reason| BuildError::malformed(path, reason))?;
    let fm = FrontMatter::parse(yaml).map_err(|reason| BuildError::malformed(path, reason))?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| BuildError::malformed(path, "file name is not valid UTF-8"))?;
    let (file_date, name) = split_file_name(stem).map_err(|v| BuildError::invalid_date(path, v))?;

    // Front-matter date wins over the filename prefix
    let published_at = match fm.date.as_deref() {
        Some(raw) => {
            Some(parse_date_string(raw).ok_or_else(|| BuildError::invalid_date(path, raw))?)
        }
        None => file_date,
    };

    let slug = slug::slugify(fm.slug.as_deref().unwrap_or(name));
    if slug.is_empty() {
        return Err(BuildError::malformed(path, "slug resolves to an empty string"));
    }

    let mut tags = BTreeSet::new();
    let mut tag_urls: BTreeMap<String, String> = BTreeMap::new();
    for raw in &fm.tags {
        let tag = normalize_tag(raw)
            .ok_or_else(|| BuildError::malformed(path, format!("empty tag `{}`", raw)))?;
        if let Some(other) = tag_urls.insert(tag_slug(&tag), tag.clone()) {
            if other != tag {
                return Err(BuildError::malformed(
                    path,
                    format!("tags `{}` and `{}` map to the same URL", other, tag),
                ));
            }
        }
        tags.insert(tag);
    }

    Ok(Document {
        title: fm.title.unwrap_or_else(|| slug.clone()),
        slug,
        layout: fm
            .layout
            .unwrap_or_else(|| config.default_layout.clone()),
        published_at,
        tags,
        published: fm.published,
        body: body.to_string(),
        source: path.to_path_buf(),
        extra: fm.extra,
    })
}

/// Split `2017-01-01-name` into its date and name.
///
/// A prefix shaped like a date that is not a real calendar date is an error
/// carrying the offending value.
fn split_file_name(stem: &str) -> Result<(Option<NaiveDate>, &str), String> {
    let Some(caps) = DATED_NAME.captures(stem) else {
        return Ok((None, stem));
    };

    let field = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();
    let date = NaiveDate::from_ymd_opt(
        field(1).parse().unwrap_or(0),
        field(2).parse().unwrap_or(0),
        field(3).parse().unwrap_or(0),
    )
    .ok_or_else(|| format!("{}-{}-{}", field(1), field(2), field(3)))?;

    let name = caps.get(4).map(|m| m.as_str()).unwrap_or(stem);
    Ok((Some(date), name))
}

/// All documents of one build, plus every failure found while loading them
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub documents: Vec<Document>,
    pub failures: Vec<BuildError>,
}

impl Corpus {
    /// Load every markdown file under `dir`
    pub fn load(dir: &Path, config: &SiteConfig) -> Self {
        if !dir.exists() {
            tracing::warn!("Posts directory {:?} does not exist", dir);
            return Self::default();
        }

        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && is_markdown_file(p) && !is_hidden(p))
            .collect();
        files.sort();

        tracing::debug!("Found {} source files in {:?}", files.len(), dir);

        let results: Vec<Result<Document, BuildError>> = if config.parallel {
            files.par_iter().map(|p| load_file(p, config)).collect()
        } else {
            files.iter().map(|p| load_file(p, config)).collect()
        };

        Self::from_results(results)
    }

    /// Build a corpus from in-memory `(path, contents)` pairs
    pub fn from_sources<I>(sources: I, config: &SiteConfig) -> Self
    where
        I: IntoIterator<Item = (PathBuf, String)>,
    {
        let mut sources: Vec<_> = sources.into_iter().collect();
        sources.sort_by(|a, b| a.0.cmp(&b.0));
        Self::from_results(
            sources
                .iter()
                .map(|(path, contents)| load_document(path, contents, config))
                .collect(),
        )
    }

    fn from_results(results: Vec<Result<Document, BuildError>>) -> Self {
        let mut corpus = Self::default();
        for result in results {
            match result {
                Ok(doc) => corpus.documents.push(doc),
                Err(e) => corpus.failures.push(e),
            }
        }
        corpus
    }

    pub fn len(&self) -> usize {
        self.documents.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn load_file(path: &Path, config: &SiteConfig) -> Result<Document, BuildError> {
    let contents = fs::read_to_string(path).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source: Arc::new(source),
    })?;
    load_document(path, &contents, config)
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}
