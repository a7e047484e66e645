//! Generator module - renders a site index and publishes it atomically
//!
//! Output is rendered into a staging directory next to the public directory.
//! Only when every artifact has been written is the staging directory swapped
//! in; a failed build leaves the previous output untouched.

pub mod feed;

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::site::{RenderInstruction, SiteIndex};

/// Turns one render instruction into the bytes of its artifact
pub trait PageRenderer: Sync {
    fn render(&self, instruction: &RenderInstruction, index: &SiteIndex) -> Result<String>;
}

/// Summary of a successful publish
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub pages: usize,
    pub assets: usize,
}

/// Writes rendered artifacts and static assets into the public directory
pub struct Publisher {
    public_dir: PathBuf,
    assets_dir: Option<PathBuf>,
}

impl Publisher {
    pub fn new<P: AsRef<Path>>(public_dir: P) -> Self {
        Self {
            public_dir: public_dir.as_ref().to_path_buf(),
            assets_dir: None,
        }
    }

    /// Copy static files from `dir` alongside the rendered pages
    pub fn with_assets<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.assets_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Render every instruction of `index` and swap the result into place
    pub fn publish<R: PageRenderer>(&self, index: &SiteIndex, renderer: &R) -> Result<PublishReport> {
        let staging = self.sibling_dir("staging")?;
        let assets = match &self.assets_dir {
            Some(dir) => self.collect_assets(dir, &staging),
            None => Vec::new(),
        };
        check_unique_outputs(&index.plan, &assets)?;

        if staging.exists() {
            fs::remove_dir_all(&staging)
                .with_context(|| format!("Failed to remove stale staging dir {:?}", staging))?;
        }
        fs::create_dir_all(&staging)?;

        match self.write_all(index, renderer, &assets, &staging) {
            Ok(report) => {
                self.swap_in(&staging)?;
                tracing::info!(
                    "Published {} pages and {} assets to {:?}",
                    report.pages,
                    report.assets,
                    self.public_dir
                );
                Ok(report)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&staging) {
                    tracing::warn!("Failed to remove staging dir {:?}: {}", staging, cleanup);
                }
                Err(e)
            }
        }
    }

    fn write_all<R: PageRenderer>(
        &self,
        index: &SiteIndex,
        renderer: &R,
        assets: &[Asset],
        staging: &Path,
    ) -> Result<PublishReport> {
        for asset in assets {
            let dest = staging.join(&asset.output);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&asset.source, &dest)
                .with_context(|| format!("Failed to copy {:?}", asset.source))?;
        }

        let rendered: Vec<(&RenderInstruction, String)> = index
            .plan
            .par_iter()
            .map(|instruction| {
                renderer
                    .render(instruction, index)
                    .with_context(|| format!("Failed to render {:?}", instruction.output))
                    .map(|html| (instruction, html))
            })
            .collect::<Result<_>>()?;

        for (instruction, html) in &rendered {
            let output_path = staging.join(&instruction.output);
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create dir {:?}", parent))?;
            }
            fs::write(&output_path, html)
                .with_context(|| format!("Failed to write {:?}", output_path))?;
            tracing::debug!("Generated: {:?}", instruction.output);
        }

        Ok(PublishReport {
            pages: rendered.len(),
            assets: assets.len(),
        })
    }

    /// Static assets (images, css, ...) in the source directory.
    ///
    /// Skips markdown, anything under a `_` or `.` prefixed directory or file,
    /// and the output directories themselves.
    fn collect_assets(&self, source_dir: &Path, staging: &Path) -> Vec<Asset> {
        let walker = WalkDir::new(source_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !(e.file_name().to_string_lossy().starts_with(['_', '.'])
                        || e.path() == self.public_dir
                        || e.path() == staging)
            });

        walker
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter(|e| {
                let ext = e.path().extension().and_then(|e| e.to_str());
                !matches!(ext, Some("md") | Some("markdown"))
            })
            .filter_map(|e| {
                let output = e.path().strip_prefix(source_dir).ok()?.to_path_buf();
                Some(Asset {
                    source: e.into_path(),
                    output,
                })
            })
            .collect()
    }

    /// Replace the public directory with the fully written staging directory
    fn swap_in(&self, staging: &Path) -> Result<()> {
        let previous = self.sibling_dir("previous")?;
        if previous.exists() {
            fs::remove_dir_all(&previous)?;
        }
        if self.public_dir.exists() {
            fs::rename(&self.public_dir, &previous)
                .with_context(|| format!("Failed to move aside {:?}", self.public_dir))?;
        }
        fs::rename(staging, &self.public_dir)
            .with_context(|| format!("Failed to move {:?} into place", staging))?;
        if previous.exists() {
            fs::remove_dir_all(&previous)?;
        }
        Ok(())
    }

    /// `.<public>.<suffix>` next to the public directory
    fn sibling_dir(&self, suffix: &str) -> Result<PathBuf> {
        let name = self
            .public_dir
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Invalid public dir {:?}", self.public_dir))?;
        Ok(self.public_dir.with_file_name(format!(".{}.{}", name, suffix)))
    }
}

/// A static file copied verbatim into the output
struct Asset {
    source: PathBuf,
    /// Path relative to the public directory
    output: PathBuf,
}

/// Two outputs at the same path would silently drop one of them
fn check_unique_outputs(plan: &[RenderInstruction], assets: &[Asset]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for asset in assets {
        seen.insert(asset.output.as_path());
    }
    for instruction in plan {
        if !seen.insert(instruction.output.as_path()) {
            bail!(
                "Two outputs would be written to {:?}; check `permalink`, `tag_dir` and static files",
                instruction.output
            );
        }
    }
    Ok(())
}
