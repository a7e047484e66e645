//! postforge: a deterministic static site builder for Jekyll-style blogs
//!
//! Source documents (`_posts/YYYY-MM-DD-slug.md` with YAML front-matter) are
//! loaded into an immutable [`content::Corpus`], aggregated by
//! [`site::build`] into a [`site::SiteIndex`], and published atomically by
//! [`generator::Publisher`] using Tera templates.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod server;
pub mod site;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// A site rooted at a directory, with its configuration resolved
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Source directory (static assets live here)
    pub source_dir: PathBuf,
    /// Posts directory
    pub posts_dir: PathBuf,
    /// Custom layouts directory
    pub layouts_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Site {
    /// Create a site from a directory, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir);
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a site with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let source_dir = base_dir.join(&config.source_dir);
        let posts_dir = source_dir.join(&config.posts_dir);
        let layouts_dir = source_dir.join(&config.layouts_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            source_dir,
            posts_dir,
            layouts_dir,
            public_dir,
        }
    }

    /// Path of the config file
    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join("_config.yml")
    }

    /// Load every source document
    pub fn load(&self) -> content::Corpus {
        content::Corpus::load(&self.posts_dir, &self.config)
    }

    /// Build and publish the site
    pub fn build(&self) -> Result<generator::PublishReport> {
        commands::build::run(self)
    }

    /// Remove the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new post
    pub fn new_post(&self, title: &str, draft: bool) -> Result<PathBuf> {
        commands::new::create_post(self, title, draft)
    }
}
