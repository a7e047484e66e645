//! Site configuration (_config.yml)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,

    // URL
    pub url: String,
    pub root: String,
    pub permalink: String,

    // Directory
    pub source_dir: String,
    pub posts_dir: String,
    pub layouts_dir: String,
    pub public_dir: String,
    pub tag_dir: String,

    // Writing
    pub default_layout: String,
    pub date_format: String,
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Feed
    #[serde(default)]
    pub feed: FeedConfig,

    // Build
    pub parallel: bool,

    // Store any additional fields for templates
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "My Blog".to_string(),
            description: String::new(),
            author: String::new(),
            language: "en".to_string(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),
            permalink: ":year/:month/:day/:slug/".to_string(),

            source_dir: ".".to_string(),
            posts_dir: "_posts".to_string(),
            layouts_dir: "_layouts".to_string(),
            public_dir: "_site".to_string(),
            tag_dir: "tags".to_string(),

            default_layout: "post".to_string(),
            date_format: "%B %-d, %Y".to_string(),
            highlight: HighlightConfig::default(),

            feed: FeedConfig::default(),

            parallel: true,

            extra: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make output paths collide
    pub fn validate(&self) -> Result<()> {
        if !self.permalink.contains(":slug") && !self.permalink.contains(":title") {
            bail!(
                "permalink `{}` must contain `:slug` or `:title`",
                self.permalink
            );
        }
        if self.tag_dir.trim_matches('/').is_empty() {
            bail!("tag_dir must not be empty");
        }
        Ok(())
    }
}

/// Syntax highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enable: bool,
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            theme: "base16-ocean.dark".to_string(),
            line_number: false,
        }
    }
}

/// Atom feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub enable: bool,
    pub path: String,
    pub limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enable: true,
            path: "atom.xml".to_string(),
            limit: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.posts_dir, "_posts");
        assert_eq!(config.public_dir, "_site");
        assert!(config.feed.enable);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: Test Driven
author: Test User
permalink: /blog/:slug/
feed:
  limit: 5
github_username: someone
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Test Driven");
        assert_eq!(config.author, "Test User");
        assert_eq!(config.permalink, "/blog/:slug/");
        assert_eq!(config.feed.limit, 5);
        assert_eq!(config.feed.path, "atom.xml");
        assert_eq!(
            config.extra.get("github_username").and_then(|v| v.as_str()),
            Some("someone")
        );
    }

    #[test]
    fn test_permalink_without_slug_is_rejected() {
        let config = SiteConfig {
            permalink: ":year/:month/".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_config.yml");
        fs::write(&path, "title: From Disk\nparallel: false\n").unwrap();
        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(config.title, "From Disk");
        assert!(!config.parallel);
    }
}
