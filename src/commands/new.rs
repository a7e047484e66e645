//! Create a new post

use anyhow::{bail, Result};
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

use crate::Site;

const DEFAULT_SCAFFOLD: &str = "---\ntitle: \"{{ title }}\"\ndate: {{ date }}\ntags: []\n---\n";
const DEFAULT_DRAFT_SCAFFOLD: &str = "---\ntitle: \"{{ title }}\"\ntags: []\n---\n";

/// Create a new post dated today, or an undated draft
pub fn create_post(site: &Site, title: &str, draft: bool) -> Result<PathBuf> {
    let today = chrono::Local::now().date_naive();
    create_post_on(site, title, draft, today)
}

fn create_post_on(site: &Site, title: &str, draft: bool, date: NaiveDate) -> Result<PathBuf> {
    let slug = slug::slugify(title);
    if slug.is_empty() {
        bail!("Cannot derive a slug from title {:?}", title);
    }

    let filename = if draft {
        format!("{}.md", slug)
    } else {
        format!("{}-{}.md", date.format("%Y-%m-%d"), slug)
    };
    let file_path = site.posts_dir.join(filename);
    if file_path.exists() {
        bail!("File already exists: {:?}", file_path);
    }

    // A scaffold may override the default front-matter
    let layout = if draft { "draft" } else { "post" };
    let scaffold_path = site.base_dir.join("scaffolds").join(format!("{}.md", layout));
    let scaffold = if scaffold_path.exists() {
        fs::read_to_string(&scaffold_path)?
    } else if draft {
        DEFAULT_DRAFT_SCAFFOLD.to_string()
    } else {
        DEFAULT_SCAFFOLD.to_string()
    };

    let content = scaffold
        .replace("{{ title }}", &title.replace('"', "\\\""))
        .replace("{{ date }}", &date.format("%Y-%m-%d").to_string());

    fs::create_dir_all(&site.posts_dir)?;
    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}
