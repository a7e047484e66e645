//! Clean the public directory

use anyhow::{Context, Result};
use std::fs;

use crate::Site;

/// Remove the public directory and any leftovers of an interrupted publish
pub fn run(site: &Site) -> Result<()> {
    let mut targets = vec![site.public_dir.clone()];
    if let Some(name) = site.public_dir.file_name().and_then(|n| n.to_str()) {
        for suffix in ["staging", "previous"] {
            targets.push(site.public_dir.with_file_name(format!(".{}.{}", name, suffix)));
        }
    }

    for dir in targets {
        if dir.exists() {
            fs::remove_dir_all(&dir).with_context(|| format!("Failed to delete {:?}", dir))?;
            tracing::info!("Deleted: {:?}", dir);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_removes_output_and_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        fs::create_dir_all(site.public_dir.join("2017")).unwrap();
        fs::create_dir_all(dir.path().join("._site.staging")).unwrap();
        fs::create_dir_all(dir.path().join("_posts")).unwrap();

        run(&site).unwrap();

        assert!(!site.public_dir.exists());
        assert!(!dir.path().join("._site.staging").exists());
        assert!(dir.path().join("_posts").exists());
    }

    #[test]
    fn test_clean_without_output_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert!(run(&site).is_ok());
    }
}
