//! Build the site, once or on every change

use anyhow::Result;
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebouncedEvent};
use std::path::Path;
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

use crate::generator::{PublishReport, Publisher};
use crate::site;
use crate::templates::TemplateRenderer;
use crate::Site;

/// Load, validate, render and publish the whole site
pub fn run(site: &Site) -> Result<PublishReport> {
    let start = Instant::now();

    let corpus = site.load();
    tracing::info!("Loaded {} source files", corpus.len());

    let index = site::build(&corpus, &site.config)?;

    let renderer = TemplateRenderer::new(&site.config, Some(&site.layouts_dir))?;
    let report = Publisher::new(&site.public_dir)
        .with_assets(&site.source_dir)
        .publish(&index, &renderer)?;

    tracing::info!("Built in {:.2}s", start.elapsed().as_secs_f64());
    Ok(report)
}

/// Watch sources, layouts and config; rebuild after each burst of changes.
///
/// Blocks until the watcher channel closes. `on_rebuilt` runs after every
/// successful rebuild.
pub fn watch(site: &Site, mut on_rebuilt: impl FnMut()) -> Result<()> {
    let (tx, rx) = channel();

    // Debounce to avoid multiple rapid rebuilds
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;

    if site.source_dir.exists() {
        debouncer
            .watcher()
            .watch(&site.source_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", site.source_dir);
    }

    let config_path = site.config_path();
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant: Vec<&DebouncedEvent> = events
                    .iter()
                    .filter(|e| is_relevant(site, &e.path))
                    .collect();
                if relevant.is_empty() {
                    continue;
                }

                for event in &relevant {
                    tracing::info!("File changed: {}", event.path.display());
                }

                match rebuild(site) {
                    Ok(_) => on_rebuilt(),
                    Err(e) => tracing::error!("Build failed: {:#}", e),
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(_) => break,
        }
    }

    Ok(())
}

/// Re-read `_config.yml` so edits to it take effect, then build
fn rebuild(site: &Site) -> Result<PublishReport> {
    if site.config_path().exists() {
        run(&Site::new(&site.base_dir)?)
    } else {
        run(site)
    }
}

/// Ignore our own output and editor or VCS noise
fn is_relevant(site: &Site, path: &Path) -> bool {
    if path.starts_with(&site.public_dir) {
        return false;
    }
    let relative = path.strip_prefix(&site.base_dir).unwrap_or(path);
    let hidden = relative.components().any(|c| {
        c.as_os_str()
            .to_str()
            .map(|s| s.starts_with('.') && s != "." && s != "..")
            .unwrap_or(true)
    });
    let backup = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.ends_with('~'))
        .unwrap_or(true);
    !hidden && !backup
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_run_builds_site() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("_posts")).unwrap();
        fs::write(
            dir.path().join("_posts/2017-01-01-hello.md"),
            "---\ntitle: Hello\n---\nHi\n",
        )
        .unwrap();

        let site = Site::new(dir.path()).unwrap();
        let report = run(&site).unwrap();
        assert_eq!(report.pages, 4);
        assert!(dir.path().join("_site/2017/01/01/hello/index.html").is_file());
    }

    #[test]
    fn test_rebuild_picks_up_config_changes() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("_posts")).unwrap();
        fs::write(
            dir.path().join("_posts/2017-01-01-hello.md"),
            "---\ntitle: Hello\n---\nHi\n",
        )
        .unwrap();
        fs::write(dir.path().join("_config.yml"), "title: Old\n").unwrap();

        let site = Site::new(dir.path()).unwrap();
        run(&site).unwrap();
        assert!(dir.path().join("_site/2017/01/01/hello/index.html").is_file());

        fs::write(
            dir.path().join("_config.yml"),
            "title: New\npermalink: posts/:slug/\n",
        )
        .unwrap();
        rebuild(&site).unwrap();
        let page = dir.path().join("_site/posts/hello/index.html");
        assert!(fs::read_to_string(page).unwrap().contains("New"));
        assert!(!dir.path().join("_site/2017").exists());

        // A broken config fails the rebuild and keeps the last output
        fs::write(dir.path().join("_config.yml"), "permalink: [\n").unwrap();
        assert!(rebuild(&site).is_err());
        assert!(dir.path().join("_site/posts/hello/index.html").is_file());
    }

    #[test]
    fn test_is_relevant() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert!(is_relevant(&site, &dir.path().join("_posts/2017-01-01-a.md")));
        assert!(!is_relevant(&site, &dir.path().join("_site/index.html")));
        assert!(!is_relevant(&site, &dir.path().join("._site.staging/index.html")));
        assert!(!is_relevant(&site, &dir.path().join("_posts/a.md~")));
        assert!(!is_relevant(&site, &dir.path().join(".git/HEAD")));
    }
}
