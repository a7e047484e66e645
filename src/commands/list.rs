//! List site content

use anyhow::{bail, Result};

use crate::content::Document;
use crate::site::{self, chronological_order, SiteIndex};
use crate::Site;

/// Print posts, drafts or tags of the site
pub fn run(site: &Site, kind: &str) -> Result<()> {
    let corpus = site.load();
    let index = site::build(&corpus, &site.config)?;
    println!("{}", listing(&index, kind)?);
    Ok(())
}

fn listing(index: &SiteIndex, kind: &str) -> Result<String> {
    let mut lines = Vec::new();
    match kind {
        "post" | "posts" => {
            lines.push(format!("Posts ({}):", index.chronological.len()));
            for doc in &index.chronological {
                lines.push(format!(
                    "  {} - {} [{}]",
                    doc.published_at
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_default(),
                    doc.title,
                    doc.source.display()
                ));
            }
        }
        "draft" | "drafts" => {
            let mut drafts: Vec<&Document> = index
                .documents
                .values()
                .filter(|d| !d.is_public())
                .map(|d| d.as_ref())
                .collect();
            drafts.sort_by(|a, b| chronological_order(a, b));
            lines.push(format!("Drafts ({}):", drafts.len()));
            for doc in drafts {
                let state = if doc.published { "undated" } else { "unpublished" };
                lines.push(format!(
                    "  {} ({}) [{}]",
                    doc.title,
                    state,
                    doc.source.display()
                ));
            }
        }
        "tag" | "tags" => {
            let mut tags: Vec<(&String, usize)> = index
                .by_tag
                .iter()
                .map(|(tag, docs)| (tag, docs.len()))
                .collect();
            tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            lines.push(format!("Tags ({}):", tags.len()));
            for (tag, count) in tags {
                lines.push(format!("  {} ({})", tag, count));
            }
        }
        _ => bail!("Unknown type: {}. Available: posts, drafts, tags", kind),
    }
    Ok(lines.join("\n"))
}
