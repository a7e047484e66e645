//! Atom feed

use anyhow::{Context, Result};
use atom_syndication::{Category, Content, Entry, Feed, Link, Person};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

use crate::config::SiteConfig;
use crate::content::{Document, MarkdownRenderer, EXCERPT_MARKER};
use crate::helpers::{absolutize_urls, full_url_for, strip_invalid_xml_chars};
use crate::site::{document_path, SiteIndex};

/// Render the Atom feed for the newest public documents.
///
/// Timestamps come from publication dates only, so the same corpus always
/// produces the same feed.
pub fn atom(index: &SiteIndex, config: &SiteConfig, markdown: &MarkdownRenderer) -> Result<String> {
    let home = full_url_for(config, "");

    let mut feed = Feed::default();
    feed.set_title(config.title.clone());
    feed.set_id(home.clone());
    feed.set_links(vec![
        link(full_url_for(config, &config.feed.path), "self"),
        link(home, "alternate"),
    ]);
    if let Some(updated) = index.last_published().or_else(epoch).and_then(midnight_utc) {
        feed.set_updated(updated);
    }
    if !config.author.is_empty() {
        let mut author = Person::default();
        author.set_name(config.author.clone());
        feed.set_authors(vec![author]);
    }

    let entries: Vec<Entry> = index
        .chronological
        .iter()
        .take(config.feed.limit)
        .map(|doc| entry(doc, config, markdown))
        .collect();
    feed.set_entries(entries);

    let xml = feed
        .write_to(Vec::new())
        .context("Failed to write Atom feed")?;
    String::from_utf8(xml).context("Atom feed is not valid UTF-8")
}

fn entry(doc: &Document, config: &SiteConfig, markdown: &MarkdownRenderer) -> Entry {
    let url = full_url_for(config, &document_path(config, doc));
    let date = doc.published_at.and_then(midnight_utc);

    let body = doc
        .body
        .find(EXCERPT_MARKER)
        .map(|pos| &doc.body[..pos])
        .unwrap_or(&doc.body);
    let html = absolutize_urls(&markdown.render(body), config.url.trim_end_matches('/'));
    let mut content = Content::default();
    content.set_content_type(Some("html".to_string()));
    content.set_value(Some(strip_invalid_xml_chars(&html)));

    let mut entry = Entry::default();
    entry.set_title(doc.title.clone());
    entry.set_id(url.clone());
    entry.set_links(vec![link(url, "alternate")]);
    if let Some(date) = date {
        entry.set_updated(date);
    }
    entry.set_published(date);
    entry.set_categories(
        doc.tags
            .iter()
            .map(|tag| {
                let mut category = Category::default();
                category.set_term(tag.clone());
                category
            })
            .collect::<Vec<_>>(),
    );
    entry.set_content(Some(content));
    entry
}

fn link(href: String, rel: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel(rel.to_string());
    link
}

fn epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)
}

fn midnight_utc(date: NaiveDate) -> Option<DateTime<FixedOffset>> {
    let naive = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&naive).into())
}
