//! Tera templates: built-in defaults, overridable from the layouts directory

use anyhow::{Context as _, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{Document, MarkdownRenderer};
use crate::generator::{feed, PageRenderer};
use crate::helpers::{full_url_for, url_for};
use crate::site::{document_path, tag_path, RenderInstruction, RenderKind, SiteIndex};

/// Template used when a document's layout has no template of its own
const FALLBACK_LAYOUT: &str = "post.html";

/// Template renderer with the default theme embedded in the binary
pub struct TemplateRenderer {
    tera: Tera,
    markdown: MarkdownRenderer,
    config: SiteConfig,
}

impl TemplateRenderer {
    /// Create a renderer; `*.html` files in `layouts_dir` replace or extend
    /// the built-in templates
    pub fn new(config: &SiteConfig, layouts_dir: Option<&Path>) -> Result<Self> {
        let mut tera = Tera::default();

        // Bodies are already HTML; templates escape titles explicitly
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("default/layout.html")),
            ("post.html", include_str!("default/post.html")),
            ("index.html", include_str!("default/index.html")),
            ("tag.html", include_str!("default/tag.html")),
            ("tags.html", include_str!("default/tags.html")),
        ])?;

        if let Some(dir) = layouts_dir.filter(|d| d.is_dir()) {
            let mut layouts: Vec<_> = fs::read_dir(dir)
                .with_context(|| format!("Failed to read layouts dir {:?}", dir))?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().map(|e| e == "html").unwrap_or(false))
                .collect();
            layouts.sort();

            let templates = layouts
                .iter()
                .filter_map(|p| {
                    let name = p.file_name()?.to_str()?.to_string();
                    Some((p.clone(), Some(name)))
                })
                .collect::<Vec<_>>();
            tracing::debug!("Loading {} layouts from {:?}", templates.len(), dir);
            tera.add_template_files(templates)?;
        }

        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self {
            tera,
            markdown: MarkdownRenderer::with_options(&config.highlight),
            config: config.clone(),
        })
    }

    /// Render a template with given context
    pub fn render_template(&self, template_name: &str, context: &Context) -> Result<String> {
        self.tera
            .render(template_name, context)
            .with_context(|| format!("Failed to render template {}", template_name))
    }

    /// Template for a layout name, falling back to `post.html`
    pub fn template_for_layout(&self, layout: &str) -> String {
        let name = format!("{}.html", layout);
        if self.tera.get_template_names().any(|n| n == name) {
            name
        } else {
            FALLBACK_LAYOUT.to_string()
        }
    }

    fn base_context(&self, index: &SiteIndex) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site_data(index));
        context
    }

    fn site_data(&self, index: &SiteIndex) -> SiteData {
        let config = &self.config;
        SiteData {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            language: config.language.clone(),
            url: config.url.clone(),
            home_url: url_for(config, ""),
            tags_url: url_for(config, &format!("{}/", config.tag_dir.trim_matches('/'))),
            feed_url: config
                .feed
                .enable
                .then(|| url_for(config, &config.feed.path)),
            tags: index
                .by_tag
                .iter()
                .map(|(name, docs)| TagData {
                    name: name.clone(),
                    url: url_for(config, &tag_path(config, name)),
                    count: docs.len(),
                })
                .collect(),
            extra: config.extra.clone(),
        }
    }

    fn post_data(&self, doc: &Document, with_content: bool) -> PostData {
        let config = &self.config;
        let path = document_path(config, doc);
        let (content, excerpt) = if with_content {
            let content = self.markdown.render(&doc.body);
            let excerpt = MarkdownRenderer::split_excerpt(&doc.body).map(|e| self.markdown.render(e));
            (content, excerpt)
        } else {
            (String::new(), None)
        };

        PostData {
            slug: doc.slug.clone(),
            title: doc.title.clone(),
            date: doc
                .published_at
                .map(|d| d.format(&config.date_format).to_string())
                .unwrap_or_default(),
            date_iso: doc
                .published_at
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            url: url_for(config, &path),
            permalink: full_url_for(config, &path),
            tags: doc
                .tags
                .iter()
                .map(|t| TagLink {
                    name: t.clone(),
                    url: url_for(config, &tag_path(config, t)),
                })
                .collect(),
            content,
            excerpt,
            extra: doc.extra.clone(),
        }
    }

    fn render_document(&self, slug: &str, index: &SiteIndex) -> Result<String> {
        let doc = index
            .get(slug)
            .with_context(|| format!("No document with slug `{}`", slug))?;
        let (newer, older) = index.neighbours(slug);

        let mut context = self.base_context(index);
        context.insert("page", &self.post_data(doc, true));
        context.insert("newer", &newer.map(|d| self.post_data(d, false)));
        context.insert("older", &older.map(|d| self.post_data(d, false)));

        self.render_template(&self.template_for_layout(&doc.layout), &context)
    }

    fn render_tag(&self, tag: &str, index: &SiteIndex) -> Result<String> {
        let docs = index
            .by_tag
            .get(tag)
            .with_context(|| format!("No tag `{}`", tag))?;
        let posts: Vec<PostData> = docs.iter().map(|d| self.post_data(d, false)).collect();

        let mut context = self.base_context(index);
        context.insert(
            "tag",
            &TagData {
                name: tag.to_string(),
                url: url_for(&self.config, &tag_path(&self.config, tag)),
                count: docs.len(),
            },
        );
        context.insert("posts", &posts);
        self.render_template("tag.html", &context)
    }

    fn render_chronological(&self, index: &SiteIndex) -> Result<String> {
        let posts: Vec<PostData> = index
            .chronological
            .iter()
            .map(|d| self.post_data(d, true))
            .collect();

        let mut context = self.base_context(index);
        context.insert("posts", &posts);
        self.render_template("index.html", &context)
    }
}

impl PageRenderer for TemplateRenderer {
    fn render(&self, instruction: &RenderInstruction, index: &SiteIndex) -> Result<String> {
        match &instruction.kind {
            RenderKind::Document(slug) => self.render_document(slug, index),
            RenderKind::Tag(tag) => self.render_tag(tag, index),
            RenderKind::Chronological => self.render_chronological(index),
            RenderKind::TagList => self.render_template("tags.html", &self.base_context(index)),
            RenderKind::Feed => feed::atom(index, &self.config, &self.markdown),
        }
    }
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(crate::helpers::strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    let s = s.trim();
    if s.chars().count() <= length {
        Ok(tera::Value::String(s.to_string()))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!(
            "{}{}",
            truncated.trim_end(),
            omission
        )))
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub url: String,
    pub home_url: String,
    pub tags_url: String,
    pub feed_url: Option<String>,
    pub tags: Vec<TagData>,
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub date_iso: String,
    pub url: String,
    pub permalink: String,
    pub tags: Vec<TagLink>,
    pub content: String,
    pub excerpt: Option<String>,
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagData {
    pub name: String,
    pub url: String,
    pub count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Corpus;
    use crate::site::build;
    use std::path::PathBuf;

    fn index(config: &SiteConfig) -> SiteIndex {
        let corpus = Corpus::from_sources(
            vec![
                (
                    PathBuf::from("_posts/2017-01-01-a.md"),
                    "---\ntitle: Truncation & Friends\ntags: [rails]\n---\nFirst *post*.".to_string(),
                ),
                (
                    PathBuf::from("_posts/2017-03-01-b.md"),
                    "---\ntitle: Second\ntags: [rails, testing]\n---\nIntro\n<!-- more -->\nRest"
                        .to_string(),
                ),
            ],
            config,
        );
        build(&corpus, config).unwrap()
    }

    fn render(renderer: &TemplateRenderer, index: &SiteIndex, kind: RenderKind) -> String {
        let instruction = index.plan.iter().find(|i| i.kind == kind).unwrap();
        renderer.render(instruction, index).unwrap()
    }

    #[test]
    fn test_render_document() {
        let config = SiteConfig::default();
        let index = index(&config);
        let renderer = TemplateRenderer::new(&config, None).unwrap();

        let html = render(&renderer, &index, RenderKind::Document("a".to_string()));
        assert!(html.contains("Truncation &amp; Friends"));
        assert!(html.contains("<em>post</em>"));
        assert!(html.contains(r#"href="/tags/rails/""#));
        // b is newer than a
        assert!(html.contains(r#"class="newer" href="/2017/03/01/b/""#));
        assert!(!html.contains(r#"class="older""#));
    }

    #[test]
    fn test_render_indexes() {
        let config = SiteConfig::default();
        let index = index(&config);
        let renderer = TemplateRenderer::new(&config, None).unwrap();

        let html = render(&renderer, &index, RenderKind::Chronological);
        let b = html.find("/2017/03/01/b/").unwrap();
        let a = html.find("/2017/01/01/a/").unwrap();
        assert!(b < a);
        assert!(html.contains("Read more"));

        let html = render(&renderer, &index, RenderKind::Tag("testing".to_string()));
        assert!(html.contains("#testing"));
        assert!(html.contains("Second"));
        assert!(!html.contains("Truncation"));

        let html = render(&renderer, &index, RenderKind::TagList);
        assert!(html.contains("rails</a> (2)"));
        assert!(html.contains("testing</a> (1)"));
    }

    #[test]
    fn test_custom_layout_overrides_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("note.html"),
            "NOTE: {{ page.title }} {{ site.title }}",
        )
        .unwrap();

        let config = SiteConfig::default();
        let renderer = TemplateRenderer::new(&config, Some(dir.path())).unwrap();
        assert_eq!(renderer.template_for_layout("note"), "note.html");
        assert_eq!(renderer.template_for_layout("missing"), "post.html");

        let corpus = Corpus::from_sources(
            vec![(
                PathBuf::from("_posts/2017-01-01-n.md"),
                "---\nlayout: note\ntitle: Hi\n---\n".to_string(),
            )],
            &config,
        );
        let index = build(&corpus, &config).unwrap();
        let html = render(&renderer, &index, RenderKind::Document("n".to_string()));
        assert_eq!(html, "NOTE: Hi My Blog");
    }

    #[test]
    fn test_truncate_chars_filter() {
        let mut args = HashMap::new();
        args.insert("length".to_string(), tera::Value::from(5));
        let value = truncate_chars_filter(&tera::Value::from("Hello World"), &args).unwrap();
        assert_eq!(value, tera::Value::from("Hello..."));
    }
}
