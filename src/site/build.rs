//! The `build` entry point: validate a corpus and derive its site index

use std::collections::BTreeMap;
use std::sync::Arc;

use super::index::{chronological_order, SiteIndex};
use super::plan::RenderInstruction;
use crate::config::SiteConfig;
use crate::content::{tag_slug, Corpus, Document};
use crate::error::{BuildError, BuildFailure, SourceList};

/// Aggregate a loaded corpus into a [`SiteIndex`].
///
/// Every load failure and every duplicate slug is collected; if there is at
/// least one, the whole build fails and nothing is indexed. Calling this
/// twice on the same corpus gives the same index.
pub fn build(corpus: &Corpus, config: &SiteConfig) -> Result<SiteIndex, BuildFailure> {
    let mut errors: Vec<BuildError> = corpus.failures.clone();
    errors.extend(duplicate_slugs(&corpus.documents));
    errors.extend(tag_url_conflicts(&corpus.documents));

    if !errors.is_empty() {
        tracing::debug!("Build rejected with {} error(s)", errors.len());
        return Err(BuildFailure::new(errors));
    }

    let documents: BTreeMap<String, Arc<Document>> = corpus
        .documents
        .iter()
        .map(|d| (d.slug.clone(), Arc::new(d.clone())))
        .collect();

    let mut chronological: Vec<Arc<Document>> = documents
        .values()
        .filter(|d| d.is_public())
        .cloned()
        .collect();
    chronological.sort_by(|a, b| chronological_order(a, b));

    let excluded = documents.len() - chronological.len();

    let mut by_tag: BTreeMap<String, Vec<Arc<Document>>> = BTreeMap::new();
    for doc in &chronological {
        for tag in &doc.tags {
            by_tag.entry(tag.clone()).or_default().push(Arc::clone(doc));
        }
    }

    let plan = render_plan(config, &chronological, &by_tag);

    tracing::info!(
        "Indexed {} public documents and {} tags ({} excluded)",
        chronological.len(),
        by_tag.len(),
        excluded
    );

    Ok(SiteIndex {
        documents,
        chronological,
        by_tag,
        excluded,
        plan,
    })
}

/// One error per slug shared by two or more documents
fn duplicate_slugs(documents: &[Document]) -> Vec<BuildError> {
    let mut by_slug: BTreeMap<&str, Vec<&Document>> = BTreeMap::new();
    for doc in documents {
        by_slug.entry(doc.slug.as_str()).or_default().push(doc);
    }

    by_slug
        .into_iter()
        .filter(|(_, docs)| docs.len() > 1)
        .map(|(slug, docs)| {
            let mut paths: Vec<_> = docs.iter().map(|d| d.source.clone()).collect();
            paths.sort();
            BuildError::DuplicateSlug {
                slug: slug.to_string(),
                paths: SourceList(paths),
            }
        })
        .collect()
}

/// Distinct tag labels sharing one URL (`C++` and `C#` both become `c`).
///
/// The label seen first, in source path order, owns the URL; every other
/// document using a different label for it is reported.
fn tag_url_conflicts(documents: &[Document]) -> Vec<BuildError> {
    let mut sorted: Vec<&Document> = documents.iter().collect();
    sorted.sort_by(|a, b| a.source.cmp(&b.source));

    let mut owners: BTreeMap<String, (&str, &Document)> = BTreeMap::new();
    let mut errors = Vec::new();
    for doc in sorted {
        for tag in &doc.tags {
            let (label, owner) = *owners.entry(tag_slug(tag)).or_insert((tag.as_str(), doc));
            if label != tag {
                errors.push(BuildError::malformed(
                    &doc.source,
                    format!(
                        "tag `{}` maps to the same URL as tag `{}` in `{}`",
                        tag,
                        label,
                        owner.source.display()
                    ),
                ));
            }
        }
    }
    errors
}

fn render_plan(
    config: &SiteConfig,
    chronological: &[Arc<Document>],
    by_tag: &BTreeMap<String, Vec<Arc<Document>>>,
) -> Vec<RenderInstruction> {
    let mut plan: Vec<RenderInstruction> = chronological
        .iter()
        .map(|doc| RenderInstruction::document(config, doc))
        .collect();
    plan.extend(by_tag.keys().map(|tag| RenderInstruction::tag(config, tag)));
    plan.push(RenderInstruction::chronological());
    plan.push(RenderInstruction::tag_list(config));
    if config.feed.enable {
        plan.push(RenderInstruction::feed(config));
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::RenderKind;
    use std::path::PathBuf;

    fn corpus(sources: &[(&str, &str)]) -> Corpus {
        Corpus::from_sources(
            sources
                .iter()
                .map(|(name, body)| (PathBuf::from("_posts").join(name), body.to_string())),
            &SiteConfig::default(),
        )
    }

    fn example() -> Corpus {
        corpus(&[
            ("2017-01-01-a.md", "---\ntags: [rails]\n---\nA"),
            ("2017-03-01-b.md", "---\ntags: [rails, testing]\n---\nB"),
        ])
    }

    #[test]
    fn test_example_corpus() {
        let index = build(&example(), &SiteConfig::default()).unwrap();
        assert_eq!(index.chronological_slugs(), vec!["b", "a"]);
        assert_eq!(index.tag_slugs("rails"), vec!["b", "a"]);
        assert_eq!(index.tag_slugs("testing"), vec!["b"]);
        assert_eq!(index.excluded, 0);
    }

    #[test]
    fn test_render_plan() {
        let index = build(&example(), &SiteConfig::default()).unwrap();
        let kinds: Vec<_> = index.plan.iter().map(|i| i.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                RenderKind::Document("b".to_string()),
                RenderKind::Document("a".to_string()),
                RenderKind::Tag("rails".to_string()),
                RenderKind::Tag("testing".to_string()),
                RenderKind::Chronological,
                RenderKind::TagList,
                RenderKind::Feed,
            ]
        );
    }

    #[test]
    fn test_feed_can_be_disabled() {
        let mut config = SiteConfig::default();
        config.feed.enable = false;
        let index = build(&example(), &config).unwrap();
        assert!(index.plan.iter().all(|i| i.kind != RenderKind::Feed));
    }

    #[test]
    fn test_equal_dates_order_by_slug() {
        let corpus = corpus(&[
            ("2017-01-01-zeta.md", "---\n---\n"),
            ("2017-01-01-alpha.md", "---\n---\n"),
            ("2016-12-31-older.md", "---\n---\n"),
            ("2017-01-02-newer.md", "---\n---\n"),
        ]);
        let index = build(&corpus, &SiteConfig::default()).unwrap();
        assert_eq!(
            index.chronological_slugs(),
            vec!["newer", "alpha", "zeta", "older"]
        );
    }

    #[test]
    fn test_chronological_is_newest_first() {
        let corpus = corpus(&[
            ("2015-06-01-c.md", "---\n---\n"),
            ("x.md", "---\ndate: 2018-02-01\n---\n"),
            ("2016-01-01-d.md", "---\ndate: 2014-01-01\n---\n"),
        ]);
        let index = build(&corpus, &SiteConfig::default()).unwrap();
        let dates: Vec<_> = index
            .chronological
            .iter()
            .map(|d| d.published_at.unwrap())
            .collect();
        assert!(dates.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(index.chronological_slugs(), vec!["x", "c", "d"]);
    }

    #[test]
    fn test_duplicate_slug_reported_once() {
        let corpus = corpus(&[
            ("2017-01-01-same.md", "---\n---\n"),
            ("2017-02-01-same.md", "---\n---\n"),
            ("2017-03-01-other.md", "---\n---\n"),
        ]);
        let failure = build(&corpus, &SiteConfig::default()).unwrap_err();
        assert_eq!(failure.errors.len(), 1);
        assert_eq!(failure.duplicate_slugs(), 1);
        match &failure.errors[0] {
            BuildError::DuplicateSlug { slug, paths } => {
                assert_eq!(slug, "same");
                assert_eq!(paths.0.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_slug_override_can_collide() {
        let corpus = corpus(&[
            ("2017-01-01-a.md", "---\n---\n"),
            ("2017-02-01-b.md", "---\nslug: a\n---\n"),
        ]);
        let failure = build(&corpus, &SiteConfig::default()).unwrap_err();
        assert_eq!(failure.duplicate_slugs(), 1);
    }

    #[test]
    fn test_all_failures_are_reported_together() {
        let corpus = corpus(&[
            ("2017-01-01-a.md", "no front-matter"),
            ("2017-02-30-b.md", "---\n---\n"),
            ("2017-01-01-c.md", "---\n---\n"),
            ("2017-01-02-c.md", "---\n---\n"),
        ]);
        let failure = build(&corpus, &SiteConfig::default()).unwrap_err();
        assert_eq!(failure.errors.len(), 3);
        assert!(failure
            .errors
            .iter()
            .any(|e| matches!(e, BuildError::MalformedMetadata { .. })));
        assert!(failure
            .errors
            .iter()
            .any(|e| matches!(e, BuildError::InvalidDate { .. })));
        assert_eq!(failure.duplicate_slugs(), 1);
    }

    #[test]
    fn test_unpublished_is_excluded_but_retained() {
        let corpus = corpus(&[
            ("2017-01-01-a.md", "---\ntags: [rails]\n---\n"),
            (
                "2017-03-01-b.md",
                "---\ntags: [rails, testing]\npublished: false\n---\n",
            ),
        ]);
        let index = build(&corpus, &SiteConfig::default()).unwrap();
        assert_eq!(index.chronological_slugs(), vec!["a"]);
        assert_eq!(index.tag_slugs("rails"), vec!["a"]);
        assert!(!index.by_tag.contains_key("testing"));
        assert!(index
            .by_tag
            .values()
            .all(|docs| docs.iter().all(|d| d.slug != "b")));
        assert_eq!(index.excluded, 1);
        assert!(index.get("b").is_some());
        assert!(index
            .plan
            .iter()
            .all(|i| i.kind != RenderKind::Document("b".to_string())));
    }

    #[test]
    fn test_undated_document_is_a_draft() {
        let corpus = corpus(&[("2017-01-01-a.md", "---\n---\n"), ("idea.md", "---\n---\n")]);
        let index = build(&corpus, &SiteConfig::default()).unwrap();
        assert_eq!(index.chronological_slugs(), vec!["a"]);
        assert_eq!(index.excluded, 1);
    }

    #[test]
    fn test_tag_count_matches_public_documents() {
        let corpus = corpus(&[
            ("2017-01-01-a.md", "---\ntags: [ruby]\n---\n"),
            ("2017-01-02-b.md", "---\ntags: [ruby, rails]\n---\n"),
            ("2017-01-03-c.md", "---\ntags: ruby\n---\n"),
            ("2017-01-04-d.md", "---\ntags: [ruby]\npublished: false\n---\n"),
        ]);
        let index = build(&corpus, &SiteConfig::default()).unwrap();
        assert_eq!(index.by_tag["ruby"].len(), 3);
        assert_eq!(index.by_tag["rails"].len(), 1);
    }

    #[test]
    fn test_tag_labels_are_kept_verbatim() {
        let corpus = corpus(&[
            ("2017-01-01-a.md", "---\ntags: [C++]\n---\n"),
            ("2017-01-02-b.md", "---\ntags: [C++, c-sharp]\n---\n"),
        ]);
        let index = build(&corpus, &SiteConfig::default()).unwrap();
        assert_eq!(
            index.by_tag.keys().collect::<Vec<_>>(),
            vec!["C++", "c-sharp"]
        );
        assert_eq!(index.by_tag["C++"].len(), 2);
        let tag_page = index
            .plan
            .iter()
            .find(|i| i.kind == RenderKind::Tag("C++".to_string()))
            .unwrap();
        assert_eq!(tag_page.output, PathBuf::from("tags/c/index.html"));
    }

    #[test]
    fn test_distinct_tags_sharing_a_url_fail() {
        let corpus = corpus(&[
            ("2017-01-01-a.md", "---\ntags: [C++]\n---\n"),
            ("2017-01-02-b.md", "---\ntags: [C#]\n---\n"),
            ("2017-01-03-c.md", "---\ntags: [c, ruby]\n---\n"),
        ]);
        let failure = build(&corpus, &SiteConfig::default()).unwrap_err();
        assert_eq!(failure.errors.len(), 2);
        for (err, name) in failure.errors.iter().zip(["b.md", "c.md"]) {
            match err {
                BuildError::MalformedMetadata { path, reason } => {
                    assert!(path.to_string_lossy().ends_with(name));
                    assert!(reason.contains("`C++`"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_build_is_repeatable() {
        let corpus = example();
        let config = SiteConfig::default();
        let first = build(&corpus, &config).unwrap();
        let second = build(&corpus, &config).unwrap();
        assert_eq!(first.plan, second.plan);
        assert_eq!(first.chronological_slugs(), second.chronological_slugs());
    }

    #[test]
    fn test_neighbours() {
        let corpus = corpus(&[
            ("2017-01-01-a.md", "---\n---\n"),
            ("2017-02-01-b.md", "---\n---\n"),
            ("2017-03-01-c.md", "---\n---\n"),
        ]);
        let index = build(&corpus, &SiteConfig::default()).unwrap();
        let (newer, older) = index.neighbours("b");
        assert_eq!(newer.map(|d| d.slug.as_str()), Some("c"));
        assert_eq!(older.map(|d| d.slug.as_str()), Some("a"));
        let (newer, _) = index.neighbours("c");
        assert!(newer.is_none());
    }
}
