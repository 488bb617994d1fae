//! Page models

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use super::block::Block;
use super::rich_text::plain_text;
use crate::helpers::parse_timestamp;

/// Page metadata without its body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    /// CMS identifier
    pub id: String,

    /// URL-friendly name
    pub slug: String,

    /// Page title
    pub title: String,

    /// Short description used for listings and meta tags
    #[serde(default)]
    pub description: String,

    /// Creation timestamp as delivered by the CMS
    pub created: String,

    /// Cover image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,

    /// Page tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Whether the page is published
    #[serde(default = "default_published")]
    pub published: bool,
}

/// Pages are published unless marked otherwise
fn default_published() -> bool {
    true
}

/// A page with its content blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(flatten)]
    pub summary: PageSummary,

    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Page {
    /// Description from metadata, or the first paragraph when it is empty
    pub fn description(&self) -> String {
        if !self.summary.description.is_empty() {
            return self.summary.description.clone();
        }

        self.blocks
            .iter()
            .find_map(|block| match block {
                Block::Paragraph(text) if !text.is_empty() => Some(plain_text(text)),
                _ => None,
            })
            .unwrap_or_default()
    }
}

/// Keep published pages, newest first.
///
/// Timestamps are compared as instants; pages whose `created` does not
/// parse go last, in source order.
pub fn published_newest_first(mut pages: Vec<PageSummary>) -> Vec<PageSummary> {
    pages.retain(|p| p.published);
    pages.sort_by_cached_key(|p| Reverse(parse_timestamp(&p.created).ok()));
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::rich_text::RichTextSpan;

    fn summary(slug: &str, created: &str, published: bool) -> PageSummary {
        PageSummary {
            id: slug.to_string(),
            slug: slug.to_string(),
            title: slug.to_string(),
            description: String::new(),
            created: created.to_string(),
            cover: None,
            tags: Vec::new(),
            published,
        }
    }

    #[test]
    fn test_parse_page() {
        let json = r#"{
            "id": "abc",
            "slug": "hello-world",
            "title": "Hello World",
            "created": "2024-01-15T10:30:00.000Z",
            "blocks": [
                {"type": "paragraph", "paragraph": {"rich_text": [{"plain_text": "Hi"}]}}
            ]
        }"#;
        let page: Page = serde_json::from_str(json).unwrap();
        assert_eq!(page.summary.slug, "hello-world");
        assert!(page.summary.published);
        assert_eq!(page.blocks.len(), 1);
        assert_eq!(page.description(), "Hi");
    }

    #[test]
    fn test_description_prefers_metadata() {
        let mut page = Page {
            summary: summary("a", "2024-01-01", true),
            blocks: vec![Block::Paragraph(vec![RichTextSpan::plain("body")])],
        };
        page.summary.description = "Explicit".to_string();
        assert_eq!(page.description(), "Explicit");
    }

    #[test]
    fn test_published_newest_first() {
        let pages = vec![
            summary("old", "2023-05-01T00:00:00.000Z", true),
            summary("draft", "2024-06-01T00:00:00.000Z", false),
            summary("new", "2024-02-01T00:00:00.000Z", true),
        ];
        let sorted = published_newest_first(pages);
        let slugs: Vec<_> = sorted.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["new", "old"]);
    }

    #[test]
    fn test_newest_first_compares_instants() {
        let pages = vec![
            summary("utc", "2024-01-16T01:00:00Z", true),
            summary("offset", "2024-01-15T23:00:00-05:00", true),
            summary("bare", "2024-01-16", true),
            summary("morning", "2024-01-16T10:00:00.000Z", true),
            summary("garbled", "sometime in 2025", true),
        ];
        let sorted = published_newest_first(pages);
        let slugs: Vec<_> = sorted.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["morning", "offset", "utc", "bare", "garbled"]);
    }
}
