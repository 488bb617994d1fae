//! Generator module - renders pages from a content source to HTML

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::content::{
    build_likes_sections, group_blocks, published_newest_first, ContentSource, Page, PageSummary,
};
use crate::error::FetchError;
use crate::helpers::{
    date_xml, feed_tag, format_post_date, full_url_for, html_escape, meta_generator,
    parse_timestamp, post_path, time_tag, truncate, url_for,
};
use crate::render::{self, probe_media, BlockRenderer, CodeHighlighter, MediaProbe};
use crate::seo::{MetaKind, PageMeta, MAX_DESCRIPTION_LEN};
use crate::Blog;

/// Summary of a generation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub posts: usize,
    pub likes_sections: usize,
}

/// Renders pages, listings and the feed
pub struct Generator {
    config: SiteConfig,
    public_dir: PathBuf,
    source: Arc<dyn ContentSource>,
    probe: Arc<dyn MediaProbe>,
    highlighter: Arc<CodeHighlighter>,
    tz: Tz,
}

impl Generator {
    /// Create a generator for a site
    pub fn new(blog: &Blog) -> Result<Self> {
        Self::with_parts(
            blog.config.clone(),
            blog.public_dir.clone(),
            blog.source(),
            blog.probe()?,
            Arc::new(blog.highlighter()),
        )
    }

    /// Create a generator from explicit collaborators
    pub fn with_parts(
        config: SiteConfig,
        public_dir: PathBuf,
        source: Arc<dyn ContentSource>,
        probe: Arc<dyn MediaProbe>,
        highlighter: Arc<CodeHighlighter>,
    ) -> Result<Self> {
        let tz = config.tz()?;
        Ok(Self {
            config,
            public_dir,
            source,
            probe,
            highlighter,
            tz,
        })
    }

    /// Render every page and listing to the public directory
    pub async fn generate(&self) -> Result<GenerateStats> {
        tokio::fs::create_dir_all(&self.public_dir)
            .await
            .with_context(|| format!("Failed to create {:?}", self.public_dir))?;

        let summaries = published_newest_first(self.source.list_pages().await?);
        tracing::info!("Rendering {} pages", summaries.len());

        let mut rendered = Vec::with_capacity(summaries.len());
        for summary in &summaries {
            let page = self.source.fetch_page(&summary.slug).await?;
            let body = self
                .render_body(&page)
                .await
                .with_context(|| format!("Failed to render page `{}`", summary.slug))?;
            let html = self.layout(&self.post_meta(&page), &self.article(&page, &body)?);

            let output_path = self.post_dir(&summary.slug)?.join("index.html");
            write_file(&output_path, &html).await?;
            tracing::debug!("Generated post: {:?}", output_path);

            rendered.push((page, body));
        }

        let index = self.index_html(&summaries)?;
        write_file(&self.public_dir.join("index.html"), &index).await?;

        let mut stats = GenerateStats {
            posts: rendered.len(),
            likes_sections: 0,
        };
        if let Some((sections, html)) = self.likes_html().await {
            write_file(&self.public_dir.join("likes").join("index.html"), &html).await?;
            stats.likes_sections = sections;
        }

        let feed = self.atom_feed(&rendered)?;
        write_file(&self.public_dir.join("atom.xml"), &feed).await?;
        tracing::info!("Generated atom.xml");

        Ok(stats)
    }

    /// Full document for one post
    pub async fn render_post(&self, slug: &str) -> Result<String> {
        let page = self.source.fetch_page(slug).await?;
        if !page.summary.published {
            return Err(FetchError::NotFound(format!("page `{}`", slug)).into());
        }
        let body = self.render_body(&page).await?;
        Ok(self.layout(&self.post_meta(&page), &self.article(&page, &body)?))
    }

    /// Full document for the post listing
    pub async fn render_index(&self) -> Result<String> {
        let summaries = published_newest_first(self.source.list_pages().await?);
        self.index_html(&summaries)
    }

    /// Full document for the likes page, `None` when disabled
    pub async fn render_likes(&self) -> Option<String> {
        self.likes_html().await.map(|(_, html)| html)
    }

    /// Group, probe and render the blocks of a page
    async fn render_body(&self, page: &Page) -> Result<String> {
        let blocks = group_blocks(page.blocks.clone())?;
        let media = probe_media(&blocks, Arc::clone(&self.probe)).await?;
        let renderer = BlockRenderer::new(&self.config, &self.highlighter, &media);
        Ok(renderer.render_grouped(&blocks)?)
    }

    fn article(&self, page: &Page, body: &str) -> Result<String> {
        let date = format_post_date(&page.summary.created, &self.tz)
            .with_context(|| format!("Invalid date on page `{}`", page.summary.slug))?;
        Ok(format!(
            "<article><h1>{}</h1>{}{}</article>",
            html_escape(&page.summary.title),
            time_tag(&date),
            body
        ))
    }

    fn index_html(&self, summaries: &[PageSummary]) -> Result<String> {
        let mut list = String::from(r#"<ul class="posts">"#);
        for summary in summaries {
            let date = format_post_date(&summary.created, &self.tz)
                .with_context(|| format!("Invalid date on page `{}`", summary.slug))?;
            list.push_str(&format!(
                r#"<li>{} <a href="{}">{}</a></li>"#,
                time_tag(&date),
                html_escape(&url_for(&self.config, &post_path(&summary.slug))),
                html_escape(&summary.title)
            ));
        }
        list.push_str("</ul>");

        let meta = PageMeta {
            title: self.config.title.clone(),
            description: self.config.description.clone(),
            url: full_url_for(&self.config, "/"),
            ..PageMeta::default()
        };
        Ok(self.layout(&meta, &list))
    }

    /// Section count and document, `None` when the likes page is disabled
    async fn likes_html(&self) -> Option<(usize, String)> {
        if !self.config.likes.enable {
            return None;
        }

        let sections = build_likes_sections(self.source.as_ref(), &self.config.likes.kinds).await;
        let body = format!(
            "<h1>Likes</h1>{}",
            render::render_likes(&self.config, &sections)
        );
        let meta = PageMeta {
            title: format!("Likes | {}", self.config.title),
            description: format!("Things {} enjoys", self.config.author),
            url: full_url_for(&self.config, "likes/"),
            ..PageMeta::default()
        };
        Some((sections.len(), self.layout(&meta, &body)))
    }

    fn post_meta(&self, page: &Page) -> PageMeta {
        // Only the paragraph fallback is shortened
        let description = if page.summary.description.is_empty() {
            truncate(&page.description(), MAX_DESCRIPTION_LEN, None)
        } else {
            page.summary.description.clone()
        };

        PageMeta {
            title: page.summary.title.clone(),
            description,
            url: full_url_for(&self.config, &post_path(&page.summary.slug)),
            image: page.summary.cover.clone(),
            published: parse_timestamp(&page.summary.created)
                .ok()
                .map(|d| date_xml(&d)),
            kind: MetaKind::Article,
        }
    }

    fn layout(&self, meta: &PageMeta, body: &str) -> String {
        let mut nav = format!(
            r#"<a href="{}">{}</a>"#,
            html_escape(&url_for(&self.config, "/")),
            html_escape(&self.config.title)
        );
        if self.config.likes.enable {
            nav.push_str(&format!(
                r#" <a href="{}">Likes</a>"#,
                html_escape(&url_for(&self.config, "likes/"))
            ));
        }

        format!(
            r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{meta}
{generator}
{feed}
</head>
<body>
<header><nav>{nav}</nav></header>
<main>
{body}
</main>
</body>
</html>
"#,
            lang = html_escape(&self.config.language),
            meta = meta.render(&self.config),
            generator = meta_generator(),
            feed = feed_tag(&self.config, "atom.xml"),
            nav = nav,
            body = body
        )
    }

    /// Output directory of a post; slugs must be a single path segment
    fn post_dir(&self, slug: &str) -> Result<PathBuf> {
        let mut components = Path::new(slug).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.public_dir.join("posts").join(slug)),
            _ => bail!("Refusing to write page with unsafe slug {:?}", slug),
        }
    }

    /// Atom feed of the most recent posts
    fn atom_feed(&self, pages: &[(Page, String)]) -> Result<String> {
        let base_url = self.config.url.trim_end_matches('/');
        let updated = match pages.first() {
            Some((page, _)) => date_xml(&parse_timestamp(&page.summary.created)?),
            None => date_xml(&chrono::Utc::now()),
        };

        let mut feed = String::new();
        feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        feed.push('\n');
        feed.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
        feed.push('\n');
        feed.push_str(&format!(
            "  <title>{}</title>\n",
            escape_xml(&self.config.title)
        ));
        feed.push_str(&format!(
            "  <link href=\"{}\" rel=\"self\"/>\n",
            escape_xml(&full_url_for(&self.config, "atom.xml"))
        ));
        feed.push_str(&format!(
            "  <link href=\"{}\"/>\n",
            escape_xml(&full_url_for(&self.config, "/"))
        ));
        feed.push_str(&format!("  <updated>{}</updated>\n", updated));
        feed.push_str(&format!("  <id>{}/</id>\n", escape_xml(base_url)));
        feed.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            escape_xml(&self.config.author)
        ));

        for (page, body) in pages.iter().take(self.config.feed_limit) {
            let link = escape_xml(&full_url_for(&self.config, &post_path(&page.summary.slug)));
            let published = date_xml(&parse_timestamp(&page.summary.created)?);

            feed.push_str("  <entry>\n");
            feed.push_str(&format!(
                "    <title>{}</title>\n",
                escape_xml(&page.summary.title)
            ));
            feed.push_str(&format!("    <link href=\"{}\"/>\n", link));
            feed.push_str(&format!("    <id>{}</id>\n", link));
            feed.push_str(&format!("    <published>{}</published>\n", published));
            feed.push_str(&format!("    <updated>{}</updated>\n", published));
            feed.push_str(&format!(
                "    <summary>{}</summary>\n",
                escape_xml(&page.description())
            ));
            let content = strip_invalid_xml_chars(&absolute_urls(body, base_url));
            feed.push_str(&format!(
                "    <content type=\"html\"><![CDATA[{}]]></content>\n",
                content.replace("]]>", "]]]]><![CDATA[>")
            ));
            feed.push_str("  </entry>\n");
        }

        feed.push_str("</feed>\n");
        Ok(feed)
    }
}

async fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create dir {:?}", parent))?;
    }
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {:?}", path))
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Point root-relative `href` and `src` attributes at the site URL
fn absolute_urls(content: &str, base_url: &str) -> String {
    content
        .replace("href=\"/", &format!("href=\"{}/", base_url))
        .replace("src=\"/", &format!("src=\"{}/", base_url))
}

/// Drop characters XML 1.0 does not allow
fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            c == '\t'
                || c == '\n'
                || c == '\r'
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::DirectorySource;
    use crate::render::NoopProbe;
    use std::fs;
    use tempfile::TempDir;

    const HELLO: &str = r#"{
        "id": "1",
        "slug": "hello",
        "title": "Hello",
        "description": "First post",
        "created": "2024-01-15T10:30:00.000Z",
        "blocks": [
            {"type": "heading_1", "heading_1": {"rich_text": [{"plain_text": "Intro"}]}},
            {"type": "bulleted_list_item", "bulleted_list_item": {"rich_text": [{"plain_text": "a"}]}},
            {"type": "bulleted_list_item", "bulleted_list_item": {"rich_text": [{"plain_text": "b"}]}},
            {"type": "paragraph", "paragraph": {"rich_text": [{"plain_text": "See /about"}]}}
        ]
    }"#;

    const OLDER: &str = r#"{
        "id": "2",
        "slug": "older",
        "title": "Older",
        "created": "2023-06-01",
        "blocks": [
            {"type": "paragraph", "paragraph": {"rich_text": [{"plain_text": "Old news"}]}}
        ]
    }"#;

    const DRAFT: &str = r#"{
        "id": "3",
        "slug": "draft",
        "title": "Draft",
        "created": "2024-02-01",
        "published": false,
        "blocks": []
    }"#;

    fn site() -> (TempDir, Generator) {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(content.join("pages")).unwrap();
        fs::create_dir_all(content.join("likes")).unwrap();
        fs::write(content.join("pages").join("hello.json"), HELLO).unwrap();
        fs::write(content.join("pages").join("older.json"), OLDER).unwrap();
        fs::write(content.join("pages").join("draft.json"), DRAFT).unwrap();
        fs::write(
            content.join("likes").join("books.json"),
            r#"[{"title": "Dune", "year": 1965}]"#,
        )
        .unwrap();

        let generator = Generator::with_parts(
            SiteConfig::default(),
            dir.path().join("public"),
            Arc::new(DirectorySource::new(&content)),
            Arc::new(NoopProbe),
            Arc::new(CodeHighlighter::new()),
        )
        .unwrap();
        (dir, generator)
    }

    #[tokio::test]
    async fn test_generate_writes_site() {
        let (dir, generator) = site();
        let stats = generator.generate().await.unwrap();
        assert_eq!(
            stats,
            GenerateStats {
                posts: 2,
                likes_sections: 1
            }
        );

        let public = dir.path().join("public");
        let post = fs::read_to_string(public.join("posts/hello/index.html")).unwrap();
        assert!(post.contains("<ul><li><span>a</span></li><li><span>b</span></li></ul>"));
        assert!(post.contains(r#"<h2 id="intro">"#));
        assert!(post.contains(r#"<time datetime="2024-01-15T10:30:00.000Z">Jan 15, 2024</time>"#));
        assert!(!public.join("posts/draft").exists());

        let index = fs::read_to_string(public.join("index.html")).unwrap();
        let hello = index.find("/posts/hello/").unwrap();
        let older = index.find("/posts/older/").unwrap();
        assert!(hello < older);

        assert!(public.join("likes/index.html").exists());

        let feed = fs::read_to_string(public.join("atom.xml")).unwrap();
        assert_eq!(feed.matches("<entry>").count(), 2);
        assert!(feed.contains("<link href=\"http://example.com/posts/hello/\"/>"));
    }

    #[tokio::test]
    async fn test_render_post_not_found() {
        let (_dir, generator) = site();
        for slug in ["missing", "draft"] {
            let err = generator.render_post(slug).await.unwrap_err();
            let fetch = err.downcast_ref::<FetchError>().unwrap();
            assert!(fetch.is_not_found());
        }
    }

    #[tokio::test]
    async fn test_render_post_meta() {
        let (_dir, generator) = site();
        let html = generator.render_post("older").await.unwrap();
        assert!(html.contains("<title>Older</title>"));
        // falls back to the first paragraph
        assert!(html.contains(r#"<meta name="description" content="Old news">"#));
        assert!(html.contains(r#"<meta property="og:type" content="article">"#));
    }

    #[tokio::test]
    async fn test_likes_disabled() {
        let (_dir, mut generator) = site();
        generator.config.likes.enable = false;
        assert!(generator.render_likes().await.is_none());
    }

    #[test]
    fn test_unsafe_slug_is_rejected() {
        let (_dir, generator) = site();
        assert!(generator.post_dir("../escape").is_err());
        assert!(generator.post_dir("a/b").is_err());
        assert!(generator.post_dir("hello").is_ok());
    }

    #[test]
    fn test_feed_helpers() {
        assert_eq!(escape_xml("a & 'b'"), "a &amp; &apos;b&apos;");
        assert_eq!(
            absolute_urls(r#"<a href="/x">"#, "https://site.dev"),
            r#"<a href="https://site.dev/x">"#
        );
        assert_eq!(strip_invalid_xml_chars("a\u{0001}b"), "ab");
    }
}
