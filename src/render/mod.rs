//! Block rendering
//!
//! Turns normalized blocks into HTML. Dispatch is an exhaustive `match`, so
//! a new block variant must be handled here before the crate compiles.

mod code;
mod likes;
pub mod media;

pub use code::{CodeHighlighter, CodeMeta};
pub use likes::render_likes;
pub use media::{probe_media, CloudinaryProbe, Dimensions, MediaIndex, MediaProbe, NoopProbe};

use reqwest::Url;

use crate::config::SiteConfig;
use crate::content::{
    group_blocks, plain_text, render_rich_text, Block, CodeBlock, GroupedBlock, List, ListKind,
    Media, RichTextSpan, Toggle,
};
use crate::error::BlockError;
use crate::helpers::{html_escape, transform_url, SiteLinks, Transformation};

/// Renders one page worth of blocks
pub struct BlockRenderer<'a> {
    config: &'a SiteConfig,
    highlighter: &'a CodeHighlighter,
    media: &'a MediaIndex,
    links: SiteLinks<'a>,
}

impl<'a> BlockRenderer<'a> {
    pub fn new(
        config: &'a SiteConfig,
        highlighter: &'a CodeHighlighter,
        media: &'a MediaIndex,
    ) -> Self {
        Self {
            config,
            highlighter,
            media,
            links: SiteLinks::new(config),
        }
    }

    /// Group and render a flat block sequence
    pub fn render_blocks(&self, blocks: &[Block]) -> Result<String, BlockError> {
        let grouped = group_blocks(blocks.to_vec())?;
        self.render_grouped(&grouped)
    }

    /// Render already grouped blocks
    pub fn render_grouped(&self, blocks: &[GroupedBlock]) -> Result<String, BlockError> {
        let mut html = String::new();
        for (index, block) in blocks.iter().enumerate() {
            html.push_str(&self.render_block(index, block)?);
        }
        Ok(html)
    }

    fn render_block(&self, index: usize, block: &GroupedBlock) -> Result<String, BlockError> {
        let block = match block {
            GroupedBlock::List(list) => return self.render_list(list),
            GroupedBlock::Block(block) => block,
        };

        match block {
            Block::Paragraph(text) => Ok(format!("<p>{}</p>", self.rich(text))),
            Block::Heading { level, text } => {
                // The page title owns <h1>
                let tag = level.number() + 1;
                Ok(format!(
                    r#"<h{tag} id="{id}">{body}</h{tag}>"#,
                    tag = tag,
                    id = slug::slugify(plain_text(text)),
                    body = self.rich(text)
                ))
            }
            Block::BulletedListItem(_) | Block::NumberedListItem(_) => {
                Err(BlockError::UngroupedListItem { index })
            }
            Block::Code(code) => Ok(self.render_code(code)),
            Block::Quote(text) => Ok(format!("<blockquote>{}</blockquote>", self.rich(text))),
            Block::Image(media) => self.render_image(media),
            Block::Video(media) => Ok(self.render_video(media)),
            Block::Toggle(toggle) => self.render_toggle(toggle),
            Block::ChildPage { title } => {
                tracing::info!("Skipping child page block: {}", title);
                Ok(String::new())
            }
        }
    }

    fn rich(&self, spans: &[RichTextSpan]) -> String {
        render_rich_text(spans, &self.links)
    }

    fn render_list(&self, list: &List) -> Result<String, BlockError> {
        let tag = match list.kind {
            ListKind::Bulleted => "ul",
            ListKind::Numbered => "ol",
        };

        let mut html = format!("<{}>", tag);
        for item in &list.items {
            html.push_str("<li>");
            html.push_str(&self.rich(&item.text));
            if !item.children.is_empty() {
                html.push_str(&self.render_blocks(&item.children)?);
            }
            html.push_str("</li>");
        }
        html.push_str(&format!("</{}>", tag));
        Ok(html)
    }

    fn render_code(&self, code: &CodeBlock) -> String {
        let meta = code
            .meta()
            .map(|m| CodeMeta::parse(&m))
            .unwrap_or_default();
        self.highlighter.render(&code.source(), &code.language, &meta)
    }

    fn render_image(&self, media: &Media) -> Result<String, BlockError> {
        let alt = plain_text(&media.caption);
        if alt.trim().is_empty() {
            return Err(BlockError::MissingCaption {
                kind: "image",
                url: media.url.clone(),
            });
        }

        let src = transform_url(
            &self.config.cloudinary,
            &media.url,
            Transformation::width(self.config.cloudinary.image_width),
        );
        let size = self
            .media
            .get(&media.url)
            .map(|d| format!(r#" width="{}" height="{}""#, d.width, d.height))
            .unwrap_or_default();

        Ok(format!(
            r#"<figure class="image"><img src="{}" alt="{}"{} loading="lazy"><figcaption>{}</figcaption></figure>"#,
            html_escape(&src),
            html_escape(alt.trim()),
            size,
            self.rich(&media.caption)
        ))
    }

    fn render_video(&self, media: &Media) -> String {
        let player = match youtube_id(&media.url) {
            Some(id) => format!(
                r#"<iframe src="https://www.youtube-nocookie.com/embed/{}" allow="encrypted-media; picture-in-picture" allowfullscreen loading="lazy"></iframe>"#,
                html_escape(&id)
            ),
            None => format!(
                r#"<video src="{}" controls preload="metadata"></video>"#,
                html_escape(&media.url)
            ),
        };

        let caption = if media.caption.is_empty() {
            String::new()
        } else {
            format!("<figcaption>{}</figcaption>", self.rich(&media.caption))
        };

        format!(r#"<figure class="video">{}{}</figure>"#, player, caption)
    }

    fn render_toggle(&self, toggle: &Toggle) -> Result<String, BlockError> {
        Ok(format!(
            "<details><summary>{}</summary>{}</details>",
            self.rich(&toggle.summary),
            self.render_blocks(&toggle.children)?
        ))
    }
}

/// Video id of a YouTube watch, short or embed link
fn youtube_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    let id = match host {
        "youtu.be" => parsed.path_segments()?.next().map(str::to_string),
        "youtube.com" | "youtube-nocookie.com" => {
            if parsed.path() == "/watch" {
                parsed
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned())
            } else {
                let mut segments = parsed.path_segments()?;
                match segments.next() {
                    Some("embed") | Some("shorts") => segments.next().map(str::to_string),
                    _ => None,
                }
            }
        }
        _ => None,
    };

    id.filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Annotations, HeadingLevel, ListItem};

    const PHOTO: &str = "https://res.cloudinary.com/demo/image/upload/v123/mu/photo.jpg";

    fn text(s: &str) -> Vec<RichTextSpan> {
        vec![RichTextSpan::plain(s)]
    }

    fn bullet(s: &str) -> Block {
        Block::BulletedListItem(ListItem {
            text: text(s),
            children: Vec::new(),
        })
    }

    fn render(blocks: &[Block]) -> Result<String, BlockError> {
        let config = SiteConfig::default();
        let highlighter = CodeHighlighter::with_options("base16-ocean.dark", false);
        let media = MediaIndex::new();
        BlockRenderer::new(&config, &highlighter, &media).render_blocks(blocks)
    }

    #[test]
    fn test_list_then_paragraph() {
        let html = render(&[bullet("a"), bullet("b"), bullet("c"), Block::Paragraph(text("p"))])
            .unwrap();
        assert_eq!(
            html,
            "<ul><li><span>a</span></li><li><span>b</span></li><li><span>c</span></li></ul><p><span>p</span></p>"
        );
    }

    #[test]
    fn test_numbered_list() {
        let html = render(&[Block::NumberedListItem(ListItem {
            text: text("one"),
            children: vec![bullet("nested")],
        })])
        .unwrap();
        assert_eq!(
            html,
            "<ol><li><span>one</span><ul><li><span>nested</span></li></ul></li></ol>"
        );
    }

    #[test]
    fn test_heading() {
        let html = render(&[Block::Heading {
            level: HeadingLevel::H1,
            text: text("Getting Started"),
        }])
        .unwrap();
        assert_eq!(
            html,
            r#"<h2 id="getting-started"><span>Getting Started</span></h2>"#
        );
    }

    #[test]
    fn test_styled_paragraph_with_link() {
        let span = RichTextSpan::plain("docs")
            .with_annotations(Annotations {
                bold: true,
                ..Annotations::default()
            })
            .with_link("https://docs.rs");
        let html = render(&[Block::Paragraph(vec![span])]).unwrap();
        assert_eq!(
            html,
            r#"<p><a href="https://docs.rs" target="_blank" rel="noopener noreferrer"><span class="font-bold">docs</span></a></p>"#
        );
    }

    #[test]
    fn test_code_discards_styling() {
        let styled = RichTextSpan::plain("let x = 1;").with_annotations(Annotations {
            bold: true,
            ..Annotations::default()
        });
        let html = render(&[Block::Code(CodeBlock {
            language: "rust".to_string(),
            text: vec![styled],
            caption: text("title=\u{201C}x.rs\u{201D}"),
        })])
        .unwrap();
        assert!(html.contains("<figcaption>x.rs</figcaption>"));
        assert!(!html.contains("font-bold"));
    }

    #[test]
    fn test_toggle_renders_children_recursively() {
        let html = render(&[Block::Toggle(Toggle {
            summary: text("More"),
            children: vec![bullet("a"), bullet("b")],
        })])
        .unwrap();
        assert_eq!(
            html,
            "<details><summary><span>More</span></summary><ul><li><span>a</span></li><li><span>b</span></li></ul></details>"
        );
    }

    #[test]
    fn test_image_transforms_and_uses_dimensions() {
        let config = SiteConfig::default();
        let highlighter = CodeHighlighter::new();
        let mut media = MediaIndex::new();
        media.insert(
            PHOTO.to_string(),
            Dimensions {
                width: 800,
                height: 600,
            },
        );
        let renderer = BlockRenderer::new(&config, &highlighter, &media);

        let html = renderer
            .render_blocks(&[Block::Image(Media {
                url: PHOTO.to_string(),
                caption: text("A photo"),
                hosted: false,
            })])
            .unwrap();
        assert!(html.contains("/upload/w_1200,f_auto,q_auto,dpr_2.0/v123/mu/photo.jpg"));
        assert!(html.contains(r#"alt="A photo""#));
        assert!(html.contains(r#"width="800" height="600""#));
    }

    #[test]
    fn test_image_without_caption_fails() {
        let err = render(&[Block::Image(Media {
            url: PHOTO.to_string(),
            caption: Vec::new(),
            hosted: false,
        })])
        .unwrap_err();
        assert!(matches!(err, BlockError::MissingCaption { kind: "image", .. }));
    }

    #[test]
    fn test_video_embeds() {
        let youtube = render(&[Block::Video(Media {
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            caption: Vec::new(),
            hosted: false,
        })])
        .unwrap();
        assert!(youtube.contains("youtube-nocookie.com/embed/dQw4w9WgXcQ"));

        let file = render(&[Block::Video(Media {
            url: "https://files.example.com/clip.mp4".to_string(),
            caption: text("Clip"),
            hosted: true,
        })])
        .unwrap();
        assert!(file.contains(r#"<video src="https://files.example.com/clip.mp4""#));
        assert!(file.contains("<figcaption><span>Clip</span></figcaption>"));
    }

    #[test]
    fn test_child_page_is_skipped() {
        let html = render(&[
            Block::ChildPage {
                title: "Sub".to_string(),
            },
            Block::Quote(text("q")),
        ])
        .unwrap();
        assert_eq!(html, "<blockquote><span>q</span></blockquote>");
    }

    #[test]
    fn test_raw_list_item_in_grouped_input_fails() {
        let config = SiteConfig::default();
        let highlighter = CodeHighlighter::new();
        let media = MediaIndex::new();
        let renderer = BlockRenderer::new(&config, &highlighter, &media);
        let err = renderer
            .render_grouped(&[GroupedBlock::Block(bullet("stray"))])
            .unwrap_err();
        assert_eq!(err, BlockError::UngroupedListItem { index: 0 });
    }

    #[test]
    fn test_youtube_id() {
        assert_eq!(youtube_id("https://youtu.be/abc123").as_deref(), Some("abc123"));
        assert_eq!(
            youtube_id("https://www.youtube.com/embed/xyz").as_deref(),
            Some("xyz")
        );
        assert_eq!(youtube_id("https://vimeo.com/123"), None);
        assert_eq!(youtube_id("not a url"), None);
    }
}
