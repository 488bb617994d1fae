//! Inline rich text spans and their HTML rendering

use serde::{Deserialize, Serialize};

use crate::helpers::html_escape;

/// Style flags attached to a span
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
}

/// One inline styled run of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTextSpan {
    /// Plain text content
    #[serde(rename = "plain_text")]
    pub content: String,

    /// Style flags
    #[serde(default)]
    pub annotations: Annotations,

    /// Optional link target
    #[serde(rename = "href", default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl RichTextSpan {
    /// Create an unstyled span
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            annotations: Annotations::default(),
            link: None,
        }
    }

    /// Set the style flags
    pub fn with_annotations(mut self, annotations: Annotations) -> Self {
        self.annotations = annotations;
        self
    }

    /// Set the link target
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Tag and classes chosen for a span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanStyle {
    pub tag: &'static str,
    pub classes: Vec<&'static str>,
}

impl Annotations {
    /// Resolve the element tag and class list for these flags.
    ///
    /// `code` wins over `italic` for the tag; the remaining flags only
    /// contribute classes, always in the order bold, italic, strikethrough,
    /// underline.
    pub fn style(&self) -> SpanStyle {
        let tag = if self.code {
            "code"
        } else if self.italic {
            "em"
        } else {
            "span"
        };

        let mut classes = Vec::new();
        if self.bold {
            classes.push("font-bold");
        }
        if self.italic {
            classes.push("italic");
        }
        if self.strikethrough {
            classes.push("line-through");
        }
        if self.underline {
            classes.push("underline");
        }

        SpanStyle { tag, classes }
    }
}

/// Renders links found inside rich text
pub trait LinkRenderer {
    /// Wrap already-rendered `inner` HTML in a link to `href`
    fn render_link(&self, href: &str, inner: &str) -> String;
}

/// Concatenate the plain text of a run of spans
pub fn plain_text(spans: &[RichTextSpan]) -> String {
    spans.iter().map(|s| s.content.as_str()).collect()
}

/// Render a run of spans to HTML. An empty run renders nothing.
pub fn render_rich_text<L: LinkRenderer + ?Sized>(spans: &[RichTextSpan], links: &L) -> String {
    let mut html = String::new();
    for span in spans {
        html.push_str(&render_span(span, links));
    }
    html
}

fn render_span<L: LinkRenderer + ?Sized>(span: &RichTextSpan, links: &L) -> String {
    let style = span.annotations.style();
    let text = html_escape(&span.content);

    let element = if style.classes.is_empty() {
        format!("<{tag}>{text}</{tag}>", tag = style.tag, text = text)
    } else {
        format!(
            r#"<{tag} class="{classes}">{text}</{tag}>"#,
            tag = style.tag,
            classes = style.classes.join(" "),
            text = text
        )
    };

    match &span.link {
        Some(href) => links.render_link(href, &element),
        None => element,
    }
}
