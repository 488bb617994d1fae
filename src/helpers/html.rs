//! HTML helper functions

use super::url::{is_external, url_for};
use crate::config::SiteConfig;
use crate::content::LinkRenderer;

/// Generate an anchor tag around already-rendered HTML
///
/// # Examples
/// ```ignore
/// link_to(&config, "/about/", "About") // -> <a href="/blog/about/">About</a>
/// link_to(&config, "#setup", "Setup") // -> <a href="#setup">Setup</a>
/// ```
pub fn link_to(config: &SiteConfig, path: &str, inner: &str) -> String {
    if path.starts_with('#') {
        // In-page anchor, relative to the current document
        format!(r#"<a href="{}">{}</a>"#, html_escape(path), inner)
    } else if is_external(path) {
        format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
            html_escape(path),
            inner
        )
    } else {
        format!(
            r#"<a href="{}">{}</a>"#,
            html_escape(&url_for(config, path)),
            inner
        )
    }
}

/// Link renderer that resolves internal links against the site root
pub struct SiteLinks<'a> {
    config: &'a SiteConfig,
}

impl<'a> SiteLinks<'a> {
    pub fn new(config: &'a SiteConfig) -> Self {
        Self { config }
    }
}

impl LinkRenderer for SiteLinks<'_> {
    fn render_link(&self, href: &str, inner: &str) -> String {
        link_to(self.config, href, inner)
    }
}

/// Generate a feed/RSS link tag
pub fn feed_tag(config: &SiteConfig, path: &str) -> String {
    let href = url_for(config, path);
    format!(
        r#"<link rel="alternate" href="{}" title="{}" type="application/atom+xml">"#,
        href,
        html_escape(&config.title)
    )
}

/// Generate meta generator tag
pub fn meta_generator() -> String {
    format!(
        r#"<meta name="generator" content="folio {}">"#,
        env!("CARGO_PKG_VERSION")
    )
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Reverse [`html_escape`]
pub fn html_unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Truncate a string to a specified length
pub fn truncate(s: &str, length: usize, omission: Option<&str>) -> String {
    let omission = omission.unwrap_or("...");

    if s.chars().count() <= length {
        s.to_string()
    } else {
        let truncated: String = s
            .chars()
            .take(length.saturating_sub(omission.chars().count()))
            .collect();
        format!("{}{}", truncated.trim_end(), omission)
    }
}
