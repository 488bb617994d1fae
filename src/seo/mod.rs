//! Page metadata: head tags and their validation

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use crate::config::{CloudinaryConfig, SiteConfig};
use crate::helpers::{html_escape, html_unescape, is_cloudinary_url};

/// Longest title search engines display in full
pub const MAX_TITLE_LEN: usize = 70;
/// Longest description search engines display in full
pub const MAX_DESCRIPTION_LEN: usize = 160;

lazy_static! {
    static ref TITLE_RE: Regex = Regex::new(r"(?s)<title>(.*?)</title>").unwrap();
    static ref META_RE: Regex =
        Regex::new(r#"<meta (?:name|property)="([^"]+)" content="([^"]*)">"#).unwrap();
    static ref CANONICAL_RE: Regex = Regex::new(r#"<link rel="canonical" href="([^"]*)">"#).unwrap();
}

/// Open Graph object type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetaKind {
    #[default]
    Website,
    Article,
}

impl MetaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetaKind::Website => "website",
            MetaKind::Article => "article",
        }
    }
}

/// Metadata of one rendered page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    /// Canonical absolute URL
    pub url: String,
    pub image: Option<String>,
    /// RFC 3339 publication time, articles only
    pub published: Option<String>,
    pub kind: MetaKind,
}

impl PageMeta {
    /// Render the `<head>` tags for this page
    pub fn render(&self, config: &SiteConfig) -> String {
        let mut tags = vec![
            format!("<title>{}</title>", html_escape(&self.title)),
            format!(
                r#"<meta name="description" content="{}">"#,
                html_escape(&self.description)
            ),
            format!(r#"<link rel="canonical" href="{}">"#, html_escape(&self.url)),
            format!(r#"<meta property="og:type" content="{}">"#, self.kind.as_str()),
            format!(
                r#"<meta property="og:title" content="{}">"#,
                html_escape(&self.title)
            ),
            format!(r#"<meta property="og:url" content="{}">"#, html_escape(&self.url)),
            format!(
                r#"<meta property="og:site_name" content="{}">"#,
                html_escape(&config.title)
            ),
        ];

        if !self.description.is_empty() {
            tags.push(format!(
                r#"<meta property="og:description" content="{}">"#,
                html_escape(&self.description)
            ));
        }

        if let Some(published) = &self.published {
            tags.push(format!(
                r#"<meta property="article:published_time" content="{}">"#,
                html_escape(published)
            ));
        }

        let card = if self.image.is_some() {
            "summary_large_image"
        } else {
            "summary"
        };
        tags.push(format!(r#"<meta name="twitter:card" content="{}">"#, card));
        tags.push(format!(
            r#"<meta name="twitter:title" content="{}">"#,
            html_escape(&self.title)
        ));

        if let Some(image) = &self.image {
            tags.push(format!(
                r#"<meta property="og:image" content="{}">"#,
                html_escape(image)
            ));
            tags.push(format!(
                r#"<meta name="twitter:image" content="{}">"#,
                html_escape(image)
            ));
        }

        tags.join("\n")
    }
}

/// A problem found in page metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaIssue {
    EmptyTitle,
    TitleTooLong(usize),
    EmptyDescription,
    DescriptionTooLong(usize),
    InvalidImage(String),
}

impl MetaIssue {
    /// Errors fail the check, everything else is a warning
    pub fn is_error(&self) -> bool {
        matches!(self, MetaIssue::EmptyTitle | MetaIssue::InvalidImage(_))
    }
}

impl fmt::Display for MetaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaIssue::EmptyTitle => write!(f, "title is empty"),
            MetaIssue::TitleTooLong(len) => write!(
                f,
                "title is {} characters (max {})",
                len, MAX_TITLE_LEN
            ),
            MetaIssue::EmptyDescription => write!(f, "description is empty"),
            MetaIssue::DescriptionTooLong(len) => write!(
                f,
                "description is {} characters (max {})",
                len, MAX_DESCRIPTION_LEN
            ),
            MetaIssue::InvalidImage(url) => write!(f, "image is not a CDN image: {}", url),
        }
    }
}

/// Check metadata against length limits and the image policy
pub fn validate_meta(meta: &PageMeta, cloudinary: &CloudinaryConfig) -> Vec<MetaIssue> {
    let mut issues = Vec::new();

    let title_len = meta.title.trim().chars().count();
    if title_len == 0 {
        issues.push(MetaIssue::EmptyTitle);
    } else if title_len > MAX_TITLE_LEN {
        issues.push(MetaIssue::TitleTooLong(title_len));
    }

    let description_len = meta.description.trim().chars().count();
    if description_len == 0 {
        issues.push(MetaIssue::EmptyDescription);
    } else if description_len > MAX_DESCRIPTION_LEN {
        issues.push(MetaIssue::DescriptionTooLong(description_len));
    }

    if !is_cloudinary_url(cloudinary, meta.image.as_deref()) {
        issues.push(MetaIssue::InvalidImage(
            meta.image.clone().unwrap_or_default(),
        ));
    }

    issues
}

/// Read metadata back out of a generated page
pub fn extract_meta(html: &str) -> PageMeta {
    let mut meta = PageMeta {
        title: TITLE_RE
            .captures(html)
            .map(|c| html_unescape(c[1].trim()))
            .unwrap_or_default(),
        url: CANONICAL_RE
            .captures(html)
            .map(|c| html_unescape(&c[1]))
            .unwrap_or_default(),
        ..PageMeta::default()
    };

    for caps in META_RE.captures_iter(html) {
        let value = html_unescape(&caps[2]);
        match &caps[1] {
            "description" => meta.description = value,
            "og:image" => meta.image = Some(value),
            "og:type" if value == "article" => meta.kind = MetaKind::Article,
            "article:published_time" => meta.published = Some(value),
            _ => {}
        }
    }

    meta
}
