//! Likes page sections

use crate::config::SiteConfig;
use crate::content::{LikesSection, MediaItem};
use crate::helpers::{html_escape, is_cloudinary_url, link_to, transform_url, Transformation};

/// Render each section as a titled list
pub fn render_likes(config: &SiteConfig, sections: &[LikesSection]) -> String {
    let mut html = String::new();

    for section in sections {
        html.push_str(&format!(
            r#"<section class="likes likes-{}"><h2 id="{}">{}</h2><ul>"#,
            section.kind,
            section.kind,
            section.kind.title()
        ));
        for item in &section.items {
            html.push_str(&render_item(config, item));
        }
        html.push_str("</ul></section>");
    }

    html
}

fn render_item(config: &SiteConfig, item: &MediaItem) -> String {
    let mut html = String::from("<li>");

    if let Some(image) = item.image.as_deref() {
        if is_cloudinary_url(&config.cloudinary, Some(image)) {
            let src = transform_url(
                &config.cloudinary,
                image,
                Transformation::width(config.cloudinary.thumbnail_width),
            );
            html.push_str(&format!(
                r#"<img src="{}" alt="{}" loading="lazy">"#,
                html_escape(&src),
                html_escape(&item.title)
            ));
        } else {
            tracing::debug!("Dropping non-CDN image for {}: {}", item.title, image);
        }
    }

    let title = html_escape(&item.title);
    let title = match item.url.as_deref() {
        Some(url) => link_to(config, url, &title),
        None => title,
    };
    html.push_str(&format!(r#"<span class="title">{}</span>"#, title));

    if let Some(creator) = &item.creator {
        html.push_str(&format!(r#" <span class="creator">{}</span>"#, html_escape(creator)));
    }
    if let Some(year) = item.year {
        html.push_str(&format!(r#" <span class="year">({})</span>"#, year));
    }

    html.push_str("</li>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MediaKind;

    fn item(title: &str, image: Option<&str>) -> MediaItem {
        MediaItem {
            title: title.to_string(),
            creator: Some("Someone".to_string()),
            year: Some(1999),
            url: None,
            image: image.map(str::to_string),
        }
    }

    #[test]
    fn test_render_section() {
        let config = SiteConfig::default();
        let sections = vec![LikesSection {
            kind: MediaKind::Tv,
            items: vec![item(
                "The Wire",
                Some("https://res.cloudinary.com/demo/image/upload/v1/mu/wire.jpg"),
            )],
        }];

        let html = render_likes(&config, &sections);
        assert!(html.starts_with(r#"<section class="likes likes-tv"><h2 id="tv">TV Shows</h2>"#));
        assert!(html.contains("/upload/w_200,f_auto,q_auto,dpr_2.0/v1/mu/wire.jpg"));
        assert!(html.contains(r#"<span class="creator">Someone</span>"#));
        assert!(html.contains("(1999)"));
    }

    #[test]
    fn test_foreign_image_is_dropped() {
        let config = SiteConfig::default();
        let sections = vec![LikesSection {
            kind: MediaKind::Books,
            items: vec![item("Dune", Some("https://covers.example.com/dune.jpg"))],
        }];

        let html = render_likes(&config, &sections);
        assert!(!html.contains("<img"));
        assert!(html.contains("Dune"));
    }

    #[test]
    fn test_linked_title() {
        let config = SiteConfig::default();
        let mut liked = item("Dune", None);
        liked.url = Some("https://example.com/dune".to_string());
        let html = render_likes(
            &config,
            &[LikesSection {
                kind: MediaKind::Books,
                items: vec![liked],
            }],
        );
        assert!(html.contains(r#"<a href="https://example.com/dune""#));
    }

    #[test]
    fn test_no_sections() {
        assert_eq!(render_likes(&SiteConfig::default(), &[]), "");
    }
}
