//! Cloudinary image URL helpers

use reqwest::Url;

use crate::config::CloudinaryConfig;

/// Path segments after which a transformation can be inserted
const MARKERS: [&str; 3] = ["/upload/", "/fetch/", "/youtube/"];

/// Delivery transformation for a responsive image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transformation {
    pub width: u32,
}

impl Transformation {
    pub fn width(width: u32) -> Self {
        Self { width }
    }

    /// Path segment form, e.g. `w_400,f_auto,q_auto,dpr_2.0`
    pub fn segment(&self) -> String {
        format!("w_{},f_auto,q_auto,dpr_2.0", self.width)
    }
}

/// Insert `transformation` right after the first marker segment.
///
/// URLs that are not on the CDN host or carry no marker come back unchanged.
pub fn insert_segment(config: &CloudinaryConfig, url: &str, segment: &str) -> String {
    if !url.contains(config.host.as_str()) {
        return url.to_string();
    }

    let marker = MARKERS
        .iter()
        .filter_map(|m| url.find(m).map(|pos| pos + m.len()))
        .min();

    match marker {
        Some(at) => format!("{}{}/{}", &url[..at], segment, &url[at..]),
        None => url.to_string(),
    }
}

/// Rewrite a CDN URL to deliver a resized, auto-format image
pub fn transform_url(config: &CloudinaryConfig, url: &str, transformation: Transformation) -> String {
    insert_segment(config, url, &transformation.segment())
}

/// Whether an image reference is acceptable for the site.
///
/// `None` means "no image" and is valid. Otherwise the URL must be absolute,
/// on the CDN host and under one of the allowed folders.
pub fn is_cloudinary_url(config: &CloudinaryConfig, url: Option<&str>) -> bool {
    let Some(url) = url else {
        return true;
    };

    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    parsed.host_str() == Some(config.host.as_str())
        && config
            .folders
            .iter()
            .any(|folder| parsed.path().contains(folder.as_str()))
}
