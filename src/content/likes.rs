//! "Likes" media lists: movies, TV, books and podcasts

use serde::{Deserialize, Serialize};
use std::fmt;

use super::loader::ContentSource;

/// Kind of media list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movies,
    Tv,
    Books,
    Podcasts,
}

impl MediaKind {
    /// Every kind, in display order
    pub const ALL: [MediaKind; 4] = [
        MediaKind::Movies,
        MediaKind::Tv,
        MediaKind::Books,
        MediaKind::Podcasts,
    ];

    /// Identifier used for file names and cache keys
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Movies => "movies",
            MediaKind::Tv => "tv",
            MediaKind::Books => "books",
            MediaKind::Podcasts => "podcasts",
        }
    }

    /// Section heading
    pub fn title(self) -> &'static str {
        match self {
            MediaKind::Movies => "Movies",
            MediaKind::Tv => "TV Shows",
            MediaKind::Books => "Books",
            MediaKind::Podcasts => "Podcasts",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One liked movie, show, book or podcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A non-empty list of items of one kind
#[derive(Debug, Clone, PartialEq)]
pub struct LikesSection {
    pub kind: MediaKind,
    pub items: Vec<MediaItem>,
}

/// Fetch every requested kind. A failed or empty fetch drops that section.
pub async fn build_likes_sections(
    source: &dyn ContentSource,
    kinds: &[MediaKind],
) -> Vec<LikesSection> {
    let mut sections = Vec::new();

    for &kind in kinds {
        match source.fetch_likes(kind).await {
            Ok(items) if items.is_empty() => {
                tracing::warn!("No {} likes found, skipping section", kind);
            }
            Ok(items) => sections.push(LikesSection { kind, items }),
            Err(e) => {
                tracing::warn!("Failed to fetch {} likes, skipping section: {}", kind, e);
            }
        }
    }

    sections
}
