//! Content module - pages, blocks, rich text and where they come from

mod block;
mod group;
pub mod likes;
pub mod loader;
mod page;
mod rich_text;

pub use block::{normalize_quotes, Block, CodeBlock, HeadingLevel, ListItem, ListKind, Media, Toggle};
pub use group::{group_blocks, GroupedBlock, List};
pub use likes::{build_likes_sections, LikesSection, MediaItem, MediaKind};
pub use loader::{CachedSource, ContentSource, DirectorySource};
pub use page::{published_newest_first, Page, PageSummary};
pub use rich_text::{plain_text, render_rich_text, Annotations, LinkRenderer, RichTextSpan, SpanStyle};
