//! Content blocks as delivered by the CMS
//!
//! Blocks arrive in the CMS wire shape:
//!
//! ```json
//! {"id": "...", "type": "paragraph", "paragraph": {"rich_text": [...]}, "children": []}
//! ```
//!
//! Every block passes through [`RawBlock`] so an unknown `type` tag is
//! rejected with the tag in the error instead of being dropped.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::rich_text::{plain_text, RichTextSpan};
use crate::error::BlockError;

/// Heading depth supported by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Numeric level (1-3)
    pub fn number(self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = BlockError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(HeadingLevel::H1),
            2 => Ok(HeadingLevel::H2),
            3 => Ok(HeadingLevel::H3),
            other => Err(BlockError::InvalidHeadingLevel(other.to_string())),
        }
    }
}

/// Bulleted or numbered list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Bulleted,
    Numbered,
}

/// One list entry, possibly with nested blocks
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub text: Vec<RichTextSpan>,
    pub children: Vec<Block>,
}

/// A code listing
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock {
    pub language: String,
    pub text: Vec<RichTextSpan>,
    pub caption: Vec<RichTextSpan>,
}

impl CodeBlock {
    /// Raw source: span contents joined by newlines, styling discarded
    pub fn source(&self) -> String {
        self.text
            .iter()
            .map(|span| span.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Caption as a highlighter directive, with smart quotes straightened
    pub fn meta(&self) -> Option<String> {
        let caption = plain_text(&self.caption);
        let caption = caption.trim();
        if caption.is_empty() {
            None
        } else {
            Some(normalize_quotes(caption))
        }
    }
}

/// An image or video reference
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub url: String,
    pub caption: Vec<RichTextSpan>,
    /// Uploaded to the CMS rather than linked externally
    pub hosted: bool,
}

/// A collapsible section
#[derive(Debug, Clone, PartialEq)]
pub struct Toggle {
    pub summary: Vec<RichTextSpan>,
    pub children: Vec<Block>,
}

/// One unit of page content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBlock", into = "RawBlock")]
pub enum Block {
    Paragraph(Vec<RichTextSpan>),
    Heading {
        level: HeadingLevel,
        text: Vec<RichTextSpan>,
    },
    BulletedListItem(ListItem),
    NumberedListItem(ListItem),
    Code(CodeBlock),
    Quote(Vec<RichTextSpan>),
    Image(Media),
    Video(Media),
    Toggle(Toggle),
    ChildPage {
        title: String,
    },
}

impl Block {
    /// List kind if this block is a raw list item
    pub fn list_kind(&self) -> Option<ListKind> {
        match self {
            Block::BulletedListItem(_) => Some(ListKind::Bulleted),
            Block::NumberedListItem(_) => Some(ListKind::Numbered),
            _ => None,
        }
    }

    /// CMS type tag for this block
    pub fn type_tag(&self) -> String {
        match self {
            Block::Paragraph(_) => "paragraph".to_string(),
            Block::Heading { level, .. } => format!("heading_{}", level.number()),
            Block::BulletedListItem(_) => "bulleted_list_item".to_string(),
            Block::NumberedListItem(_) => "numbered_list_item".to_string(),
            Block::Code(_) => "code".to_string(),
            Block::Quote(_) => "quote".to_string(),
            Block::Image(_) => "image".to_string(),
            Block::Video(_) => "video".to_string(),
            Block::Toggle(_) => "toggle".to_string(),
            Block::ChildPage { .. } => "child_page".to_string(),
        }
    }
}

/// Replace typographic quotes with their ASCII equivalents
pub fn normalize_quotes(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => '\'',
            other => other,
        })
        .collect()
}

/// Untyped block in the CMS wire shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBlock {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,

    /// Remaining fields, including the payload keyed by `kind`
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RawBlock {
    fn new(kind: impl Into<String>, payload: impl Serialize, children: Vec<Block>) -> Self {
        let kind = kind.into();
        let mut fields = Map::new();
        fields.insert(
            kind.clone(),
            serde_json::to_value(payload).unwrap_or_default(),
        );
        Self {
            kind,
            children,
            fields,
        }
    }

    /// Take the payload stored under the block's own type key
    fn payload<T: DeserializeOwned>(&mut self) -> Result<T, BlockError> {
        let value = self
            .fields
            .remove(self.kind.as_str())
            .ok_or_else(|| BlockError::MissingPayload {
                kind: self.kind.clone(),
            })?;
        serde_json::from_value(value).map_err(|e| BlockError::MalformedPayload {
            kind: self.kind.clone(),
            message: e.to_string(),
        })
    }
}

#[derive(Serialize, Deserialize)]
struct TextPayload {
    #[serde(default)]
    rich_text: Vec<RichTextSpan>,
}

#[derive(Serialize, Deserialize)]
struct CodePayload {
    #[serde(default)]
    rich_text: Vec<RichTextSpan>,
    #[serde(default)]
    caption: Vec<RichTextSpan>,
    #[serde(default)]
    language: String,
}

#[derive(Serialize, Deserialize)]
struct FileUrl {
    url: String,
}

#[derive(Serialize, Deserialize)]
struct FilePayload {
    #[serde(rename = "type", default)]
    source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    external: Option<FileUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<FileUrl>,
    #[serde(default)]
    caption: Vec<RichTextSpan>,
}

impl FilePayload {
    fn into_media(self, kind: &str) -> Result<Media, BlockError> {
        let hosted = self.source == "file" || (self.external.is_none() && self.file.is_some());
        let url = self
            .external
            .or(self.file)
            .map(|f| f.url)
            .ok_or_else(|| BlockError::MalformedPayload {
                kind: kind.to_string(),
                message: "no file or external url".to_string(),
            })?;
        Ok(Media {
            url,
            caption: self.caption,
            hosted,
        })
    }

    fn from_media(media: Media) -> Self {
        let url = Some(FileUrl { url: media.url });
        if media.hosted {
            Self {
                source: "file".to_string(),
                external: None,
                file: url,
                caption: media.caption,
            }
        } else {
            Self {
                source: "external".to_string(),
                external: url,
                file: None,
                caption: media.caption,
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ChildPagePayload {
    #[serde(default)]
    title: String,
}

impl TryFrom<RawBlock> for Block {
    type Error = BlockError;

    fn try_from(mut raw: RawBlock) -> Result<Self, Self::Error> {
        let children = std::mem::take(&mut raw.children);
        let kind = raw.kind.clone();

        match kind.as_str() {
            "paragraph" => Ok(Block::Paragraph(raw.payload::<TextPayload>()?.rich_text)),
            "quote" => Ok(Block::Quote(raw.payload::<TextPayload>()?.rich_text)),
            "bulleted_list_item" => Ok(Block::BulletedListItem(ListItem {
                text: raw.payload::<TextPayload>()?.rich_text,
                children,
            })),
            "numbered_list_item" => Ok(Block::NumberedListItem(ListItem {
                text: raw.payload::<TextPayload>()?.rich_text,
                children,
            })),
            "code" => {
                let payload = raw.payload::<CodePayload>()?;
                Ok(Block::Code(CodeBlock {
                    language: payload.language,
                    text: payload.rich_text,
                    caption: payload.caption,
                }))
            }
            "image" => Ok(Block::Image(raw.payload::<FilePayload>()?.into_media(&kind)?)),
            "video" => Ok(Block::Video(raw.payload::<FilePayload>()?.into_media(&kind)?)),
            "toggle" => Ok(Block::Toggle(Toggle {
                summary: raw.payload::<TextPayload>()?.rich_text,
                children,
            })),
            "child_page" => Ok(Block::ChildPage {
                title: raw.payload::<ChildPagePayload>()?.title,
            }),
            heading if heading.starts_with("heading_") => {
                let suffix = &heading["heading_".len()..];
                if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(BlockError::UnsupportedType(heading.to_string()));
                }
                let level = suffix
                    .parse::<u8>()
                    .map_err(|_| BlockError::InvalidHeadingLevel(suffix.to_string()))
                    .and_then(HeadingLevel::try_from)?;
                Ok(Block::Heading {
                    level,
                    text: raw.payload::<TextPayload>()?.rich_text,
                })
            }
            other => Err(BlockError::UnsupportedType(other.to_string())),
        }
    }
}

impl From<Block> for RawBlock {
    fn from(block: Block) -> Self {
        let kind = block.type_tag();
        match block {
            Block::Paragraph(rich_text) | Block::Quote(rich_text) => {
                RawBlock::new(kind, TextPayload { rich_text }, Vec::new())
            }
            Block::Heading { text, .. } => {
                RawBlock::new(kind, TextPayload { rich_text: text }, Vec::new())
            }
            Block::BulletedListItem(item) | Block::NumberedListItem(item) => RawBlock::new(
                kind,
                TextPayload {
                    rich_text: item.text,
                },
                item.children,
            ),
            Block::Code(code) => RawBlock::new(
                kind,
                CodePayload {
                    rich_text: code.text,
                    caption: code.caption,
                    language: code.language,
                },
                Vec::new(),
            ),
            Block::Image(media) | Block::Video(media) => {
                RawBlock::new(kind, FilePayload::from_media(media), Vec::new())
            }
            Block::Toggle(toggle) => RawBlock::new(
                kind,
                TextPayload {
                    rich_text: toggle.summary,
                },
                toggle.children,
            ),
            Block::ChildPage { title } => {
                RawBlock::new(kind, ChildPagePayload { title }, Vec::new())
            }
        }
    }
}
