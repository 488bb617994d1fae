//! Image dimension lookups
//!
//! Lookups for the images of one page run concurrently and are all joined
//! before the page renders; any failure aborts the render.

use async_trait::async_trait;
use indexmap::IndexSet;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::config::CloudinaryConfig;
use crate::content::{Block, GroupedBlock};
use crate::error::{FetchError, FetchResult};
use crate::helpers::cloudinary::{insert_segment, is_cloudinary_url};

/// Pixel size of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Resolved dimensions keyed by source URL
pub type MediaIndex = HashMap<String, Dimensions>;

/// Looks up image dimensions
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// `Ok(None)` when the probe has nothing to say about this URL
    async fn dimensions(&self, url: &str) -> FetchResult<Option<Dimensions>>;
}

/// Probe that never resolves anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProbe;

#[async_trait]
impl MediaProbe for NoopProbe {
    async fn dimensions(&self, _url: &str) -> FetchResult<Option<Dimensions>> {
        Ok(None)
    }
}

/// Asks the CDN for image info via the `fl_getinfo` transformation
pub struct CloudinaryProbe {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

#[derive(Deserialize)]
struct InfoResponse {
    input: Dimensions,
}

impl CloudinaryProbe {
    pub fn new(config: CloudinaryConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl MediaProbe for CloudinaryProbe {
    async fn dimensions(&self, url: &str) -> FetchResult<Option<Dimensions>> {
        if !is_cloudinary_url(&self.config, Some(url)) {
            return Ok(None);
        }

        let info_url = insert_segment(&self.config, url, "fl_getinfo");
        if info_url == url {
            return Ok(None);
        }

        let info: InfoResponse = self
            .client
            .get(&info_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!(
            "Probed {}: {}x{}",
            url,
            info.input.width,
            info.input.height
        );
        Ok(Some(info.input))
    }
}

/// Image URLs in render order, including those nested in lists and toggles
pub fn collect_image_urls(blocks: &[GroupedBlock]) -> IndexSet<String> {
    let mut urls = IndexSet::new();
    for block in blocks {
        match block {
            GroupedBlock::Block(block) => collect_from_block(block, &mut urls),
            GroupedBlock::List(list) => {
                for item in &list.items {
                    for child in &item.children {
                        collect_from_block(child, &mut urls);
                    }
                }
            }
        }
    }
    urls
}

fn collect_from_block(block: &Block, urls: &mut IndexSet<String>) {
    match block {
        Block::Image(media) => {
            urls.insert(media.url.clone());
        }
        Block::Toggle(toggle) => {
            for child in &toggle.children {
                collect_from_block(child, urls);
            }
        }
        Block::BulletedListItem(item) | Block::NumberedListItem(item) => {
            for child in &item.children {
                collect_from_block(child, urls);
            }
        }
        Block::Paragraph(_)
        | Block::Heading { .. }
        | Block::Code(_)
        | Block::Quote(_)
        | Block::Video(_)
        | Block::ChildPage { .. } => {}
    }
}

/// Look up every image of a page concurrently
pub async fn probe_media(
    blocks: &[GroupedBlock],
    probe: Arc<dyn MediaProbe>,
) -> FetchResult<MediaIndex> {
    let mut tasks = JoinSet::new();
    for url in collect_image_urls(blocks) {
        let probe = Arc::clone(&probe);
        tasks.spawn(async move {
            let dims = probe.dimensions(&url).await;
            (url, dims)
        });
    }

    let mut index = MediaIndex::new();
    while let Some(joined) = tasks.join_next().await {
        let (url, dims) = joined.map_err(|e| FetchError::Task(e.to_string()))?;
        if let Some(dims) = dims? {
            index.insert(url, dims);
        }
    }

    Ok(index)
}
