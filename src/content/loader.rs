//! Content sources - where pages and likes lists come from

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::likes::{MediaItem, MediaKind};
use super::page::{Page, PageSummary};
use crate::cache::DevCache;
use crate::error::{FetchError, FetchResult};

/// Read-only supplier of pages and likes lists
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Summaries of every page, in source order
    async fn list_pages(&self) -> FetchResult<Vec<PageSummary>>;

    /// A page with its blocks
    async fn fetch_page(&self, slug: &str) -> FetchResult<Page>;

    /// Items for one likes list
    async fn fetch_likes(&self, kind: MediaKind) -> FetchResult<Vec<MediaItem>>;
}

/// Reads CMS exports from a content directory:
///
/// ```text
/// content/
///   pages/<slug>.json
///   likes/<kind>.json
/// ```
///
/// Page files are usually named after their slug. Any other `pages/*.json`
/// file is still found by the `slug` field it carries.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Create a source over a content directory
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn pages_dir(&self) -> PathBuf {
        self.root.join("pages")
    }

    fn page_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = WalkDir::new(self.pages_dir())
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && is_json_file(p))
            .collect();
        paths.sort();
        paths
    }

    /// File whose summary carries `slug`, for exports not named after it
    async fn find_page_file(&self, slug: &str) -> FetchResult<Option<PathBuf>> {
        for path in self.page_paths() {
            let what = format!("page {:?}", path);
            let summary = self.read_json::<PageSummary>(&path, &what).await?;
            if summary.slug == slug {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    async fn read_json<T: DeserializeOwned>(&self, path: &Path, what: &str) -> FetchResult<T> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FetchError::NotFound(what.to_string()));
            }
            Err(source) => {
                return Err(FetchError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| FetchError::Parse {
            what: what.to_string(),
            source,
        })
    }
}

#[async_trait]
impl ContentSource for DirectorySource {
    async fn list_pages(&self) -> FetchResult<Vec<PageSummary>> {
        let pages_dir = self.pages_dir();
        if !pages_dir.exists() {
            return Ok(Vec::new());
        }

        let paths = self.page_paths();
        let mut pages = Vec::with_capacity(paths.len());
        for path in paths {
            let what = format!("page {:?}", path);
            pages.push(self.read_json::<PageSummary>(&path, &what).await?);
        }

        tracing::debug!("Listed {} pages from {:?}", pages.len(), pages_dir);
        Ok(pages)
    }

    async fn fetch_page(&self, slug: &str) -> FetchResult<Page> {
        if !is_safe_slug(slug) {
            return Err(FetchError::NotFound(format!("page `{}`", slug)));
        }
        let what = format!("page `{}`", slug);
        let path = self.pages_dir().join(format!("{}.json", slug));
        match self.read_json(&path, &what).await {
            Err(e) if e.is_not_found() => match self.find_page_file(slug).await? {
                Some(path) => {
                    tracing::debug!("Page `{}` found in {:?}", slug, path);
                    self.read_json(&path, &what).await
                }
                None => Err(e),
            },
            result => result,
        }
    }

    async fn fetch_likes(&self, kind: MediaKind) -> FetchResult<Vec<MediaItem>> {
        let path = self.root.join("likes").join(format!("{}.json", kind.as_str()));
        self.read_json(&path, &format!("{} likes", kind)).await
    }
}

/// Wraps a source with the development cache
pub struct CachedSource<S> {
    inner: S,
    cache: DevCache,
}

impl<S: ContentSource> CachedSource<S> {
    pub fn new(inner: S, cache: DevCache) -> Self {
        Self { inner, cache }
    }

    async fn cached<T, F, Fut>(&self, namespace: &str, key: &str, fetch: F) -> FetchResult<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult<T>>,
    {
        if let Some(hit) = self.cache.load(namespace, key).await {
            return Ok(hit);
        }

        let fresh = fetch().await?;
        self.cache.save(namespace, key, &fresh).await;
        Ok(fresh)
    }
}

#[async_trait]
impl<S: ContentSource> ContentSource for CachedSource<S> {
    async fn list_pages(&self) -> FetchResult<Vec<PageSummary>> {
        self.cached("pages", "all", || self.inner.list_pages()).await
    }

    async fn fetch_page(&self, slug: &str) -> FetchResult<Page> {
        self.cached("page", slug, || self.inner.fetch_page(slug))
            .await
    }

    async fn fetch_likes(&self, kind: MediaKind) -> FetchResult<Vec<MediaItem>> {
        self.cached("likes", kind.as_str(), || self.inner.fetch_likes(kind))
            .await
    }
}

fn is_json_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

/// Slugs become file names, so path separators are rejected
fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty() && !slug.contains(['/', '\\']) && slug != "." && slug != ".."
}
