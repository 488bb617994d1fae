//! folio: renders a CMS-backed blog and portfolio
//!
//! Pages arrive as flat block lists from a content source, are normalized
//! into a render tree and written out as static HTML, or served per request
//! during development.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod notify;
pub mod render;
pub mod seo;
pub mod server;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::DevCache;
use crate::content::{CachedSource, ContentSource, DirectorySource};
use crate::render::{CloudinaryProbe, CodeHighlighter, MediaProbe, NoopProbe};

/// Name of the site configuration file
pub const CONFIG_FILE: &str = "folio.yml";

/// The main application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Content export directory
    pub content_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Development cache directory
    pub cache_dir: PathBuf,
}

impl Blog {
    /// Create a new instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create an instance from an already loaded configuration
    pub fn with_config(base_dir: PathBuf, config: config::SiteConfig) -> Self {
        let content_dir = base_dir.join(&config.content_dir);
        let public_dir = base_dir.join(&config.public_dir);
        let cache_dir = base_dir.join(&config.cache_dir);

        Self {
            config,
            base_dir,
            content_dir,
            public_dir,
            cache_dir,
        }
    }

    /// The development cache
    pub fn cache(&self) -> DevCache {
        DevCache::on_disk(&self.cache_dir)
            .with_max_age(self.config.cache_max_age.map(Duration::from_secs))
    }

    /// Content source, cached in development
    pub fn source(&self) -> Arc<dyn ContentSource> {
        let source = DirectorySource::new(&self.content_dir);
        if self.config.is_development() {
            tracing::debug!("Using development cache at {:?}", self.cache_dir);
            Arc::new(CachedSource::new(source, self.cache()))
        } else {
            Arc::new(source)
        }
    }

    /// Image dimension probe, if enabled
    pub fn probe(&self) -> Result<Arc<dyn MediaProbe>> {
        if self.config.cloudinary.probe {
            Ok(Arc::new(CloudinaryProbe::new(self.config.cloudinary.clone())?))
        } else {
            Ok(Arc::new(NoopProbe))
        }
    }

    /// Code highlighter from the highlight settings
    pub fn highlighter(&self) -> CodeHighlighter {
        CodeHighlighter::with_options(
            &self.config.highlight.theme,
            self.config.highlight.line_number,
        )
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory and cache
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_blog_paths_follow_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "title: Notes\ncontent_dir: export\npublic_dir: dist\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "Notes");
        assert_eq!(blog.content_dir, dir.path().join("export"));
        assert_eq!(blog.public_dir, dir.path().join("dist"));
        assert_eq!(blog.cache_dir, dir.path().join(".folio-cache"));
    }

    #[test]
    fn test_blog_defaults_without_config() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::with_config(dir.path().to_path_buf(), config::SiteConfig::default());
        assert_eq!(blog.content_dir, dir.path().join("content"));
        assert!(blog.probe().is_ok());
    }
}
