//! Site configuration (folio.yml)

use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::content::MediaKind;

/// Build environment. The content cache is only used in development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub content_dir: String,
    pub public_dir: String,
    pub cache_dir: String,

    pub environment: Environment,
    /// Cache entries older than this many seconds are refetched
    pub cache_max_age: Option<u64>,

    /// Number of posts in the Atom feed
    pub feed_limit: usize,

    #[serde(default)]
    pub cloudinary: CloudinaryConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub likes: LikesConfig,
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Keys folio does not recognize, reported when loading
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "folio".to_string(),
            description: String::new(),
            author: "John Doe".to_string(),
            language: "en".to_string(),
            timezone: String::new(),

            url: "http://example.com".to_string(),
            root: "/".to_string(),

            content_dir: "content".to_string(),
            public_dir: "public".to_string(),
            cache_dir: ".folio-cache".to_string(),

            environment: Environment::default(),
            cache_max_age: None,

            feed_limit: 20,

            cloudinary: CloudinaryConfig::default(),
            highlight: HighlightConfig::default(),
            likes: LikesConfig::default(),
            notify: NotifyConfig::default(),

            unknown: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        for key in config.unknown_keys() {
            tracing::warn!("Ignoring unknown key {:?} in {:?}", key, path.as_ref());
        }
        Ok(config)
    }

    /// Top-level keys that match no setting, usually typos
    pub fn unknown_keys(&self) -> Vec<&str> {
        self.unknown.keys().map(String::as_str).collect()
    }

    /// Apply overrides from `FOLIO_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(env) = var("FOLIO_ENV") {
            match env.to_lowercase().as_str() {
                "development" | "dev" => self.environment = Environment::Development,
                "production" | "prod" => self.environment = Environment::Production,
                other => tracing::warn!("Ignoring unknown FOLIO_ENV value: {}", other),
            }
        }
        if let Some(token) = var("FOLIO_NOTIFY_TOKEN") {
            self.notify.token = Some(token);
        }
        if let Some(user) = var("FOLIO_NOTIFY_USER") {
            self.notify.user = Some(user);
        }
    }

    /// Whether the development cache is active
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Time zone used for displayed dates (UTC when unset)
    pub fn tz(&self) -> Result<Tz> {
        if self.timezone.is_empty() {
            return Ok(Tz::UTC);
        }
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("Invalid timezone {:?}: {}", self.timezone, e))
    }
}

/// Image CDN configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudinaryConfig {
    pub host: String,
    /// Path segments an image must live under to be accepted
    pub folders: Vec<String>,
    /// Width requested for inline images
    pub image_width: u32,
    /// Width requested for likes thumbnails
    pub thumbnail_width: u32,
    /// Look up image dimensions while rendering
    pub probe: bool,
}

impl Default for CloudinaryConfig {
    fn default() -> Self {
        Self {
            host: "res.cloudinary.com".to_string(),
            folders: vec!["/mu/".to_string(), "/fetch/".to_string()],
            image_width: 1200,
            thumbnail_width: 200,
            probe: false,
        }
    }
}

/// Syntax highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: true,
        }
    }
}

/// Likes page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LikesConfig {
    pub enable: bool,
    pub kinds: Vec<MediaKind>,
}

impl Default for LikesConfig {
    fn default() -> Self {
        Self {
            enable: true,
            kinds: MediaKind::ALL.to_vec(),
        }
    }
}

/// Push notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub endpoint: String,
    pub title: String,
    pub token: Option<String>,
    pub user: Option<String>,
    /// Explicit priority (-2..=2) overriding the outcome-based one
    pub priority: Option<i8>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.pushover.net/1/messages.json".to_string(),
            title: "folio".to_string(),
            token: None,
            user: None,
            priority: None,
        }
    }
}
