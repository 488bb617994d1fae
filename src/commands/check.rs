//! Validate metadata of generated pages

use anyhow::{bail, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::CloudinaryConfig;
use crate::helpers::full_url_for;
use crate::notify::{resolve_priority, Notification, Notifier, Outcome};
use crate::seo::{extract_meta, validate_meta, MetaIssue};
use crate::Blog;

/// Issues found in one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub path: PathBuf,
    pub issues: Vec<MetaIssue>,
}

/// Result of checking a whole output directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub pages: usize,
    pub flagged: Vec<PageReport>,
}

impl CheckReport {
    pub fn errors(&self) -> usize {
        self.count(|issue| issue.is_error())
    }

    pub fn warnings(&self) -> usize {
        self.count(|issue| !issue.is_error())
    }

    fn count(&self, pred: impl Fn(&MetaIssue) -> bool) -> usize {
        self.flagged
            .iter()
            .flat_map(|page| page.issues.iter())
            .filter(|issue| pred(*issue))
            .count()
    }

    pub fn outcome(&self) -> Outcome {
        if self.errors() > 0 {
            Outcome::Failure
        } else if self.warnings() > 0 {
            Outcome::Warnings
        } else {
            Outcome::Success
        }
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "Checked {} pages: {} errors, {} warnings",
            self.pages,
            self.errors(),
            self.warnings()
        )
    }
}

/// Check generated pages, report, and optionally notify
pub async fn run(blog: &Blog, notify: bool) -> Result<()> {
    if !blog.public_dir.exists() {
        bail!(
            "Nothing to check: {:?} does not exist, run `folio generate` first",
            blog.public_dir
        );
    }

    let report = check_dir(&blog.public_dir, &blog.config.cloudinary)?;
    for page in &report.flagged {
        println!("{}", page.path.display());
        for issue in &page.issues {
            let level = if issue.is_error() { "error" } else { "warning" };
            println!("  {}: {}", level, issue);
        }
    }
    println!("{}", report.summary());

    let outcome = report.outcome();
    if notify {
        let notification = Notification {
            title: format!("{}: check {}", blog.config.notify.title, outcome),
            message: report.summary(),
            url: Some(full_url_for(&blog.config, "/")),
            url_title: Some(blog.config.title.clone()),
            priority: resolve_priority(outcome, blog.config.notify.priority),
        };
        // Delivery problems never change the check result
        match Notifier::new(&blog.config.notify) {
            Ok(notifier) => {
                if let Err(e) = notifier.send(&notification).await {
                    tracing::warn!("Failed to send notification: {}", e);
                }
            }
            Err(e) => tracing::warn!("Notification skipped: {}", e),
        }
    }

    if outcome == Outcome::Failure {
        bail!("{}", report.summary());
    }
    Ok(())
}

/// Validate every HTML page under `dir`
pub fn check_dir(dir: &Path, cloudinary: &CloudinaryConfig) -> Result<CheckReport> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext == "html"))
        .collect();
    paths.sort();

    let mut report = CheckReport {
        pages: paths.len(),
        flagged: Vec::new(),
    };

    for path in paths {
        let html = fs::read_to_string(&path)?;
        let issues = validate_meta(&extract_meta(&html), cloudinary);
        tracing::debug!("Checked {:?}: {} issues", path, issues.len());
        if !issues.is_empty() {
            let path = path.strip_prefix(dir).unwrap_or(&path).to_path_buf();
            report.flagged.push(PageReport { path, issues });
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::seo::PageMeta;
    use tempfile::TempDir;

    fn write_page(dir: &Path, rel: &str, meta: &PageMeta) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            path,
            format!(
                "<html><head>{}</head></html>",
                meta.render(&SiteConfig::default())
            ),
        )
        .unwrap();
    }

    fn good() -> PageMeta {
        PageMeta {
            title: "Hello".to_string(),
            description: "A post".to_string(),
            url: "http://example.com/".to_string(),
            ..PageMeta::default()
        }
    }

    #[test]
    fn test_clean_site_passes() {
        let dir = TempDir::new().unwrap();
        write_page(dir.path(), "index.html", &good());
        write_page(dir.path(), "posts/hello/index.html", &good());
        fs::write(dir.path().join("atom.xml"), "<feed/>").unwrap();

        let report = check_dir(dir.path(), &CloudinaryConfig::default()).unwrap();
        assert_eq!(report.pages, 2);
        assert!(report.flagged.is_empty());
        assert_eq!(report.outcome(), Outcome::Success);
    }

    #[test]
    fn test_issues_are_reported_per_page() {
        let dir = TempDir::new().unwrap();
        write_page(dir.path(), "index.html", &good());

        let mut long = good();
        long.description = "d".repeat(200);
        write_page(dir.path(), "posts/long/index.html", &long);

        let report = check_dir(dir.path(), &CloudinaryConfig::default()).unwrap();
        assert_eq!(report.flagged.len(), 1);
        assert_eq!(report.flagged[0].path, Path::new("posts/long/index.html"));
        assert_eq!(report.outcome(), Outcome::Warnings);

        let mut bad = good();
        bad.image = Some("https://images.example.com/a.jpg".to_string());
        write_page(dir.path(), "posts/bad/index.html", &bad);

        let report = check_dir(dir.path(), &CloudinaryConfig::default()).unwrap();
        assert_eq!(report.errors(), 1);
        assert_eq!(report.warnings(), 1);
        assert_eq!(report.outcome(), Outcome::Failure);
        assert_eq!(report.summary(), "Checked 3 pages: 1 errors, 1 warnings");
    }

    #[tokio::test]
    async fn test_run_fails_on_errors() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::with_config(dir.path().to_path_buf(), SiteConfig::default());
        assert!(run(&blog, false).await.is_err());

        write_page(&blog.public_dir, "index.html", &good());
        run(&blog, false).await.unwrap();

        write_page(&blog.public_dir, "posts/x/index.html", &PageMeta::default());
        assert!(run(&blog, false).await.is_err());
    }
}
