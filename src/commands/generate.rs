//! Generate static files

use anyhow::Result;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode, DebounceEventResult};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::generator::Generator;
use crate::{Blog, CONFIG_FILE};

/// Generate the static site
pub async fn run(blog: &Blog) -> Result<()> {
    let start = Instant::now();

    let generator = Generator::new(blog)?;
    let stats = generator.generate().await?;

    tracing::info!(
        "Generated {} posts and {} likes sections in {:.2}s",
        stats.posts,
        stats.likes_sections,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Watch the content directory and regenerate on change
pub async fn watch(blog: &Blog) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<DebounceEventResult>();

    let mut debouncer = new_debouncer(Duration::from_millis(500), move |res| {
        let _ = tx.send(res);
    })?;

    if blog.content_dir.exists() {
        debouncer
            .watcher()
            .watch(&blog.content_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", blog.content_dir);
    }

    let config_path = blog.base_dir.join(CONFIG_FILE);
    if config_path.exists() {
        debouncer
            .watcher()
            .watch(&config_path, RecursiveMode::NonRecursive)?;
        tracing::debug!("Watching: {:?}", config_path);
    }

    tracing::info!("Watching for changes. Press Ctrl+C to stop.");

    while let Some(result) = rx.recv().await {
        let events = match result {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Watch error: {:?}", e);
                continue;
            }
        };

        let changed: Vec<_> = events
            .iter()
            .filter(|e| is_relevant(&e.path))
            .collect();
        if changed.is_empty() {
            continue;
        }

        for event in &changed {
            tracing::info!("File changed: {}", event.path.display());
        }

        // Cached pages would hide the edit
        if blog.config.is_development() {
            if let Err(e) = blog.cache().clear() {
                tracing::warn!("Failed to clear cache: {}", e);
            }
        }

        let blog = match Blog::new(&blog.base_dir) {
            Ok(reloaded) => reloaded,
            Err(e) => {
                tracing::error!("Failed to reload config: {}", e);
                continue;
            }
        };
        if let Err(e) = run(&blog).await {
            tracing::error!("Generation failed: {:#}", e);
        }
    }

    Ok(())
}

/// Skip editor and VCS noise
fn is_relevant(path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    !path_str.contains(".git")
        && !path_str.contains(".DS_Store")
        && !path_str.ends_with('~')
        && !path_str.ends_with(".swp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_relevant() {
        assert!(is_relevant(Path::new("content/pages/hello.json")));
        assert!(!is_relevant(Path::new("content/.git/index")));
        assert!(!is_relevant(Path::new("content/pages/hello.json~")));
        assert!(!is_relevant(Path::new("content/pages/.hello.json.swp")));
    }

    #[tokio::test]
    async fn test_run_on_empty_site() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "title: Empty\nenvironment: production\n").unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        run(&blog).await.unwrap();

        assert!(blog.public_dir.join("index.html").exists());
        assert!(blog.public_dir.join("atom.xml").exists());
    }
}
