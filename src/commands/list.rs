//! List site content

use anyhow::Result;
use std::fmt::Write;

use crate::content::{published_newest_first, ContentSource, MediaKind};
use crate::Blog;

/// List site content by type
pub async fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let source = blog.source();
    print!("{}", inventory(source.as_ref(), content_type).await?);
    Ok(())
}

/// Render the listing for one content type
pub async fn inventory(source: &dyn ContentSource, content_type: &str) -> Result<String> {
    let mut out = String::new();

    match content_type {
        "post" | "posts" => {
            let all = source.list_pages().await?;
            let drafts = all.iter().filter(|p| !p.published).count();
            let posts = published_newest_first(all);
            writeln!(out, "Posts ({}, {} unpublished):", posts.len(), drafts)?;
            for post in posts {
                let date = post.created.get(..10).unwrap_or(&post.created);
                writeln!(out, "  {} - {} [{}]", date, post.title, post.slug)?;
            }
        }
        "like" | "likes" => {
            for kind in MediaKind::ALL {
                match source.fetch_likes(kind).await {
                    Ok(items) => {
                        writeln!(out, "{} ({}):", kind.title(), items.len())?;
                        for item in items {
                            match item.year {
                                Some(year) => writeln!(out, "  {} ({})", item.title, year)?,
                                None => writeln!(out, "  {}", item.title)?,
                            }
                        }
                    }
                    Err(e) if e.is_not_found() => writeln!(out, "{} (none)", kind.title())?,
                    Err(e) => return Err(e.into()),
                }
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: posts, likes",
                content_type
            );
        }
    }

    Ok(out)
}
