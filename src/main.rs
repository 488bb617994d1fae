//! CLI entry point for folio

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio::helpers::{transform_url, Transformation};

#[derive(Parser)]
#[command(name = "folio")]
#[command(author = "Matt Upham")]
#[command(version)]
#[command(about = "Renders a CMS-backed blog and portfolio", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate static files
    #[command(alias = "g")]
    Generate {
        /// Watch for content changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Start a local server that renders pages on request
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,
    },

    /// Clean the public folder and cache
    Clean,

    /// List site content
    List {
        /// Type of content to list (posts, likes)
        #[arg(default_value = "posts")]
        r#type: String,
    },

    /// Validate page metadata in the public folder
    Check {
        /// Send a notification with the result
        #[arg(short, long)]
        notify: bool,
    },

    /// Print the CDN delivery URL for an image
    Cloudinary {
        /// Image URL
        url: String,

        /// Requested width in pixels
        #[arg(short, long)]
        width: Option<u32>,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug { "folio=debug,info" } else { "folio=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };

    match cli.command {
        Commands::Generate { watch } => {
            let blog = folio::Blog::new(&base_dir)?;
            tracing::info!("Generating static files...");

            blog.generate().await?;
            println!("Generated successfully!");

            if watch {
                tracing::info!("Watching for file changes...");
                folio::commands::generate::watch(&blog).await?;
            }
        }

        Commands::Server { port, ip, open } => {
            let blog = folio::Blog::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            folio::server::start(&blog, &ip, port, open).await?;
        }

        Commands::Clean => {
            let blog = folio::Blog::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let blog = folio::Blog::new(&base_dir)?;
            folio::commands::list::run(&blog, &r#type).await?;
        }

        Commands::Check { notify } => {
            let blog = folio::Blog::new(&base_dir)?;
            folio::commands::check::run(&blog, notify).await?;
        }

        Commands::Cloudinary { url, width } => {
            let blog = folio::Blog::new(&base_dir)?;
            let cloudinary = &blog.config.cloudinary;
            let width = width.unwrap_or(cloudinary.image_width);
            if !folio::helpers::is_cloudinary_url(cloudinary, Some(url.as_str())) {
                tracing::warn!("Not an accepted CDN image: {}", url);
            }
            println!(
                "{}",
                transform_url(cloudinary, &url, Transformation::width(width))
            );
        }

        Commands::Version => {
            println!("folio version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
