//! Development server rendering pages per request

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::FetchError;
use crate::generator::Generator;
use crate::Blog;

/// Server state
struct ServerState {
    generator: Generator,
    public_dir: PathBuf,
}

/// Start the development server
pub async fn start(blog: &Blog, ip: &str, port: u16, open: bool) -> Result<()> {
    let generator = Generator::new(blog)?;
    let app = router(generator, blog.public_dir.clone());

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    let url = format!("http://{}:{}", ip, port);
    println!("Server running at {}", url);
    if blog.config.is_development() {
        println!("Development cache: {}", blog.cache_dir.display());
    }
    println!("Press Ctrl+C to stop.");

    if open {
        if let Err(e) = open_browser(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Routes for rendered pages with static files as fallback
pub fn router(generator: Generator, public_dir: PathBuf) -> Router {
    let state = Arc::new(ServerState {
        generator,
        public_dir,
    });

    Router::new()
        .route("/", get(index_handler))
        .route("/posts/:slug", get(post_handler))
        .route("/posts/:slug/", get(post_handler))
        .route("/likes", get(likes_handler))
        .route("/likes/", get(likes_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index_handler(State(state): State<Arc<ServerState>>) -> Response {
    match state.generator.render_index().await {
        Ok(html) => Html(html).into_response(),
        Err(e) => error_response(e),
    }
}

async fn post_handler(
    State(state): State<Arc<ServerState>>,
    Path(slug): Path<String>,
) -> Response {
    match state.generator.render_post(&slug).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => error_response(e),
    }
}

async fn likes_handler(State(state): State<Arc<ServerState>>) -> Response {
    match state.generator.render_likes().await {
        Some(html) => Html(html).into_response(),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Serve generated assets from the public directory
async fn fallback_handler(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
) -> Response {
    let mut service = ServeDir::new(&state.public_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

/// Unknown content answers 404, anything else is a render failure
fn error_response(err: anyhow::Error) -> Response {
    let not_found = err
        .downcast_ref::<FetchError>()
        .map(FetchError::is_not_found)
        .unwrap_or(false);

    if not_found {
        tracing::debug!("Not found: {}", err);
        (StatusCode::NOT_FOUND, "Not found").into_response()
    } else {
        tracing::error!("Render failed: {:#}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Render failed").into_response()
    }
}

/// Open a URL in the default browser
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).spawn()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).spawn()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }

    Ok(())
}
