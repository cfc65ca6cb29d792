use axum::Router;
use log::{ info, warn };
use std::path::Path;
use tower_http::services::{ ServeDir, ServeFile };

/// `/` answers with the client's entry page; other unmatched paths are looked
/// up in `dir` and 404 when absent.
pub fn static_routes<S>(dir: &Path) -> Router<S> where S: Clone + Send + Sync + 'static {
    if dir.is_dir() {
        info!("Serving web client from: {}", dir.display());
    } else {
        warn!("Static asset directory '{}' not found; only API routes will answer", dir.display());
    }

    Router::new()
        .route_service("/", ServeFile::new(dir.join("index.html")))
        .fallback_service(ServeDir::new(dir))
}
