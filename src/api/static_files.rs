//! Embedded static assets served under `/static/`

use axum::{
    extract::Path,
    http::header,
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

use crate::api::error::WebError;

#[derive(RustEmbed)]
#[folder = "static/"]
struct StaticAssets;

/// `GET /static/{*path}`
pub async fn serve_static(Path(path): Path<String>) -> Response {
    let asset_path = path.trim_start_matches('/');

    match StaticAssets::get(asset_path) {
        Some(content) => (
            [
                (header::CONTENT_TYPE, get_content_type(asset_path)),
                (header::CACHE_CONTROL, "public, max-age=3600"),
            ],
            content.data.into_owned(),
        )
            .into_response(),
        None => WebError::NotFound(format!("static file {}", asset_path)).into_response(),
    }
}

/// Get content type from file extension
fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "css" => "text/css",
        "js" => "application/javascript",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
