//! Static landing page served at the root path.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;

/// Cache duration for the landing page (no cache, always revalidate)
const NO_CACHE: &str = "no-cache";

#[derive(Embed)]
#[folder = "static/"]
struct StaticAssets;

/// Serve the embedded `index.html`.
pub async fn index_handler() -> Response {
    match StaticAssets::get("index.html") {
        Some(file) => (
            [
                (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                (header::CACHE_CONTROL, NO_CACHE),
            ],
            file.data.into_owned(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
