//! UI Routes - HTML page for the psf-search web interface
//!
//! Vanilla HTML/CSS/JS, no frameworks. The page keeps its result list in
//! browser memory; the server stays stateless.
//!
//! - **Root Page** (`root`): search, bulk search and export
//! - **Static Assets** (`static_assets`): CSS/JS served from the binary

use crate::AppState;
use axum::{routing::get, Router};

mod root;
mod static_assets;

use root::root_page;
use static_assets::{serve_app_css, serve_app_js};

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root_page))
        .route("/static/psf.css", get(serve_app_css))
        .route("/static/psf.js", get(serve_app_js))
}
