//! Static asset handlers, embedded at compile time

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

const APP_CSS: &str = include_str!("../../../static/psf.css");
const APP_JS: &str = include_str!("../../../static/psf.js");

/// GET /static/psf.css
pub async fn serve_app_css() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "text/css"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        APP_CSS,
    )
        .into_response()
}

/// GET /static/psf.js
pub async fn serve_app_js() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "application/javascript"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        APP_JS,
    )
        .into_response()
}
