//! HTTP API handlers for psf-search

pub mod bulk;
pub mod export;
pub mod health;
pub mod search;
pub mod sources;
pub mod ui;

pub use bulk::bulk_routes;
pub use export::export_routes;
pub use health::health_routes;
pub use search::search_routes;
pub use sources::source_routes;
pub use ui::ui_routes;
