//! HTTP API handlers for capilar-dash

pub mod buildinfo;
pub mod detail;
pub mod domains;
pub mod error;
pub mod export;
pub mod health;
pub mod products;
pub mod state;
pub mod tracking;
pub mod ui;

pub use buildinfo::get_build_info;
pub use detail::get_detail;
pub use domains::{list_brands, list_domains};
pub use error::ApiError;
pub use export::export_snapshot;
pub use health::health_routes;
pub use products::list_products;
pub use state::{get_state, post_intent};
pub use tracking::list_tracking;
pub use ui::{serve_app_js, serve_index};
