//! Core library surface for the part list manager.
//!
//! The store (`db`) owns every integrity rule around components, lists and
//! bundles; the UI and the search client only ever go through it.
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod pricing;
pub mod search;
pub mod settings;
pub mod ui;

pub use db::{ensure_schema, fetch_all_list_views, open_store};
pub use error::{store_error, StoreError};
pub use models::{Bundle, BundleWithComponents, Component, ListView, PartList};
pub use search::{HttpSearchClient, SearchClient, SearchSession};
pub use settings::Settings;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
