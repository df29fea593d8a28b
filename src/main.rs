//! Binary entry point: load settings, bring up logging and the SQLite store,
//! then drive the Ratatui event loop until the user exits.
use std::sync::Arc;

use anyhow::Result;
use log::{info, warn};
use part_list_manager::logging::init_logging;
use part_list_manager::settings::{data_dir, settings_path};
use part_list_manager::{
    ensure_schema, run_app, App, HttpSearchClient, SearchSession, Settings,
};

fn main() -> Result<()> {
    let path = settings_path()?;
    let settings = Settings::load(&path)?;

    // The app still works without a log file.
    if let Err(err) = init_logging(&data_dir()?, settings.level_filter()) {
        eprintln!("logging disabled: {err:#}");
    }

    let conn = ensure_schema()?;
    let client = HttpSearchClient::new(&settings.api_base_url)?;
    let search = SearchSession::new(Arc::new(client), settings.region_code(), settings.page_size);
    info!("starting with search backend {}", settings.api_base_url);

    let mut app = App::new(conn, settings, Some(path), search)?;
    let result = run_app(&mut app);
    if let Err(err) = &result {
        warn!("exiting with error: {err:#}");
    }
    result
}
