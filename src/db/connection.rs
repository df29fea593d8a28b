use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use rusqlite::Connection;

use crate::settings::data_dir;

/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "parts.sqlite";

/// Open the database in the user's data directory, creating it on first run.
pub fn ensure_schema() -> Result<Connection> {
    let db_path = data_dir()?.join(DB_FILE_NAME);
    open_store(&db_path)
}

/// Open (or create) a store at an explicit path and bring the schema up to
/// date.
pub fn open_store(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(path).context("failed to open SQLite database")?;
    init_schema(&conn)?;
    info!("opened part store at {}", path.display());
    Ok(conn)
}

/// Fresh store that lives only as long as the connection. Used by tests and
/// handy for throwaway sessions.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Create every table if it is missing. Link tables reference their parents
/// without `ON DELETE CASCADE`: cascades are performed explicitly by the
/// membership functions, and the foreign keys make the store refuse any
/// delete that would leave a dangling link.
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign keys")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS components (
            url TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            price TEXT NOT NULL,
            image TEXT,
            custom_vendor TEXT,
            custom_price TEXT,
            custom_url TEXT
        )",
        [],
    )
    .context("failed to create components table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS lists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            icon INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )
    .context("failed to create lists table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS bundles (
            bundle_id INTEGER PRIMARY KEY AUTOINCREMENT,
            vendor TEXT NOT NULL,
            name TEXT NOT NULL,
            price TEXT NOT NULL,
            url TEXT NOT NULL,
            image TEXT,
            list_id INTEGER NOT NULL,
            FOREIGN KEY(list_id) REFERENCES lists(id)
        )",
        [],
    )
    .context("failed to create bundles table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS list_component_link (
            list_id INTEGER NOT NULL,
            component_url TEXT NOT NULL,
            PRIMARY KEY (list_id, component_url),
            FOREIGN KEY(list_id) REFERENCES lists(id),
            FOREIGN KEY(component_url) REFERENCES components(url)
        )",
        [],
    )
    .context("failed to create list_component_link table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS bundle_component_link (
            bundle_id INTEGER NOT NULL,
            component_url TEXT NOT NULL,
            PRIMARY KEY (bundle_id, component_url),
            FOREIGN KEY(bundle_id) REFERENCES bundles(bundle_id),
            FOREIGN KEY(component_url) REFERENCES components(url)
        )",
        [],
    )
    .context("failed to create bundle_component_link table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_list_link_component
         ON list_component_link(component_url)",
        [],
    )
    .context("failed to index list links")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_bundle_link_component
         ON bundle_component_link(component_url)",
        [],
    )
    .context("failed to index bundle links")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_bundles_list ON bundles(list_id)",
        [],
    )
    .context("failed to index bundles")?;

    Ok(())
}
