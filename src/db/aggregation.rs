use anyhow::{Context, Result};
use rusqlite::Connection;

use super::bundles::{fetch_bundle_components, fetch_bundles_for_list};
use super::components::{component_from_row, COMPONENT_COLUMNS};
use super::lists::{fetch_lists, find_list_by_name, require_list};
use crate::error::StoreError;
use crate::models::{BundleWithComponents, Component, ListView, PartList};

/// Components linked directly to a list, in the order they were added.
pub fn fetch_list_components(conn: &Connection, list_id: i64) -> Result<Vec<Component>> {
    let sql = format!(
        "SELECT {COMPONENT_COLUMNS}
         FROM components c
         INNER JOIN list_component_link ll ON ll.component_url = c.url
         WHERE ll.list_id = ?1
         ORDER BY ll.rowid"
    );
    let mut stmt = conn
        .prepare(&sql)
        .context("failed to prepare list components query")?;

    let components = stmt
        .query_map([list_id], component_from_row)
        .context("failed to iterate list components")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect list components")?;

    Ok(components)
}

/// Build the display view of a list straight from the store. Nothing is
/// cached: callers re-query after every mutation.
pub fn list_view(conn: &Connection, list_id: i64) -> Result<ListView> {
    let list = require_list(conn, list_id)?;
    assemble(conn, list)
}

pub fn list_view_by_name(conn: &Connection, name: &str) -> Result<ListView> {
    let list = find_list_by_name(conn, name)?
        .ok_or_else(|| StoreError::ListNameNotFound(name.to_string()))?;
    assemble(conn, list)
}

/// Views for every list, used by the overview screen for counts and totals.
pub fn fetch_all_list_views(conn: &Connection) -> Result<Vec<ListView>> {
    fetch_lists(conn)?
        .into_iter()
        .map(|list| assemble(conn, list))
        .collect()
}

fn assemble(conn: &Connection, list: PartList) -> Result<ListView> {
    let components = fetch_list_components(conn, list.id)?;
    let bundles = fetch_bundles_for_list(conn, list.id)?
        .into_iter()
        .map(|bundle| -> Result<BundleWithComponents> {
            let components = fetch_bundle_components(conn, bundle.id)?;
            Ok(BundleWithComponents { bundle, components })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ListView {
        list,
        components,
        bundles,
    })
}
