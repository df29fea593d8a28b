use std::collections::HashSet;

use anyhow::{Context, Result};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::components::{component_from_row, COMPONENT_COLUMNS};
use super::lists::require_list;
use crate::error::StoreError;
use crate::models::{Bundle, BundleWithComponents, Component, NewBundle};

const BUNDLE_COLUMNS: &str = "bundle_id, vendor, name, price, url, image, list_id";

fn bundle_from_row(row: &Row<'_>) -> rusqlite::Result<Bundle> {
    Ok(Bundle {
        id: row.get(0)?,
        vendor: row.get(1)?,
        name: row.get(2)?,
        price: row.get(3)?,
        url: row.get(4)?,
        image: row.get(5)?,
        list_id: row.get(6)?,
    })
}

impl NewBundle {
    /// Every field except the image must carry text.
    pub fn validate(&self) -> Result<(), StoreError> {
        let required = [
            ("name", &self.name),
            ("vendor", &self.vendor),
            ("price", &self.price),
            ("URL", &self.url),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(StoreError::MissingField(field));
            }
        }
        Ok(())
    }
}

/// Turn a selection of direct list members into a new bundle owned by that
/// list. Within one transaction the bundle row is created, each selected
/// component is linked to it, and its direct link to the list is removed.
/// Components never pass through an unreferenced state, so nothing is
/// orphaned if any step fails.
pub fn create_bundle(
    conn: &mut Connection,
    list_id: i64,
    new_bundle: &NewBundle,
    selection: &[String],
) -> Result<Bundle> {
    new_bundle.validate()?;
    let selected: Vec<&String> = {
        let mut seen = HashSet::new();
        selection.iter().filter(|url| seen.insert(*url)).collect()
    };
    if selected.is_empty() {
        return Err(StoreError::EmptySelection.into());
    }

    let tx = conn.transaction().context("failed to begin bundle transaction")?;
    require_list(&tx, list_id)?;

    for url in &selected {
        let linked: bool = tx
            .query_row(
                "SELECT EXISTS(
                     SELECT 1 FROM list_component_link WHERE list_id = ?1 AND component_url = ?2
                 )",
                params![list_id, url],
                |row| row.get(0),
            )
            .context("failed to check list membership")?;
        if !linked {
            return Err(StoreError::SelectionNotInList((*url).clone()).into());
        }
    }

    let image = new_bundle
        .image
        .as_deref()
        .map(str::trim)
        .filter(|image| !image.is_empty());
    tx.execute(
        "INSERT INTO bundles (vendor, name, price, url, image, list_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            new_bundle.vendor.trim(),
            new_bundle.name.trim(),
            new_bundle.price.trim(),
            new_bundle.url.trim(),
            image,
            list_id
        ],
    )
    .context("failed to insert bundle")?;
    let bundle_id = tx.last_insert_rowid();

    for url in &selected {
        tx.execute(
            "INSERT OR IGNORE INTO bundle_component_link (bundle_id, component_url)
             VALUES (?1, ?2)",
            params![bundle_id, url],
        )
        .context("failed to link component to bundle")?;
        tx.execute(
            "DELETE FROM list_component_link WHERE list_id = ?1 AND component_url = ?2",
            params![list_id, url],
        )
        .context("failed to unlink component from list")?;
    }

    tx.commit().context("failed to commit bundle")?;
    debug!(
        "created bundle {bundle_id} in list {list_id} with {} components",
        selected.len()
    );

    Ok(Bundle {
        id: bundle_id,
        vendor: new_bundle.vendor.trim().to_string(),
        name: new_bundle.name.trim().to_string(),
        price: new_bundle.price.trim().to_string(),
        url: new_bundle.url.trim().to_string(),
        image: image.map(str::to_string),
        list_id,
    })
}

pub fn find_bundle(conn: &Connection, bundle_id: i64) -> Result<Option<Bundle>> {
    let sql = format!("SELECT {BUNDLE_COLUMNS} FROM bundles WHERE bundle_id = ?1");
    conn.query_row(&sql, [bundle_id], bundle_from_row)
        .optional()
        .context("failed to load bundle")
}

/// Bundles owned by a list, oldest first.
pub fn fetch_bundles_for_list(conn: &Connection, list_id: i64) -> Result<Vec<Bundle>> {
    let sql = format!("SELECT {BUNDLE_COLUMNS} FROM bundles WHERE list_id = ?1 ORDER BY bundle_id");
    let mut stmt = conn
        .prepare(&sql)
        .context("failed to prepare bundle query")?;

    let bundles = stmt
        .query_map([list_id], bundle_from_row)
        .context("failed to iterate bundles")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect bundles")?;

    Ok(bundles)
}

/// Components linked to a bundle, in the order they were added.
pub fn fetch_bundle_components(conn: &Connection, bundle_id: i64) -> Result<Vec<Component>> {
    let sql = format!(
        "SELECT {COMPONENT_COLUMNS}
         FROM components c
         INNER JOIN bundle_component_link bl ON bl.component_url = c.url
         WHERE bl.bundle_id = ?1
         ORDER BY bl.rowid"
    );
    let mut stmt = conn
        .prepare(&sql)
        .context("failed to prepare bundle components query")?;

    let components = stmt
        .query_map([bundle_id], component_from_row)
        .context("failed to iterate bundle components")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect bundle components")?;

    Ok(components)
}

pub fn fetch_bundle_with_components(
    conn: &Connection,
    bundle_id: i64,
) -> Result<BundleWithComponents> {
    let bundle = find_bundle(conn, bundle_id)?.ok_or(StoreError::BundleNotFound(bundle_id))?;
    let components = fetch_bundle_components(conn, bundle_id)?;
    Ok(BundleWithComponents { bundle, components })
}
