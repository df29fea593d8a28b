use anyhow::{Context, Result};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::StoreError;
use crate::models::{Component, ComponentOverrides};

/// Column list shared by every component query so `component_from_row` can
/// rely on positional access.
pub(crate) const COMPONENT_COLUMNS: &str =
    "c.url, c.name, c.price, c.image, c.custom_vendor, c.custom_price, c.custom_url";

pub(crate) fn component_from_row(row: &Row<'_>) -> rusqlite::Result<Component> {
    Ok(Component {
        url: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        image: row.get(3)?,
        overrides: ComponentOverrides {
            vendor: row.get(4)?,
            price: row.get(5)?,
            url: row.get(6)?,
        },
    })
}

/// Insert a component or refresh an existing row with the same URL. Name,
/// price and image are last-write-wins. Overrides are only replaced when the
/// incoming value carries them, so re-adding a part from search does not wipe
/// a price the user typed in.
pub(crate) fn upsert_component(conn: &Connection, component: &Component) -> Result<()> {
    conn.execute(
        "INSERT INTO components (url, name, price, image, custom_vendor, custom_price, custom_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(url) DO UPDATE SET
             name = excluded.name,
             price = excluded.price,
             image = excluded.image,
             custom_vendor = COALESCE(excluded.custom_vendor, components.custom_vendor),
             custom_price = COALESCE(excluded.custom_price, components.custom_price),
             custom_url = COALESCE(excluded.custom_url, components.custom_url)",
        params![
            component.url,
            component.name,
            component.price,
            component.image,
            component.overrides.vendor,
            component.overrides.price,
            component.overrides.url,
        ],
    )
    .context("failed to upsert component")?;
    debug!("upserted component {}", component.url);
    Ok(())
}

pub fn find_component(conn: &Connection, url: &str) -> Result<Option<Component>> {
    let sql = format!("SELECT {COMPONENT_COLUMNS} FROM components c WHERE c.url = ?1");
    conn.query_row(&sql, [url], component_from_row)
        .optional()
        .context("failed to load component")
}

/// Every stored component, ordered by name for browsing.
pub fn fetch_all_components(conn: &Connection) -> Result<Vec<Component>> {
    let sql = format!("SELECT {COMPONENT_COLUMNS} FROM components c ORDER BY c.name COLLATE NOCASE");
    let mut stmt = conn
        .prepare(&sql)
        .context("failed to prepare component query")?;

    let components = stmt
        .query_map([], component_from_row)
        .context("failed to iterate components")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect components")?;

    Ok(components)
}

/// Replace the user overrides for a component. Blank strings are stored as
/// `NULL` so clearing a field in the form clears the override.
pub fn update_component_overrides(
    conn: &Connection,
    url: &str,
    overrides: &ComponentOverrides,
) -> Result<()> {
    let updated = conn
        .execute(
            "UPDATE components SET custom_vendor = ?1, custom_price = ?2, custom_url = ?3
             WHERE url = ?4",
            params![
                non_blank(&overrides.vendor),
                non_blank(&overrides.price),
                non_blank(&overrides.url),
                url
            ],
        )
        .context("failed to update component overrides")?;

    if updated == 0 {
        Err(StoreError::ComponentNotFound(url.to_string()).into())
    } else {
        debug!("updated overrides for {url}");
        Ok(())
    }
}

/// Number of lists that directly contain the component.
pub fn count_list_refs(conn: &Connection, url: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM list_component_link WHERE component_url = ?1",
        [url],
        |row| row.get(0),
    )
    .context("failed to count list references")
}

/// Number of bundles that contain the component.
pub fn count_bundle_refs(conn: &Connection, url: &str) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM bundle_component_link WHERE component_url = ?1",
        [url],
        |row| row.get(0),
    )
    .context("failed to count bundle references")
}

/// A component is orphaned when neither link table references it. This is the
/// only test used to decide whether a component row may be removed.
pub fn is_orphaned(conn: &Connection, url: &str) -> Result<bool> {
    Ok(count_list_refs(conn, url)? == 0 && count_bundle_refs(conn, url)? == 0)
}

/// Delete the component row when nothing references it any more. Returns
/// whether a row was removed.
pub(crate) fn delete_component_if_orphaned(conn: &Connection, url: &str) -> Result<bool> {
    if !is_orphaned(conn, url)? {
        return Ok(false);
    }

    let deleted = conn
        .execute("DELETE FROM components WHERE url = ?1", [url])
        .context("failed to delete component")?;
    if deleted > 0 {
        debug!("deleted orphaned component {url}");
    }
    Ok(deleted > 0)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn cpu() -> Component {
        let mut component = Component::new("https://pcpp/cpu", "Ryzen 7", "$299.99");
        component.image = Some("https://img/cpu.png".to_string());
        component
    }

    #[test]
    fn upsert_replaces_shared_fields() {
        let conn = open_in_memory().unwrap();
        upsert_component(&conn, &cpu()).unwrap();

        let mut newer = cpu();
        newer.price = "$279.99".to_string();
        newer.image = None;
        upsert_component(&conn, &newer).unwrap();

        let stored = find_component(&conn, "https://pcpp/cpu").unwrap().unwrap();
        assert_eq!(stored.price, "$279.99");
        assert_eq!(stored.image, None);
        assert_eq!(fetch_all_components(&conn).unwrap().len(), 1);
    }

    #[test]
    fn upsert_keeps_overrides_unless_replaced() {
        let conn = open_in_memory().unwrap();
        upsert_component(&conn, &cpu()).unwrap();
        update_component_overrides(
            &conn,
            "https://pcpp/cpu",
            &ComponentOverrides {
                vendor: Some("Local Shop".to_string()),
                price: Some("$250".to_string()),
                url: None,
            },
        )
        .unwrap();

        upsert_component(&conn, &cpu()).unwrap();
        let stored = find_component(&conn, "https://pcpp/cpu").unwrap().unwrap();
        assert_eq!(stored.overrides.price.as_deref(), Some("$250"));
        assert_eq!(stored.overrides.vendor.as_deref(), Some("Local Shop"));

        let mut with_override = cpu();
        with_override.overrides.price = Some("$240".to_string());
        upsert_component(&conn, &with_override).unwrap();
        let stored = find_component(&conn, "https://pcpp/cpu").unwrap().unwrap();
        assert_eq!(stored.overrides.price.as_deref(), Some("$240"));
    }

    #[test]
    fn blank_overrides_are_cleared() {
        let conn = open_in_memory().unwrap();
        upsert_component(&conn, &cpu()).unwrap();
        update_component_overrides(
            &conn,
            "https://pcpp/cpu",
            &ComponentOverrides {
                vendor: Some("  ".to_string()),
                price: Some("$1".to_string()),
                url: Some(String::new()),
            },
        )
        .unwrap();

        let stored = find_component(&conn, "https://pcpp/cpu").unwrap().unwrap();
        assert_eq!(stored.overrides.vendor, None);
        assert_eq!(stored.overrides.url, None);
        assert_eq!(stored.overrides.price.as_deref(), Some("$1"));
    }

    #[test]
    fn overriding_missing_component_reports_not_found() {
        let conn = open_in_memory().unwrap();
        let err = update_component_overrides(&conn, "missing", &ComponentOverrides::default())
            .unwrap_err();
        assert_eq!(
            crate::error::store_error(&err),
            Some(&StoreError::ComponentNotFound("missing".to_string()))
        );
    }

    #[test]
    fn unreferenced_component_is_orphaned() {
        let conn = open_in_memory().unwrap();
        upsert_component(&conn, &cpu()).unwrap();
        assert!(is_orphaned(&conn, "https://pcpp/cpu").unwrap());
        assert!(delete_component_if_orphaned(&conn, "https://pcpp/cpu").unwrap());
        assert!(find_component(&conn, "https://pcpp/cpu").unwrap().is_none());
    }
}
