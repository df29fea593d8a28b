use anyhow::{Context, Result};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::StoreError;
use crate::models::{ListIcon, PartList};

fn list_from_row(row: &Row<'_>) -> rusqlite::Result<PartList> {
    Ok(PartList {
        id: row.get(0)?,
        name: row.get(1)?,
        icon: ListIcon::from_id(row.get(2)?),
    })
}

/// Retrieve every list in creation order.
pub fn fetch_lists(conn: &Connection) -> Result<Vec<PartList>> {
    let mut stmt = conn
        .prepare("SELECT id, name, icon FROM lists ORDER BY id")
        .context("failed to prepare list query")?;

    let lists = stmt
        .query_map([], list_from_row)
        .context("failed to load lists")?
        .collect::<Result<Vec<_>, _>>()
        .context("failed to collect lists")?;

    Ok(lists)
}

/// Insert a new list, returning the hydrated struct so the caller can push it
/// straight into the in-memory list.
pub fn create_list(conn: &Connection, name: &str, icon: ListIcon) -> Result<PartList> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::MissingField("name").into());
    }

    conn.execute(
        "INSERT INTO lists (name, icon) VALUES (?1, ?2)",
        params![name, icon.id()],
    )
    .context("failed to insert list")?;

    let id = conn.last_insert_rowid();
    debug!("created list {id} ({name})");
    Ok(PartList {
        id,
        name: name.to_string(),
        icon,
    })
}

pub fn find_list(conn: &Connection, id: i64) -> Result<Option<PartList>> {
    conn.query_row(
        "SELECT id, name, icon FROM lists WHERE id = ?1",
        [id],
        list_from_row,
    )
    .optional()
    .context("failed to load list")
}

/// Look a list up by name. Names are not unique in the schema, so the oldest
/// match wins.
pub fn find_list_by_name(conn: &Connection, name: &str) -> Result<Option<PartList>> {
    conn.query_row(
        "SELECT id, name, icon FROM lists WHERE name = ?1 ORDER BY id LIMIT 1",
        [name],
        list_from_row,
    )
    .optional()
    .context("failed to load list by name")
}

/// Update the name and icon of an existing list.
pub fn rename_list(conn: &Connection, id: i64, name: &str, icon: ListIcon) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::MissingField("name").into());
    }

    let updated = conn
        .execute(
            "UPDATE lists SET name = ?1, icon = ?2 WHERE id = ?3",
            params![name, icon.id(), id],
        )
        .context("failed to update list")?;

    if updated == 0 {
        Err(StoreError::ListNotFound(id).into())
    } else {
        Ok(())
    }
}

pub(crate) fn require_list(conn: &Connection, id: i64) -> Result<PartList> {
    find_list(conn, id)?.ok_or_else(|| StoreError::ListNotFound(id).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::error::store_error;

    #[test]
    fn create_and_fetch_lists() {
        let conn = open_in_memory().unwrap();
        let first = create_list(&conn, "  Build A ", ListIcon::Computer).unwrap();
        let second = create_list(&conn, "Office", ListIcon::Office).unwrap();

        assert_eq!(first.name, "Build A");
        let lists = fetch_lists(&conn).unwrap();
        assert_eq!(lists, vec![first.clone(), second]);
        assert_eq!(find_list(&conn, first.id).unwrap(), Some(first));
    }

    #[test]
    fn blank_names_are_rejected() {
        let conn = open_in_memory().unwrap();
        let err = create_list(&conn, "   ", ListIcon::House).unwrap_err();
        assert_eq!(store_error(&err), Some(&StoreError::MissingField("name")));
        assert!(fetch_lists(&conn).unwrap().is_empty());
    }

    #[test]
    fn duplicate_names_resolve_to_oldest() {
        let conn = open_in_memory().unwrap();
        let first = create_list(&conn, "Same", ListIcon::Computer).unwrap();
        create_list(&conn, "Same", ListIcon::Server).unwrap();

        let found = find_list_by_name(&conn, "Same").unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert!(find_list_by_name(&conn, "Other").unwrap().is_none());
    }

    #[test]
    fn rename_updates_or_reports_missing() {
        let conn = open_in_memory().unwrap();
        let list = create_list(&conn, "Old", ListIcon::Computer).unwrap();
        rename_list(&conn, list.id, "New", ListIcon::Headset).unwrap();

        let stored = find_list(&conn, list.id).unwrap().unwrap();
        assert_eq!(stored.name, "New");
        assert_eq!(stored.icon, ListIcon::Headset);

        let err = rename_list(&conn, 999, "X", ListIcon::Computer).unwrap_err();
        assert_eq!(store_error(&err), Some(&StoreError::ListNotFound(999)));
    }
}
