//! Reference-counted maintenance of component membership. A component row
//! exists exactly while at least one list link or bundle link points at it;
//! every function here runs as one transaction and finishes with the shared
//! orphan check from `components::delete_component_if_orphaned`.

use anyhow::{Context, Result};
use log::debug;
use rusqlite::{params, Connection};

use super::bundles::fetch_bundle_components;
use super::components::{delete_component_if_orphaned, upsert_component};
use super::lists::require_list;
use crate::error::StoreError;
use crate::models::Component;

/// Store (or refresh) the component and link it directly to the list.
/// Adding a component the list already holds is a no-op for the link.
pub fn add_component_to_list(
    conn: &mut Connection,
    list_id: i64,
    component: &Component,
) -> Result<()> {
    let tx = conn.transaction().context("failed to begin add transaction")?;
    require_list(&tx, list_id)?;
    upsert_component(&tx, component)?;
    tx.execute(
        "INSERT OR IGNORE INTO list_component_link (list_id, component_url) VALUES (?1, ?2)",
        params![list_id, component.url],
    )
    .context("failed to link component to list")?;
    tx.commit().context("failed to commit add")?;

    debug!("linked {} to list {list_id}", component.url);
    Ok(())
}

/// Drop the direct link between a list and a component, deleting the
/// component if nothing else references it. Returns whether the component row
/// was removed.
pub fn remove_component_from_list(conn: &mut Connection, list_id: i64, url: &str) -> Result<bool> {
    let tx = conn
        .transaction()
        .context("failed to begin remove transaction")?;
    require_list(&tx, list_id)?;
    let deleted = tx
        .execute(
            "DELETE FROM list_component_link WHERE list_id = ?1 AND component_url = ?2",
            params![list_id, url],
        )
        .context("failed to unlink component from list")?;
    if deleted == 0 {
        return Err(StoreError::LinkNotFound {
            list_id,
            url: url.to_string(),
        }
        .into());
    }

    let removed = delete_component_if_orphaned(&tx, url)?;
    tx.commit().context("failed to commit remove")?;

    debug!("unlinked {url} from list {list_id} (component deleted: {removed})");
    Ok(removed)
}

/// Delete a bundle with its links and clean up members that were only held
/// by it. Returns the URLs of components that were deleted.
pub fn remove_bundle(conn: &mut Connection, bundle_id: i64) -> Result<Vec<String>> {
    let tx = conn
        .transaction()
        .context("failed to begin bundle removal")?;
    let members = fetch_bundle_components(&tx, bundle_id)?;
    delete_bundle_rows(&tx, bundle_id)?;

    let mut removed = Vec::new();
    for component in &members {
        if delete_component_if_orphaned(&tx, &component.url)? {
            removed.push(component.url.clone());
        }
    }
    tx.commit().context("failed to commit bundle removal")?;

    debug!(
        "removed bundle {bundle_id}, {} of {} members deleted",
        removed.len(),
        members.len()
    );
    Ok(removed)
}

/// Delete a list, its direct links, its bundles and their links as one unit,
/// then sweep every component those links referenced.
pub fn delete_list(conn: &mut Connection, list_id: i64) -> Result<Vec<String>> {
    let tx = conn.transaction().context("failed to begin list removal")?;
    require_list(&tx, list_id)?;

    let mut touched = direct_member_urls(&tx, list_id)?;
    tx.execute(
        "DELETE FROM list_component_link WHERE list_id = ?1",
        [list_id],
    )
    .context("failed to delete list links")?;

    let bundle_ids = bundle_ids_for_list(&tx, list_id)?;
    for bundle_id in &bundle_ids {
        touched.extend(
            fetch_bundle_components(&tx, *bundle_id)?
                .into_iter()
                .map(|component| component.url),
        );
        delete_bundle_rows(&tx, *bundle_id)?;
    }

    tx.execute("DELETE FROM lists WHERE id = ?1", [list_id])
        .context("failed to delete list")?;

    touched.sort();
    touched.dedup();
    let mut removed = Vec::new();
    for url in touched {
        if delete_component_if_orphaned(&tx, &url)? {
            removed.push(url);
        }
    }
    tx.commit().context("failed to commit list removal")?;

    debug!(
        "deleted list {list_id} with {} bundles, {} components deleted",
        bundle_ids.len(),
        removed.len()
    );
    Ok(removed)
}

/// Remove a bundle's links and then the bundle row. Link rows go first so the
/// foreign keys never see a bundle-less link.
fn delete_bundle_rows(conn: &Connection, bundle_id: i64) -> Result<()> {
    conn.execute(
        "DELETE FROM bundle_component_link WHERE bundle_id = ?1",
        [bundle_id],
    )
    .context("failed to delete bundle links")?;

    let deleted = conn
        .execute("DELETE FROM bundles WHERE bundle_id = ?1", [bundle_id])
        .context("failed to delete bundle")?;
    if deleted == 0 {
        Err(StoreError::BundleNotFound(bundle_id).into())
    } else {
        Ok(())
    }
}

fn direct_member_urls(conn: &Connection, list_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare("SELECT component_url FROM list_component_link WHERE list_id = ?1")
        .context("failed to prepare list link query")?;
    let urls = stmt
        .query_map([list_id], |row| row.get(0))
        .context("failed to iterate list links")?
        .collect::<Result<Vec<String>, _>>()
        .context("failed to collect list links")?;
    Ok(urls)
}

fn bundle_ids_for_list(conn: &Connection, list_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn
        .prepare("SELECT bundle_id FROM bundles WHERE list_id = ?1")
        .context("failed to prepare bundle id query")?;
    let ids = stmt
        .query_map([list_id], |row| row.get(0))
        .context("failed to iterate bundle ids")?
        .collect::<Result<Vec<i64>, _>>()
        .context("failed to collect bundle ids")?;
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        count_bundle_refs, count_list_refs, create_bundle, create_list, fetch_all_components,
        fetch_bundle_components, fetch_list_components, find_component, list_view_by_name,
        open_in_memory, update_component_overrides,
    };
    use crate::error::store_error;
    use crate::models::{ComponentOverrides, ListIcon, NewBundle};

    fn part(url: &str) -> Component {
        Component::new(url, url.to_uppercase(), "$10.00")
    }

    fn kit(name: &str) -> NewBundle {
        NewBundle {
            name: name.to_string(),
            vendor: "Shop".to_string(),
            price: "$45.50".to_string(),
            url: format!("https://shop/{name}"),
            image: None,
        }
    }

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    /// Every stored component is referenced, and every referenced URL is stored.
    fn assert_no_orphans(conn: &Connection) {
        for component in fetch_all_components(conn).unwrap() {
            let refs = count_list_refs(conn, &component.url).unwrap()
                + count_bundle_refs(conn, &component.url).unwrap();
            assert!(refs > 0, "orphaned component {}", component.url);
        }
        let dangling: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM (
                     SELECT component_url FROM list_component_link
                     UNION ALL SELECT component_url FROM bundle_component_link
                 ) l LEFT JOIN components c ON c.url = l.component_url
                 WHERE c.url IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(dangling, 0);
    }

    #[test]
    fn adding_is_idempotent() {
        let mut conn = open_in_memory().unwrap();
        let list = create_list(&conn, "Build", ListIcon::Computer).unwrap();
        add_component_to_list(&mut conn, list.id, &part("x")).unwrap();
        add_component_to_list(&mut conn, list.id, &part("x")).unwrap();

        assert_eq!(count(&conn, "list_component_link"), 1);
        assert_eq!(count(&conn, "components"), 1);
    }

    #[test]
    fn adding_to_missing_list_stores_nothing() {
        let mut conn = open_in_memory().unwrap();
        let err = add_component_to_list(&mut conn, 41, &part("x")).unwrap_err();
        assert_eq!(store_error(&err), Some(&StoreError::ListNotFound(41)));
        assert_eq!(count(&conn, "components"), 0);
    }

    #[test]
    fn removing_last_list_reference_deletes_component() {
        let mut conn = open_in_memory().unwrap();
        let a = create_list(&conn, "A", ListIcon::Computer).unwrap();
        let b = create_list(&conn, "B", ListIcon::Computer).unwrap();
        add_component_to_list(&mut conn, a.id, &part("x")).unwrap();
        add_component_to_list(&mut conn, b.id, &part("x")).unwrap();

        assert!(!remove_component_from_list(&mut conn, a.id, "x").unwrap());
        assert!(find_component(&conn, "x").unwrap().is_some());

        assert!(remove_component_from_list(&mut conn, b.id, "x").unwrap());
        assert!(find_component(&conn, "x").unwrap().is_none());
        assert_no_orphans(&conn);
    }

    #[test]
    fn list_removal_keeps_component_still_held_by_a_bundle() {
        let mut conn = open_in_memory().unwrap();
        let a = create_list(&conn, "A", ListIcon::Computer).unwrap();
        let b = create_list(&conn, "B", ListIcon::Computer).unwrap();
        add_component_to_list(&mut conn, a.id, &part("x")).unwrap();
        add_component_to_list(&mut conn, b.id, &part("x")).unwrap();
        create_bundle(&mut conn, a.id, &kit("kit"), &["x".to_string()]).unwrap();

        assert!(!remove_component_from_list(&mut conn, b.id, "x").unwrap());
        assert!(find_component(&conn, "x").unwrap().is_some());
        assert_eq!(count_bundle_refs(&conn, "x").unwrap(), 1);
        assert_no_orphans(&conn);
    }

    #[test]
    fn removing_missing_link_is_reported() {
        let mut conn = open_in_memory().unwrap();
        let list = create_list(&conn, "A", ListIcon::Computer).unwrap();
        let err = remove_component_from_list(&mut conn, list.id, "ghost").unwrap_err();
        assert!(matches!(
            store_error(&err),
            Some(StoreError::LinkNotFound { url, .. }) if url == "ghost"
        ));
    }

    #[test]
    fn removing_from_missing_list_is_list_not_found() {
        let mut conn = open_in_memory().unwrap();
        let err = remove_component_from_list(&mut conn, 17, "x").unwrap_err();
        assert_eq!(store_error(&err), Some(&StoreError::ListNotFound(17)));
    }

    #[test]
    fn failed_component_removal_keeps_link() {
        let mut conn = open_in_memory().unwrap();
        let list = create_list(&conn, "A", ListIcon::Computer).unwrap();
        add_component_to_list(&mut conn, list.id, &part("x")).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER fail_component_delete BEFORE DELETE ON components
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
        )
        .unwrap();

        assert!(remove_component_from_list(&mut conn, list.id, "x").is_err());
        assert_eq!(count(&conn, "list_component_link"), 1);
        assert_eq!(count_list_refs(&conn, "x").unwrap(), 1);
        assert!(find_component(&conn, "x").unwrap().is_some());
    }

    #[test]
    fn public_operations_never_leave_orphans() {
        let mut conn = open_in_memory().unwrap();
        let a = create_list(&conn, "A", ListIcon::Computer).unwrap();
        let b = create_list(&conn, "B", ListIcon::Server).unwrap();
        for url in ["w", "x", "y", "z"] {
            add_component_to_list(&mut conn, a.id, &part(url)).unwrap();
        }
        add_component_to_list(&mut conn, b.id, &part("x")).unwrap();
        assert_no_orphans(&conn);

        let overrides = ComponentOverrides {
            price: Some("$1".to_string()),
            ..ComponentOverrides::default()
        };
        update_component_overrides(&conn, "w", &overrides).unwrap();
        let first = create_bundle(
            &mut conn,
            a.id,
            &kit("one"),
            &["x".to_string(), "y".to_string()],
        )
        .unwrap();
        create_bundle(&mut conn, a.id, &kit("two"), &["z".to_string()]).unwrap();
        assert_no_orphans(&conn);

        remove_component_from_list(&mut conn, a.id, "w").unwrap();
        assert_no_orphans(&conn);
        remove_bundle(&mut conn, first.id).unwrap();
        assert_no_orphans(&conn);
        delete_list(&mut conn, a.id).unwrap();
        assert_no_orphans(&conn);

        let remaining: Vec<String> = fetch_all_components(&conn)
            .unwrap()
            .into_iter()
            .map(|c| c.url)
            .collect();
        assert_eq!(remaining, vec!["x".to_string()]);
    }

    #[test]
    fn removing_bundle_deletes_only_unshared_members() {
        let mut conn = open_in_memory().unwrap();
        let a = create_list(&conn, "A", ListIcon::Computer).unwrap();
        let b = create_list(&conn, "B", ListIcon::Computer).unwrap();
        for url in ["x", "y", "z"] {
            add_component_to_list(&mut conn, a.id, &part(url)).unwrap();
        }
        add_component_to_list(&mut conn, b.id, &part("y")).unwrap();
        add_component_to_list(&mut conn, b.id, &part("z")).unwrap();
        let first = create_bundle(
            &mut conn,
            a.id,
            &kit("one"),
            &["x".to_string(), "y".to_string()],
        )
        .unwrap();
        create_bundle(&mut conn, b.id, &kit("two"), &["z".to_string()]).unwrap();

        let removed = remove_bundle(&mut conn, first.id).unwrap();
        assert_eq!(removed, vec!["x".to_string()]);
        assert!(find_component(&conn, "y").unwrap().is_some());
        assert!(find_component(&conn, "z").unwrap().is_some());
        assert_eq!(count(&conn, "bundles"), 1);
        assert_no_orphans(&conn);
    }

    #[test]
    fn component_in_two_bundles_survives_first_removal() {
        let mut conn = open_in_memory().unwrap();
        let a = create_list(&conn, "A", ListIcon::Computer).unwrap();
        let b = create_list(&conn, "B", ListIcon::Computer).unwrap();
        add_component_to_list(&mut conn, a.id, &part("x")).unwrap();
        add_component_to_list(&mut conn, b.id, &part("x")).unwrap();
        let first = create_bundle(&mut conn, a.id, &kit("one"), &["x".to_string()]).unwrap();
        let second = create_bundle(&mut conn, b.id, &kit("two"), &["x".to_string()]).unwrap();

        assert!(remove_bundle(&mut conn, first.id).unwrap().is_empty());
        assert!(find_component(&conn, "x").unwrap().is_some());

        assert_eq!(remove_bundle(&mut conn, second.id).unwrap(), vec!["x"]);
        assert!(find_component(&conn, "x").unwrap().is_none());
    }

    #[test]
    fn removing_missing_bundle_is_not_found() {
        let mut conn = open_in_memory().unwrap();
        let err = remove_bundle(&mut conn, 12).unwrap_err();
        assert_eq!(store_error(&err), Some(&StoreError::BundleNotFound(12)));
    }

    #[test]
    fn deleting_list_cascades_and_sweeps() {
        let mut conn = open_in_memory().unwrap();
        let a = create_list(&conn, "A", ListIcon::Computer).unwrap();
        let b = create_list(&conn, "B", ListIcon::Computer).unwrap();
        for url in ["x", "y", "shared"] {
            add_component_to_list(&mut conn, a.id, &part(url)).unwrap();
        }
        add_component_to_list(&mut conn, b.id, &part("shared")).unwrap();
        create_bundle(&mut conn, a.id, &kit("kit"), &["y".to_string()]).unwrap();

        let mut removed = delete_list(&mut conn, a.id).unwrap();
        removed.sort();
        assert_eq!(removed, vec!["x".to_string(), "y".to_string()]);

        assert_eq!(count(&conn, "lists"), 1);
        assert_eq!(count(&conn, "bundles"), 0);
        assert_eq!(count(&conn, "bundle_component_link"), 0);
        assert_eq!(count(&conn, "list_component_link"), 1);
        assert_eq!(
            fetch_list_components(&conn, b.id).unwrap()[0].url,
            "shared".to_string()
        );
        assert_no_orphans(&conn);
    }

    #[test]
    fn failed_list_delete_leaves_everything_in_place() {
        let mut conn = open_in_memory().unwrap();
        let list = create_list(&conn, "A", ListIcon::Computer).unwrap();
        for url in ["x", "y"] {
            add_component_to_list(&mut conn, list.id, &part(url)).unwrap();
        }
        create_bundle(&mut conn, list.id, &kit("kit"), &["y".to_string()]).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER fail_bundle_delete BEFORE DELETE ON bundles
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
        )
        .unwrap();

        assert!(delete_list(&mut conn, list.id).is_err());

        assert_eq!(count(&conn, "lists"), 1);
        assert_eq!(count(&conn, "list_component_link"), 1);
        assert_eq!(count(&conn, "bundles"), 1);
        assert_eq!(count(&conn, "bundle_component_link"), 1);
        assert_eq!(count(&conn, "components"), 2);
    }

    #[test]
    fn failed_bundle_removal_keeps_links() {
        let mut conn = open_in_memory().unwrap();
        let list = create_list(&conn, "A", ListIcon::Computer).unwrap();
        add_component_to_list(&mut conn, list.id, &part("x")).unwrap();
        let bundle = create_bundle(&mut conn, list.id, &kit("kit"), &["x".to_string()]).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER fail_component_delete BEFORE DELETE ON components
             BEGIN SELECT RAISE(ABORT, 'injected failure'); END;",
        )
        .unwrap();

        assert!(remove_bundle(&mut conn, bundle.id).is_err());
        assert_eq!(
            fetch_bundle_components(&conn, bundle.id).unwrap().len(),
            1
        );
        assert_eq!(count(&conn, "components"), 1);
    }

    #[test]
    fn bundling_then_removing_bundle_clears_component() {
        let mut conn = open_in_memory().unwrap();
        let list = create_list(&conn, "Build A", ListIcon::Computer).unwrap();
        add_component_to_list(&mut conn, list.id, &part("x")).unwrap();
        add_component_to_list(&mut conn, list.id, &part("y")).unwrap();
        let bundle = create_bundle(&mut conn, list.id, &kit("Kit"), &["x".to_string()]).unwrap();

        let view = list_view_by_name(&conn, "Build A").unwrap();
        let direct: Vec<_> = view.components.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(direct, vec!["y"]);
        assert_eq!(view.bundles.len(), 1);
        let members: Vec<_> = view.bundles[0]
            .components
            .iter()
            .map(|c| c.url.as_str())
            .collect();
        assert_eq!(members, vec!["x"]);

        remove_bundle(&mut conn, bundle.id).unwrap();
        assert!(find_component(&conn, "x").unwrap().is_none());
        assert!(find_component(&conn, "y").unwrap().is_some());
        assert_no_orphans(&conn);
    }
}
