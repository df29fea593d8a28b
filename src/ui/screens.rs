use std::collections::HashSet;

use anyhow::Result;
use rusqlite::Connection;

use crate::db::{fetch_bundle_with_components, fetch_lists, list_view};
use crate::models::{BundleWithComponents, Component, ListItem, ListView, PartList};
use crate::settings::CATEGORIES;

use super::helpers::step_index;

/// Contents of one list plus the highlighted row.
pub(crate) struct ListDetailScreen {
    pub(crate) view: ListView,
    pub(crate) selected: usize,
}

impl ListDetailScreen {
    pub(crate) fn load(conn: &Connection, list_id: i64) -> Result<Self> {
        Ok(Self {
            view: list_view(conn, list_id)?,
            selected: 0,
        })
    }

    /// Re-read the list after a mutation, keeping the cursor in range.
    pub(crate) fn refresh(&mut self, conn: &Connection) -> Result<()> {
        self.view = list_view(conn, self.view.list.id)?;
        self.ensure_in_bounds();
        Ok(())
    }

    pub(crate) fn current_item(&self) -> Option<ListItem<'_>> {
        self.view.items().into_iter().nth(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_index(self.selected, self.view.item_count(), offset);
    }

    fn ensure_in_bounds(&mut self) {
        self.selected = step_index(self.selected, self.view.item_count(), 0);
    }
}

/// Members of a single bundle.
pub(crate) struct BundleScreen {
    pub(crate) bundle: BundleWithComponents,
    pub(crate) selected: usize,
}

impl BundleScreen {
    pub(crate) fn load(conn: &Connection, bundle_id: i64) -> Result<Self> {
        Ok(Self {
            bundle: fetch_bundle_with_components(conn, bundle_id)?,
            selected: 0,
        })
    }

    pub(crate) fn current_component(&self) -> Option<&Component> {
        self.bundle.components.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_index(self.selected, self.bundle.components.len(), offset);
    }
}

/// Cursor over the search results. The results themselves live in the
/// search session.
#[derive(Default)]
pub(crate) struct SearchScreen {
    pub(crate) query: String,
    pub(crate) selected: usize,
}

/// Rows of the settings screen.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum SettingsRow {
    #[default]
    Region,
    CustomPrices,
    DisplayName,
}

impl SettingsRow {
    pub(crate) const ALL: [SettingsRow; 3] = [
        SettingsRow::Region,
        SettingsRow::CustomPrices,
        SettingsRow::DisplayName,
    ];

    pub(crate) fn step(self, offset: isize) -> Self {
        let current = Self::ALL.iter().position(|row| *row == self).unwrap_or(0);
        Self::ALL[step_index(current, Self::ALL.len(), offset)]
    }
}

#[derive(Default)]
pub(crate) struct SettingsScreen {
    pub(crate) row: SettingsRow,
}

/// Multi-select over a list's direct components, used to pick bundle members.
pub(crate) struct ComponentPicker {
    pub(crate) list_id: i64,
    pub(crate) components: Vec<Component>,
    pub(crate) selected: usize,
    pub(crate) checked: HashSet<String>,
}

impl ComponentPicker {
    pub(crate) fn new(view: &ListView) -> Self {
        Self {
            list_id: view.list.id,
            components: view.components.clone(),
            selected: 0,
            checked: HashSet::new(),
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_index(self.selected, self.components.len(), offset);
    }

    pub(crate) fn is_checked(&self, index: usize) -> bool {
        self.components
            .get(index)
            .is_some_and(|component| self.checked.contains(&component.url))
    }

    pub(crate) fn toggle_current_selection(&mut self) {
        if let Some(component) = self.components.get(self.selected) {
            if !self.checked.remove(&component.url) {
                self.checked.insert(component.url.clone());
            }
        }
    }

    /// Checked URLs in display order.
    pub(crate) fn checked_urls(&self) -> Vec<String> {
        self.components
            .iter()
            .filter(|component| self.checked.contains(&component.url))
            .map(|component| component.url.clone())
            .collect()
    }
}

/// Choose which list a search result is added to.
pub(crate) struct ListPicker {
    pub(crate) component: Component,
    pub(crate) lists: Vec<PartList>,
    pub(crate) selected: usize,
}

impl ListPicker {
    pub(crate) fn load(conn: &Connection, component: Component) -> Result<Self> {
        Ok(Self {
            component,
            lists: fetch_lists(conn)?,
            selected: 0,
        })
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_index(self.selected, self.lists.len(), offset);
    }

    pub(crate) fn current_list(&self) -> Option<&PartList> {
        self.lists.get(self.selected)
    }
}

#[derive(Default)]
pub(crate) struct CategoryPicker {
    pub(crate) selected: usize,
}

impl CategoryPicker {
    pub(crate) fn move_selection(&mut self, offset: isize) {
        self.selected = step_index(self.selected, CATEGORIES.len(), offset);
    }

    /// `(display name, product-type key)` under the cursor.
    pub(crate) fn current(&self) -> Option<(&'static str, &'static str)> {
        CATEGORIES.get(self.selected).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{add_component_to_list, create_bundle, create_list, open_in_memory};
    use crate::models::{ListIcon, NewBundle};

    fn bundle_fields() -> NewBundle {
        NewBundle {
            name: "Kit".to_string(),
            vendor: "Shop".to_string(),
            price: "$50".to_string(),
            url: "https://shop/kit".to_string(),
            image: None,
        }
    }

    #[test]
    fn list_detail_tracks_items_across_refresh() {
        let mut conn = open_in_memory().unwrap();
        let list = create_list(&conn, "Build", ListIcon::Computer).unwrap();
        for url in ["a", "b", "c"] {
            add_component_to_list(&mut conn, list.id, &Component::new(url, url, "$1")).unwrap();
        }

        let mut screen = ListDetailScreen::load(&conn, list.id).unwrap();
        screen.move_selection(5);
        assert_eq!(screen.selected, 2);

        create_bundle(
            &mut conn,
            list.id,
            &bundle_fields(),
            &["b".to_string(), "c".to_string()],
        )
        .unwrap();
        screen.refresh(&conn).unwrap();

        assert_eq!(screen.view.item_count(), 2);
        assert_eq!(screen.selected, 1);
        assert!(matches!(screen.current_item(), Some(ListItem::Bundle(b)) if b.bundle.name == "Kit"));
    }

    #[test]
    fn component_picker_returns_checked_in_display_order() {
        let mut conn = open_in_memory().unwrap();
        let list = create_list(&conn, "Build", ListIcon::Computer).unwrap();
        for url in ["a", "b", "c"] {
            add_component_to_list(&mut conn, list.id, &Component::new(url, url, "$1")).unwrap();
        }
        let view = list_view(&conn, list.id).unwrap();

        let mut picker = ComponentPicker::new(&view);
        picker.move_selection(2);
        picker.toggle_current_selection();
        picker.move_selection(-2);
        picker.toggle_current_selection();
        picker.move_selection(1);
        picker.toggle_current_selection();
        picker.toggle_current_selection();

        assert!(picker.is_checked(0));
        assert!(!picker.is_checked(1));
        assert_eq!(picker.checked_urls(), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn settings_rows_clamp() {
        assert!(SettingsRow::Region.step(-1) == SettingsRow::Region);
        assert!(SettingsRow::Region.step(5) == SettingsRow::DisplayName);
    }
}
