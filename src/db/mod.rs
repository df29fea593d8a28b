//! Persistence module split across logical submodules.

mod aggregation;
mod bundles;
mod components;
mod connection;
mod lists;
mod membership;

pub use aggregation::{fetch_all_list_views, fetch_list_components, list_view, list_view_by_name};
pub use bundles::{
    create_bundle, fetch_bundle_components, fetch_bundle_with_components, fetch_bundles_for_list,
    find_bundle,
};
pub use components::{
    count_bundle_refs, count_list_refs, fetch_all_components, find_component, is_orphaned,
    update_component_overrides,
};
pub use connection::{ensure_schema, open_in_memory, open_store};
pub use lists::{create_list, fetch_lists, find_list, find_list_by_name, rename_list};
pub use membership::{
    add_component_to_list, delete_list, remove_bundle, remove_component_from_list,
};
