use thiserror::Error;

/// Domain failures the UI branches on. They travel inside `anyhow::Error` and
/// are recovered with `downcast_ref` where a caller needs the distinction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("List not found")]
    ListNotFound(i64),
    #[error("List \"{0}\" not found")]
    ListNameNotFound(String),
    #[error("Bundle not found")]
    BundleNotFound(i64),
    #[error("Component not found")]
    ComponentNotFound(String),
    #[error("Component is not in this list")]
    LinkNotFound { list_id: i64, url: String },
    #[error("No components selected")]
    EmptySelection,
    #[error("Bundle {0} is required.")]
    MissingField(&'static str),
    #[error("Selected component is not a direct member of the list: {0}")]
    SelectionNotInList(String),
}

/// Find a `StoreError` anywhere in an error chain.
pub fn store_error(err: &anyhow::Error) -> Option<&StoreError> {
    err.chain().find_map(|cause| cause.downcast_ref::<StoreError>())
}
