use thiserror::Error;

use crate::item::ItemId;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by store, session and dispatch operations.
///
/// A failed operation never leaves a partial mutation behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("item not found: {0}")]
    NotFound(ItemId),

    #[error("name cannot be empty")]
    InvalidName,

    #[error("invalid url: {0:?}")]
    InvalidUrl(String),

    #[error("cannot move {id} into {target}: it would become its own descendant")]
    CycleRejected { id: ItemId, target: ItemId },

    #[error("not a folder: {0}")]
    NotAFolder(ItemId),

    #[error("the root folder cannot be deleted or moved")]
    RootImmutable,

    #[error("duplicate item id: {0}")]
    DuplicateId(ItemId),

    #[error("item {0} is not reachable from the root")]
    Orphan(ItemId),

    #[error("item {0} is not in the current view")]
    NotVisible(ItemId),
}

/// A symbolic name (sort mode, filter, action) that matched nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseNameError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseNameError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
