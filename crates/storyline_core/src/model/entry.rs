//! Tree entry model.
//!
//! # Responsibility
//! - Bind a handle, parent pointer and advisory order to an item payload.
//! - Carry the opaque document reference owned by file-level entries.
//!
//! # Invariants
//! - `document` is `Some` only for `ItemLevel::File` entries.
//! - `order` is sorter input from a previous pass, never authoritative.

use crate::model::handle::Handle;
use crate::model::item::{ItemClass, TreeItem};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Reference from a file entry to its document body.
///
/// The tree engine forwards this value to the document layer and never reads
/// the location itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    handle: Handle,
    class: ItemClass,
    location: Option<PathBuf>,
}

impl DocumentRef {
    pub(crate) fn new(handle: Handle, class: ItemClass, location: Option<PathBuf>) -> Self {
        Self {
            handle,
            class,
            location,
        }
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn class(&self) -> ItemClass {
        self.class
    }

    /// Document folder configured when this reference was last refreshed.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub(crate) fn set_location(&mut self, location: Option<PathBuf>) {
        self.location = location;
    }
}

/// One handle-addressed entry of the project tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub handle: Handle,
    pub parent: Option<Handle>,
    pub order: Option<i64>,
    pub item: TreeItem,
    pub document: Option<DocumentRef>,
    /// Pending reorder anchor: a sibling to follow, or the parent for "first".
    pub(crate) sort_after: Option<Handle>,
}

impl TreeEntry {
    /// Pending reorder anchor consumed by the next sort.
    pub fn sort_after(&self) -> Option<&Handle> {
        self.sort_after.as_ref()
    }

    /// Persistable snapshot of this entry.
    pub fn to_stored(&self) -> StoredEntry {
        StoredEntry {
            handle: self.handle.clone(),
            parent: self.parent.clone(),
            order: self.order,
            item: self.item.clone(),
        }
    }
}

/// Entry shape exchanged with persistence layers.
///
/// Only durable fields are kept: the document reference is rebuilt on
/// restore and reorder hints never outlive a sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub handle: Handle,
    pub parent: Option<Handle>,
    pub order: Option<i64>,
    pub item: TreeItem,
}
