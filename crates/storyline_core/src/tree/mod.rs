//! Project tree engine.
//!
//! # Responsibility
//! - Own every outline entry (roots, items, files) in one flat store.
//! - Recompute a deterministic visiting order from advisory legacy orders.
//! - Repair structural corruption without deleting user data.
//!
//! # Invariants
//! - Handles are unique; a parent exists before any child references it.
//! - After `validate()`, one root is registered per `ItemType`.
//! - Derived views are only rebuilt by `sort()`; they are never the source of
//!   truth for parent pointers.
//!
//! # Concurrency
//! - The engine is synchronous and performs no I/O. Hosts that share a tree
//!   across threads must hold one lock across a mutation and its resort.

mod error;
mod outline;
mod registry;
mod reorder;
mod sort;
mod store;
mod typed;
mod validate;

pub use error::{SortReport, TreeDiagnostic, TreeError, TreeResult, ValidationReport};
pub use outline::ChapterRow;
pub use registry::RootRegistry;
pub use reorder::MoveStep;

use crate::model::entry::TreeEntry;
use crate::model::handle::{Handle, HandleGenerator};
use std::collections::HashMap;
use std::path::PathBuf;

/// Ordered views produced by the last sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeView {
    root_order: Vec<Handle>,
    item_order: Vec<Handle>,
    file_order: Vec<Handle>,
    global_order: Vec<Handle>,
    items_by_parent: HashMap<Handle, Vec<Handle>>,
    files_by_parent: HashMap<Handle, Vec<Handle>>,
}

/// Handle-addressed outline of one writing project.
#[derive(Debug, Default)]
pub struct ProjectTree {
    entries: Vec<TreeEntry>,
    lookup: HashMap<Handle, usize>,
    roots: RootRegistry,
    view: TreeView,
    handles: HandleGenerator,
    document_location: Option<PathBuf>,
    /// Set by structural changes, cleared by `sort()`.
    stale: bool,
}

impl ProjectTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn roots(&self) -> &RootRegistry {
        &self.roots
    }

    /// True when a structural change happened after the last sort.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn root_order(&self) -> &[Handle] {
        &self.view.root_order
    }

    pub fn item_order(&self) -> &[Handle] {
        &self.view.item_order
    }

    pub fn file_order(&self) -> &[Handle] {
        &self.view.file_order
    }

    pub fn global_order(&self) -> &[Handle] {
        &self.view.global_order
    }

    pub fn items_by_parent(&self) -> &HashMap<Handle, Vec<Handle>> {
        &self.view.items_by_parent
    }

    pub fn files_by_parent(&self) -> &HashMap<Handle, Vec<Handle>> {
        &self.view.files_by_parent
    }

    /// Ordered item children of `parent`; empty when `parent` owns none.
    pub fn items_of(&self, parent: &Handle) -> &[Handle] {
        self.view
            .items_by_parent
            .get(parent)
            .map_or(&[], Vec::as_slice)
    }

    /// Ordered file children of `parent`; empty when `parent` owns none.
    pub fn files_of(&self, parent: &Handle) -> &[Handle] {
        self.view
            .files_by_parent
            .get(parent)
            .map_or(&[], Vec::as_slice)
    }

    fn index_of(&self, handle: &Handle) -> TreeResult<usize> {
        self.lookup
            .get(handle)
            .copied()
            .ok_or_else(|| TreeError::NotFound(handle.clone()))
    }
}
