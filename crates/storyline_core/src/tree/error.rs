//! Tree engine errors and structural diagnostics.
//!
//! # Responsibility
//! - Define caller-visible failures (`TreeError`).
//! - Define non-fatal findings reported by validation and sorting
//!   (`TreeDiagnostic`).

use crate::model::handle::Handle;
use crate::model::item::{ItemClass, ItemField, ItemType, ItemValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by tree engine operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Caller-visible tree failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Handle is not present in the store.
    NotFound(Handle),
    /// Parent cannot hold the requested child.
    InvalidParent {
        parent: Handle,
        reason: &'static str,
    },
    /// Operation is not allowed for this entry.
    InvalidOperation {
        handle: Handle,
        reason: &'static str,
    },
    /// Explicit handle is already used by another entry.
    DuplicateHandle(Handle),
    /// Item payload or update failed validation.
    InvalidItem(ItemValidationError),
    /// Every handle candidate collided with an existing entry.
    HandleExhausted { attempts: usize },
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(handle) => write!(f, "tree entry not found: {handle}"),
            Self::InvalidParent { parent, reason } => {
                write!(f, "invalid parent {parent}: {reason}")
            }
            Self::InvalidOperation { handle, reason } => {
                write!(f, "invalid operation on {handle}: {reason}")
            }
            Self::DuplicateHandle(handle) => write!(f, "handle already in use: {handle}"),
            Self::InvalidItem(err) => write!(f, "{err}"),
            Self::HandleExhausted { attempts } => {
                write!(f, "no free handle found after {attempts} attempts")
            }
        }
    }
}

impl Error for TreeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidItem(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ItemValidationError> for TreeError {
    fn from(value: ItemValidationError) -> Self {
        Self::InvalidItem(value)
    }
}

/// Structural finding from validation, sorting or restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeDiagnostic {
    /// A root carried a parent; it was cleared.
    RootParentCleared { handle: Handle, parent: Handle },
    /// A second root of the same type; left in the store, not registered.
    DuplicateRoot {
        kind: ItemType,
        handle: Handle,
        registered: Handle,
    },
    /// A root carried a non-container class; it was reset to container.
    RootClassReset { handle: Handle, class: ItemClass },
    /// A stored payload field failed validation and was reset on restore.
    FieldReset {
        handle: Handle,
        field: ItemField,
        error: ItemValidationError,
    },
    /// A missing category root was created.
    RootCreated { kind: ItemType, handle: Handle },
    /// An item was moved under the root of its own type.
    ItemReparented {
        handle: Handle,
        from: Option<Handle>,
        to: Handle,
    },
    /// A file was moved under its nearest container.
    FileReparented {
        handle: Handle,
        from: Option<Handle>,
        to: Handle,
    },
    /// Entry skipped by the sorter because its parent is not indexed.
    OrphanEntry {
        handle: Handle,
        parent: Option<Handle>,
    },
    /// Handle in the store but absent from the global order.
    MissingFromIndex(Handle),
    /// Handle listed more than once in the global order.
    DuplicateInIndex(Handle),
    /// Restored entry referenced a parent that was not loaded before it.
    DroppedParent { handle: Handle, parent: Handle },
}

impl TreeDiagnostic {
    /// Whether this finding counts toward the validation repair total.
    pub fn is_repair(&self) -> bool {
        matches!(
            self,
            Self::RootParentCleared { .. }
                | Self::RootClassReset { .. }
                | Self::DuplicateRoot { .. }
                | Self::ItemReparented { .. }
                | Self::FileReparented { .. }
        )
    }
}

impl Display for TreeDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RootParentCleared { handle, parent } => {
                write!(f, "root {handle} had parent {parent}; cleared")
            }
            Self::DuplicateRoot {
                kind,
                handle,
                registered,
            } => write!(
                f,
                "second {} root {handle}; keeping {registered}",
                kind.as_str()
            ),
            Self::RootClassReset { handle, class } => {
                write!(f, "root {handle} had class {}; reset to container", class.as_str())
            }
            Self::FieldReset {
                handle,
                field,
                error,
            } => write!(f, "entry {handle} field {field} reset: {error}"),
            Self::RootCreated { kind, handle } => {
                write!(f, "created missing {} root {handle}", kind.as_str())
            }
            Self::ItemReparented { handle, from, to } => {
                write!(f, "item {handle} moved from {} to {to}", display_opt(from))
            }
            Self::FileReparented { handle, from, to } => {
                write!(f, "file {handle} moved from {} to {to}", display_opt(from))
            }
            Self::OrphanEntry { handle, parent } => {
                write!(f, "entry {handle} has unindexed parent {}", display_opt(parent))
            }
            Self::MissingFromIndex(handle) => write!(f, "handle {handle} missing from index"),
            Self::DuplicateInIndex(handle) => write!(f, "handle {handle} indexed twice"),
            Self::DroppedParent { handle, parent } => {
                write!(f, "entry {handle} referenced unknown parent {parent}")
            }
        }
    }
}

fn display_opt(handle: &Option<Handle>) -> String {
    handle
        .as_ref()
        .map_or_else(|| "none".to_string(), ToString::to_string)
}

/// Outcome of one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub diagnostics: Vec<TreeDiagnostic>,
}

impl ValidationReport {
    pub fn repair_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.is_repair())
            .count()
    }

    /// Roots created during the pass, in creation order.
    pub fn created_roots(&self) -> Vec<&Handle> {
        self.diagnostics
            .iter()
            .filter_map(|diagnostic| match diagnostic {
                TreeDiagnostic::RootCreated { handle, .. } => Some(handle),
                _ => None,
            })
            .collect()
    }
}

/// Outcome of one sort pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortReport {
    pub diagnostics: Vec<TreeDiagnostic>,
}

impl SortReport {
    /// True when the global order is a complete permutation of the store.
    pub fn is_consistent(&self) -> bool {
        !self.diagnostics.iter().any(|diagnostic| {
            matches!(
                diagnostic,
                TreeDiagnostic::MissingFromIndex(_) | TreeDiagnostic::DuplicateInIndex(_)
            )
        })
    }

    pub fn orphans(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| matches!(diagnostic, TreeDiagnostic::OrphanEntry { .. }))
            .count()
    }
}
