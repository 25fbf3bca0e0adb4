//! Project metadata model.
//!
//! # Responsibility
//! - Describe the book-level metadata stored next to the tree.
//!
//! # Invariants
//! - `project_id` is stable for the lifetime of a project database.
//! - `draft` is at least 1.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one writing project.
pub type ProjectId = Uuid;

/// Validation failures for project metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectMetaError {
    NilProjectId,
    ZeroDraft,
}

impl Display for ProjectMetaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilProjectId => write!(f, "project id must not be nil"),
            Self::ZeroDraft => write!(f, "draft number must be at least 1"),
        }
    }
}

impl Error for ProjectMetaError {}

/// Book-level metadata: title, author and active draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub project_id: ProjectId,
    pub title: String,
    pub author: String,
    /// Draft folders are numbered from 1.
    pub draft: u32,
}

impl ProjectMeta {
    /// Creates metadata for a fresh project with a generated id and draft 1.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            project_id: Uuid::new_v4(),
            title: title.into().trim().to_string(),
            author: author.into().trim().to_string(),
            draft: 1,
        }
    }

    pub fn validate(&self) -> Result<(), ProjectMetaError> {
        if self.project_id.is_nil() {
            return Err(ProjectMetaError::NilProjectId);
        }
        if self.draft == 0 {
            return Err(ProjectMetaError::ZeroDraft);
        }
        Ok(())
    }
}
