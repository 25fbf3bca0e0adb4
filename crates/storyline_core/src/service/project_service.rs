//! Project open/create/save use-case service.
//!
//! # Responsibility
//! - Restore the project tree from persisted entries, repair and sort it.
//! - Persist the committed tree order and project metadata.
//!
//! # Invariants
//! - An opened tree has been validated and sorted before it is returned.
//! - Saved entries always carry orders from a completed sort.

use crate::model::project::ProjectMeta;
use crate::repo::project_repo::{ProjectRepoError, ProjectRepository};
use crate::tree::{ProjectTree, TreeDiagnostic, TreeError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from project service operations.
#[derive(Debug)]
pub enum ProjectServiceError {
    /// Persistence-layer failure.
    Repo(ProjectRepoError),
    /// Persisted entries could not be rebuilt into a tree.
    Tree(TreeError),
}

impl Display for ProjectServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Tree(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Tree(err) => Some(err),
        }
    }
}

impl From<ProjectRepoError> for ProjectServiceError {
    fn from(value: ProjectRepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<TreeError> for ProjectServiceError {
    fn from(value: TreeError) -> Self {
        Self::Tree(value)
    }
}

/// Summary of the repairs performed while opening a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenSummary {
    /// Entries read from storage.
    pub restored: usize,
    /// Parent references that did not resolve during restore.
    pub dropped_parents: usize,
    /// Stored payload fields reset to valid values during restore.
    pub reset_fields: usize,
    /// Repairs counted by validation.
    pub repairs: usize,
    /// Category roots created by validation.
    pub created_roots: usize,
    /// Entries the sorter could not index.
    pub orphans: usize,
}

/// A project ready for editing.
#[derive(Debug)]
pub struct OpenedProject {
    pub tree: ProjectTree,
    pub meta: ProjectMeta,
    pub summary: OpenSummary,
}

/// Project service facade over repository implementations.
pub struct ProjectService<R: ProjectRepository> {
    repo: R,
}

impl<R: ProjectRepository> ProjectService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Loads, repairs and sorts the stored project.
    ///
    /// A database without metadata gets fresh untitled metadata; it is not
    /// written until `save` is called.
    pub fn open(&self) -> Result<OpenedProject, ProjectServiceError> {
        let started_at = Instant::now();
        let stored = self.repo.load_entries().map_err(|err| {
            error!("event=project_open module=service status=error stage=load error={err}");
            err
        })?;
        let restored = stored.len();

        let (mut tree, restore_findings) = ProjectTree::restore(stored).map_err(|err| {
            error!("event=project_open module=service status=error stage=restore error={err}");
            err
        })?;
        let validation = tree.validate_with_report();
        let sorting = tree.sort();

        let meta = match self.repo.load_meta()? {
            Some(meta) => meta,
            None => {
                warn!("event=project_open module=service status=repair reason=missing_meta");
                ProjectMeta::new("Untitled", "")
            }
        };

        let summary = OpenSummary {
            restored,
            dropped_parents: restore_findings
                .iter()
                .filter(|finding| matches!(finding, TreeDiagnostic::DroppedParent { .. }))
                .count(),
            reset_fields: restore_findings
                .iter()
                .filter(|finding| matches!(finding, TreeDiagnostic::FieldReset { .. }))
                .count(),
            repairs: validation.repair_count(),
            created_roots: validation.created_roots().len(),
            orphans: sorting.orphans(),
        };
        info!(
            "event=project_open module=service status=ok duration_ms={} entries={} dropped_parents={} reset_fields={} repairs={} created_roots={} orphans={}",
            started_at.elapsed().as_millis(),
            tree.len(),
            summary.dropped_parents,
            summary.reset_fields,
            summary.repairs,
            summary.created_roots,
            summary.orphans
        );

        Ok(OpenedProject {
            tree,
            meta,
            summary,
        })
    }

    /// Initializes an empty project with the four category roots and saves it.
    pub fn create(
        &self,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Result<OpenedProject, ProjectServiceError> {
        let mut tree = ProjectTree::new();
        let validation = tree.validate_with_report();
        tree.sort();
        let meta = ProjectMeta::new(title, author);
        self.save(&mut tree, &meta)?;

        info!(
            "event=project_create module=service status=ok project_id={}",
            meta.project_id
        );
        Ok(OpenedProject {
            tree,
            meta,
            summary: OpenSummary {
                created_roots: validation.created_roots().len(),
                ..OpenSummary::default()
            },
        })
    }

    /// Persists every entry with its committed order, plus metadata.
    ///
    /// A tree changed since its last sort is sorted first.
    pub fn save(&self, tree: &mut ProjectTree, meta: &ProjectMeta) -> Result<(), ProjectServiceError> {
        let started_at = Instant::now();
        if tree.is_stale() {
            tree.sort();
        }

        let entries = tree.to_stored();
        if let Err(err) = self
            .repo
            .save_entries(&entries)
            .and_then(|()| self.repo.save_meta(meta))
        {
            error!("event=project_save module=service status=error error={err}");
            return Err(err.into());
        }

        info!(
            "event=project_save module=service status=ok duration_ms={} entries={}",
            started_at.elapsed().as_millis(),
            entries.len()
        );
        Ok(())
    }
}
