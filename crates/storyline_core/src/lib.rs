//! Core project-tree engine for Storyline.
//! Owns the outline of a writing project: entries, ordering, repair and
//! persistence.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod tree;

pub use config::{load_config, save_config, ConfigError, StorylineConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::entry::{DocumentRef, StoredEntry, TreeEntry};
pub use model::handle::{Handle, HandleParseError};
pub use model::item::{
    CompileFlag, ItemClass, ItemField, ItemLevel, ItemSubType, ItemType, ItemUpdate,
    ItemValidationError, TreeItem,
};
pub use model::project::{ProjectId, ProjectMeta};
pub use repo::project_repo::{
    ProjectRepoError, ProjectRepoResult, ProjectRepository, SqliteProjectRepository,
};
pub use service::project_service::{
    OpenSummary, OpenedProject, ProjectService, ProjectServiceError,
};
pub use tree::{
    ChapterRow, MoveStep, ProjectTree, SortReport, TreeDiagnostic, TreeError, TreeResult,
    ValidationReport,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
