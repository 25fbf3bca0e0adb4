//! Repository layer for project persistence.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from the tree engine and services.
//!
//! # Invariants
//! - The tree engine never depends on this layer; data crosses the boundary
//!   as `StoredEntry` and `ProjectMeta` values.

pub mod project_repo;
