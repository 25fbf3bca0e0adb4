//! Project tree domain model.
//!
//! # Responsibility
//! - Define handles, item payloads and entries shared by tree and storage.
//!
//! # Invariants
//! - Model types carry no storage or ordering logic.
//!
//! # See also
//! - `crate::tree` for the engine that owns entries.

pub mod entry;
pub mod handle;
pub mod item;
pub mod project;
