//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and tree maintenance into use-case APIs.
//! - Keep UI layers decoupled from storage details.

pub mod project_service;
