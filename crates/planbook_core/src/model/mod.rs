//! Typed project-management entities and their declared relations.
//!
//! # Responsibility
//! - Define the canonical records shared by persistence and integrity checks.
//! - Declare every cross-entity relation in one fixed order per entity kind.
//!
//! # Invariants
//! - Every entity is identified by a stable, namespaced id (`PREFIX-NNN` or
//!   `PREFIX-xxxxxxxx`).
//! - Relation declaration order never changes between calls.

pub mod entity;
pub mod id;
pub mod records;
