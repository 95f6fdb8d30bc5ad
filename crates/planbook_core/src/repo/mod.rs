//! Entity persistence.
//!
//! # Responsibility
//! - Keep SQL details behind typed repository APIs.
//! - Provide the store-backed accessors the integrity engine reads through.
//!
//! # Invariants
//! - Repositories never resolve or repair references on write.
//! - Read paths report semantic `NotFound`/`MalformedId` separately from
//!   storage failures.

pub mod entity_repo;
