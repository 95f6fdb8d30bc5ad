//! Integrity and consistency checking over the whole entity graph.
//!
//! # Responsibility
//! - Report broken cross-entity references as errors or warnings.
//! - Report cycles in parent hierarchies and dependency graphs.
//! - Fold both into one report with a validity verdict.
//!
//! # Invariants
//! - Checks are read-only and synchronous; nothing is cached across calls.
//! - Broken references and cycles are report content. Only cancellation and
//!   storage failures are returned as errors.
//! - Output order is deterministic for a given data state.

pub mod accessor;
pub mod checker;
pub mod context;
pub mod cycles;
pub mod error;
pub mod options;
mod references;
pub mod report;
