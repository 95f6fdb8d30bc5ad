//! Core domain logic for planbook.
//! This crate owns the entity model, the SQLite entity store and the
//! integrity engine that checks references and hierarchies across them.

pub mod db;
pub mod integrity;
pub mod logging;
pub mod model;
pub mod repo;

pub use db::{open_db, open_db_existing, open_db_in_memory, DbError, DbResult};
pub use integrity::accessor::EntityAccessor;
pub use integrity::checker::IntegrityChecker;
pub use integrity::context::{CheckContext, ContextError};
pub use integrity::error::{AccessError, AccessResult, CheckPhase, IntegrityError};
pub use integrity::options::IntegrityOptions;
pub use integrity::report::{CycleError, IntegrityResult, ReferenceError, ReferenceWarning};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::entity::{Entity, EntityKind, Relation, Requirement};
pub use model::id::{validate_id, IdFormatError};
pub use model::records::{
    Activity, Actor, Assumption, Consideration, Decision, Deliverable, Objective, Problem,
    Quality, Risk, Subsystem, UseCase,
};
pub use repo::entity_repo::{EntityRepoError, EntityRepoResult, SqliteEntityRepository};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
