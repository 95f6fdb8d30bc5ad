//! Generic entity repository over the `entities` table.
//!
//! # Responsibility
//! - Persist typed entities as JSON payloads keyed by `(kind, id)`.
//! - Serve the integrity engine's read-only `EntityAccessor` contract.
//!
//! # Invariants
//! - Writes validate the entity's own id format; references are stored as-is.
//! - `get` checks the id format before touching storage, so malformed ids are
//!   reported as `MalformedId` and never as `NotFound`.
//! - Reads reject payloads that do not decode or whose id disagrees with the
//!   row key instead of masking them.

use crate::db::migrations::latest_version;
use crate::db::{schema_version, DbError};
use crate::integrity::accessor::EntityAccessor;
use crate::integrity::context::CheckContext;
use crate::integrity::error::{AccessError, AccessResult};
use crate::model::entity::{Entity, EntityKind};
use crate::model::id::{validate_id, IdFormatError};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub type EntityRepoResult<T> = Result<T, EntityRepoError>;

/// Errors from entity repository operations.
#[derive(Debug)]
pub enum EntityRepoError {
    Db(DbError),
    /// Entity id is not a valid id for its kind.
    InvalidId(IdFormatError),
    NotFound { kind: EntityKind, id: String },
    /// Payload could not be encoded.
    Encode(serde_json::Error),
    /// Persisted row cannot be decoded into a valid entity.
    InvalidData(String),
    /// Connection was not migrated to the expected schema version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for EntityRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidId(err) => write!(f, "invalid entity id: {err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Encode(err) => write!(f, "failed to encode entity payload: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted entity data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "entity repository requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for EntityRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidId(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidData(_) => None,
            Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<DbError> for EntityRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for EntityRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<IdFormatError> for EntityRepoError {
    fn from(value: IdFormatError) -> Self {
        Self::InvalidId(value)
    }
}

impl From<serde_json::Error> for EntityRepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// SQLite-backed repository for one entity kind.
pub struct SqliteEntityRepository<'conn, E> {
    conn: &'conn Connection,
    _entity: PhantomData<fn() -> E>,
}

impl<'conn, E: Entity> SqliteEntityRepository<'conn, E> {
    /// Creates a repository over a connection migrated to the latest schema.
    pub fn try_new(conn: &'conn Connection) -> EntityRepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = schema_version(conn)?;
        if actual_version != expected_version {
            return Err(EntityRepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        Ok(Self {
            conn,
            _entity: PhantomData,
        })
    }

    /// Inserts the entity or replaces the stored entity with the same id.
    pub fn put_entity(&self, entity: &E) -> EntityRepoResult<()> {
        validate_id(E::KIND, entity.id())?;
        let payload = serde_json::to_string(entity)?;

        self.conn.execute(
            "INSERT INTO entities (kind, id, payload)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (kind, id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![E::KIND.as_str(), entity.id(), payload],
        )?;
        Ok(())
    }

    /// Deletes one entity. Entities referencing it are left untouched.
    pub fn delete_entity(&self, id: &str) -> EntityRepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM entities WHERE kind = ?1 AND id = ?2;",
            params![E::KIND.as_str(), id],
        )?;
        if changed == 0 {
            return Err(EntityRepoError::NotFound {
                kind: E::KIND,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    pub fn find_entity(&self, id: &str) -> EntityRepoResult<Option<E>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM entities WHERE kind = ?1 AND id = ?2;",
                params![E::KIND.as_str(), id],
                |row| row.get(0),
            )
            .optional()?;

        payload
            .map(|payload| decode_entity(id, &payload))
            .transpose()
    }

    /// Lists every entity of this kind in ascending id order.
    pub fn list_entities(&self) -> EntityRepoResult<Vec<E>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, payload
             FROM entities
             WHERE kind = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([E::KIND.as_str()])?;

        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let payload: String = row.get(1)?;
            entities.push(decode_entity(&id, &payload)?);
        }
        Ok(entities)
    }
}

impl<E: Entity> EntityAccessor<E> for SqliteEntityRepository<'_, E> {
    fn get(&self, ctx: &CheckContext, id: &str) -> AccessResult<E> {
        ctx.check()?;
        validate_id(E::KIND, id).map_err(|reason| AccessError::MalformedId {
            kind: E::KIND,
            id: id.to_string(),
            reason,
        })?;

        self.find_entity(id)
            .map_err(AccessError::storage)?
            .ok_or_else(|| AccessError::NotFound {
                kind: E::KIND,
                id: id.to_string(),
            })
    }

    fn get_all(&self, ctx: &CheckContext) -> AccessResult<Vec<E>> {
        ctx.check()?;
        self.list_entities().map_err(AccessError::storage)
    }
}

fn decode_entity<E: Entity>(row_id: &str, payload: &str) -> EntityRepoResult<E> {
    let entity: E = serde_json::from_str(payload).map_err(|err| {
        EntityRepoError::InvalidData(format!(
            "cannot decode {} `{row_id}` payload: {err}",
            E::KIND
        ))
    })?;
    if entity.id() != row_id {
        return Err(EntityRepoError::InvalidData(format!(
            "{} row `{row_id}` holds payload for `{}`",
            E::KIND,
            entity.id()
        )));
    }
    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::{EntityRepoError, SqliteEntityRepository};
    use crate::db::open_db_in_memory;
    use crate::integrity::accessor::EntityAccessor;
    use crate::integrity::context::CheckContext;
    use crate::integrity::error::AccessError;
    use crate::model::records::{Deliverable, Objective};
    use rusqlite::{params, Connection};

    #[test]
    fn try_new_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteEntityRepository::<Objective>::try_new(&conn)
            .err()
            .expect("unmigrated connection must be rejected");
        assert!(matches!(
            err,
            EntityRepoError::UninitializedConnection {
                actual_version: 0,
                ..
            }
        ));
    }

    #[test]
    fn put_replaces_existing_entity() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteEntityRepository::<Objective>::try_new(&conn).unwrap();

        repo.put_entity(&Objective::new("OBJ-001", "Draft")).unwrap();
        repo.put_entity(&Objective::new("OBJ-001", "Final")).unwrap();

        let loaded = repo.find_entity("OBJ-001").unwrap().unwrap();
        assert_eq!(loaded.title, "Final");
        assert_eq!(repo.list_entities().unwrap().len(), 1);
    }

    #[test]
    fn put_rejects_malformed_own_id() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteEntityRepository::<Deliverable>::try_new(&conn).unwrap();

        let err = repo
            .put_entity(&Deliverable::new("OBJ-001", "wrong namespace"))
            .unwrap_err();
        assert!(matches!(err, EntityRepoError::InvalidId(_)));
    }

    #[test]
    fn kinds_share_table_without_colliding() {
        let conn = open_db_in_memory().unwrap();
        let objectives = SqliteEntityRepository::<Objective>::try_new(&conn).unwrap();
        let deliverables = SqliteEntityRepository::<Deliverable>::try_new(&conn).unwrap();

        objectives.put_entity(&Objective::new("OBJ-001", "Goal")).unwrap();
        deliverables.put_entity(&Deliverable::new("DEL-001", "Output")).unwrap();

        assert_eq!(objectives.list_entities().unwrap().len(), 1);
        assert_eq!(deliverables.list_entities().unwrap().len(), 1);
        assert!(objectives.find_entity("DEL-001").unwrap().is_none());
    }

    #[test]
    fn get_distinguishes_malformed_from_missing() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteEntityRepository::<Objective>::try_new(&conn).unwrap();
        let ctx = CheckContext::background();

        assert!(matches!(
            repo.get(&ctx, "OBJ-404"),
            Err(AccessError::NotFound { .. })
        ));
        assert!(matches!(
            repo.get(&ctx, "objective one"),
            Err(AccessError::MalformedId { .. })
        ));
    }

    #[test]
    fn corrupt_payload_surfaces_as_storage_error() {
        let conn = open_db_in_memory().unwrap();
        conn.execute(
            "INSERT INTO entities (kind, id, payload) VALUES (?1, ?2, ?3);",
            params!["objective", "OBJ-001", "{not json"],
        )
        .unwrap();
        let repo = SqliteEntityRepository::<Objective>::try_new(&conn).unwrap();

        let err = repo.get_all(&CheckContext::background()).unwrap_err();
        assert!(matches!(err, AccessError::Storage(_)));
        assert!(err.to_string().contains("cannot decode objective `OBJ-001`"));
    }

    #[test]
    fn delete_missing_entity_returns_not_found() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteEntityRepository::<Objective>::try_new(&conn).unwrap();
        let err = repo.delete_entity("OBJ-009").unwrap_err();
        assert!(matches!(err, EntityRepoError::NotFound { .. }));
    }
}
