//! Read-only accessor contract the integrity engine consumes.

use crate::integrity::context::CheckContext;
use crate::integrity::error::AccessResult;
use crate::model::entity::Entity;

/// Per-kind read access to persisted entities.
///
/// # Contract
/// - `get` fails with `AccessError::NotFound` for a well-formed id with no
///   entity, and with `AccessError::MalformedId` for an id that is not valid
///   for the kind. Any other failure is a storage failure.
/// - `get_all` returns every entity of the kind; order is not significant.
pub trait EntityAccessor<E: Entity> {
    fn get(&self, ctx: &CheckContext, id: &str) -> AccessResult<E>;
    fn get_all(&self, ctx: &CheckContext) -> AccessResult<Vec<E>>;
}

impl<E: Entity, A: EntityAccessor<E> + ?Sized> EntityAccessor<E> for &A {
    fn get(&self, ctx: &CheckContext, id: &str) -> AccessResult<E> {
        (**self).get(ctx, id)
    }

    fn get_all(&self, ctx: &CheckContext) -> AccessResult<Vec<E>> {
        (**self).get_all(ctx)
    }
}
