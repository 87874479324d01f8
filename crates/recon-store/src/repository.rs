//! The Repository contract every entity-specific repository implements.
//!
//! Grounded on the teacher's `CbuRepository` (a thin wrapper over raw
//! `sqlx::query` calls rather than a derive-macro ORM, bound by hand per
//! entity) and `original_source/.../interfaces/repository.py`'s
//! `AbstractRepository` (get/find_many/count/create/update/delete/
//! get_or_create/bulk_create/bulk_upsert). Unlike the teacher's repositories,
//! which hold their own `PgPool` and take `&self`, these take the open
//! `UnitOfWork` as an explicit argument: a repository here is a stateless
//! unit struct, and several repositories share one transaction/savepoint
//! across a batch (see `uow.rs`), so there is no `&self` to hold it on.
//! Every method is therefore an associated function, not a receiver method.

use async_trait::async_trait;
use recon_core::Id;

use crate::error::StoreError;
use crate::uow::UnitOfWork;

/// A sort direction and column for `find_many`.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub column: &'static str,
    pub descending: bool,
}

/// The uniform CRUD + upsert contract exposed by every entity repository.
///
/// `Filter` and `Patch` are entity-specific field-subset types; `Row` is the
/// entity's full row type; `Create` is what's needed to insert one row.
#[async_trait]
pub trait Repository {
    type Row: Send + Sync;
    type Filter: Send + Sync;
    type Patch: Send + Sync;
    type Create: Send + Sync;

    async fn get(uow: &mut UnitOfWork, id: Id) -> Result<Option<Self::Row>, StoreError>;

    async fn find_many(
        uow: &mut UnitOfWork,
        filter: &Self::Filter,
        limit: i64,
        offset: i64,
        order_by: Option<OrderBy>,
    ) -> Result<Vec<Self::Row>, StoreError>;

    async fn count(uow: &mut UnitOfWork, filter: &Self::Filter) -> Result<i64, StoreError>;

    async fn create(uow: &mut UnitOfWork, data: Self::Create) -> Result<Self::Row, StoreError>;

    async fn update(
        uow: &mut UnitOfWork,
        id: Id,
        patch: Self::Patch,
    ) -> Result<Self::Row, StoreError>;

    async fn delete(uow: &mut UnitOfWork, id: Id) -> Result<(), StoreError>;

    /// Insert every item in one round trip. Empty input is a no-op and
    /// skips the query entirely.
    async fn bulk_create(
        uow: &mut UnitOfWork,
        items: Vec<Self::Create>,
    ) -> Result<Vec<Self::Row>, StoreError>;

    /// Insert-or-update every item in one round trip. Empty input is a
    /// no-op and skips the query entirely.
    async fn bulk_upsert(
        uow: &mut UnitOfWork,
        items: Vec<Self::Create>,
    ) -> Result<Vec<Self::Row>, StoreError>;

    async fn get_or_create(
        uow: &mut UnitOfWork,
        filter: &Self::Filter,
        data: Self::Create,
    ) -> Result<Self::Row, StoreError> {
        if let Some(row) = Self::find_many(uow, filter, 1, 0, None).await?.into_iter().next() {
            return Ok(row);
        }
        Self::create(uow, data).await
    }
}
