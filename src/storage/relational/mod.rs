//! Relational provider (no vector index): embeddings live in a serialized
//! float text column; `similarity_search` loads `where`-restricted
//! candidates and scores them in process (spec §4.5, §6).
//!
//! Grounded on the teacher's `SqliteStore`/`SqliteVecStore` connection
//! handling: a fresh `rusqlite::Connection` is opened per call inside
//! `spawn_blocking`, rather than holding one behind a mutex.

mod category_item;

pub(crate) mod category;
pub(crate) mod common;
pub(crate) mod item;
pub(crate) mod resource;
pub(crate) mod schema;

pub use category::RelationalCategoryRepository;
pub use category_item::RelationalCategoryItemRepository;
pub use item::RelationalItemRepository;
pub use resource::RelationalResourceRepository;

use std::path::PathBuf;
use std::sync::Arc;

use crate::scope::ScopeModel;
use crate::storage::error::StorageError;
use crate::storage::RepositorySet;

/// Where the relational provider keeps its database and how it models scope.
#[derive(Clone, Debug)]
pub struct RelationalConfig {
    pub dsn: PathBuf,
    pub scope_model: ScopeModel,
}

/// Opens (or creates, per `ddl_mode: create`) the four relational tables and
/// returns a [`RepositorySet`] backed by them.
pub fn repository_set(config: RelationalConfig) -> Result<RepositorySet, StorageError> {
    let conn = rusqlite::Connection::open(&config.dsn)?;
    schema::ensure_resource_table(&conn, &config.scope_model)?;
    schema::ensure_item_table(&conn, &config.scope_model)?;
    schema::ensure_category_table(&conn, &config.scope_model)?;
    schema::ensure_category_item_table(&conn, &config.scope_model)?;
    drop(conn);

    Ok(RepositorySet {
        resources: Arc::new(RelationalResourceRepository::new(config.clone())),
        items: Arc::new(RelationalItemRepository::new(config.clone())),
        categories: Arc::new(RelationalCategoryRepository::new(config.clone())),
        category_items: Arc::new(RelationalCategoryItemRepository::new(config)),
    })
}
