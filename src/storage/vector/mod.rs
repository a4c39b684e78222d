//! Relational + vector index provider: embeddings live in a native
//! `sqlite-vec` column and `similarity_search` pushes a k-NN query down to
//! the engine (spec §4.5). Falls back to the relational provider's
//! brute-force scoring when the extension can't be loaded.

mod bootstrap;
mod category;
mod item;
mod resource;

pub use category::VectorCategoryRepository;
pub use item::VectorItemRepository;
pub use resource::VectorResourceRepository;

use std::path::PathBuf;
use std::sync::Arc;

use crate::scope::ScopeModel;
use crate::storage::error::StorageError;
use crate::storage::relational::{schema, RelationalCategoryItemRepository, RelationalConfig};
use crate::storage::RepositorySet;

/// Where the vector provider keeps its database, how it models scope, and
/// the fixed embedding dimensionality for this deployment (invariant: "a
/// given role shares a fixed dimensionality across that repository").
#[derive(Clone, Debug)]
pub struct VectorConfig {
    pub dsn: PathBuf,
    pub scope_model: ScopeModel,
    pub dimension: usize,
}

fn add_vec_rowid_column(conn: &rusqlite::Connection, table: &str) {
    let _ = conn.execute(&format!("ALTER TABLE {table} ADD COLUMN vec_rowid INTEGER"), []);
}

/// Opens the relational tables, attempts to bootstrap the three `vec0`
/// virtual tables used by resources/items/categories (category edges carry
/// no embedding and reuse the plain relational repository), and returns a
/// [`RepositorySet`].
pub fn repository_set(config: VectorConfig) -> Result<RepositorySet, StorageError> {
    let relational_config = RelationalConfig {
        dsn: config.dsn.clone(),
        scope_model: config.scope_model.clone(),
    };

    let conn = rusqlite::Connection::open(&config.dsn)?;
    schema::ensure_resource_table(&conn, &config.scope_model)?;
    schema::ensure_item_table(&conn, &config.scope_model)?;
    schema::ensure_category_table(&conn, &config.scope_model)?;
    schema::ensure_category_item_table(&conn, &config.scope_model)?;
    add_vec_rowid_column(&conn, "resources");
    add_vec_rowid_column(&conn, "memory_items");
    add_vec_rowid_column(&conn, "memory_categories");

    let resources_native = bootstrap::try_create_vec_table(&conn, "resources_vec", config.dimension);
    let items_native = bootstrap::try_create_vec_table(&conn, "items_vec", config.dimension);
    let categories_native = bootstrap::try_create_vec_table(&conn, "categories_vec", config.dimension);
    drop(conn);

    Ok(RepositorySet {
        resources: Arc::new(VectorResourceRepository::new(relational_config.clone(), resources_native)),
        items: Arc::new(VectorItemRepository::new(relational_config.clone(), items_native)),
        categories: Arc::new(VectorCategoryRepository::new(relational_config.clone(), categories_native)),
        category_items: Arc::new(RelationalCategoryItemRepository::new(relational_config)),
    })
}
