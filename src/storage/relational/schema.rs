//! DDL for the four relational tables (spec §6: "Relational backend
//! tables: `resources`, `memory_items`, `memory_categories`,
//! `category_items`. Each has primary key `id`, all scope fields as their
//! own columns, `created_at`/`updated_at` timestamps.").

use rusqlite::Connection;

use crate::scope::ScopeModel;
use crate::storage::error::StorageError;

use super::common::scope_column_def;

fn scope_columns_sql(model: &ScopeModel) -> String {
    model
        .fields
        .iter()
        .map(|f| scope_column_def(f))
        .collect::<Vec<_>>()
        .join(",\n            ")
}

fn scope_index_columns(model: &ScopeModel) -> String {
    model
        .fields
        .iter()
        .map(|f| super::common::scope_column(f))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn ensure_resource_table(conn: &Connection, model: &ScopeModel) -> Result<(), StorageError> {
    let scope_cols = scope_columns_sql(model);
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS resources (
            id TEXT PRIMARY KEY,
            url TEXT NOT NULL,
            modality TEXT NOT NULL,
            local_path TEXT,
            caption TEXT,
            embedding TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            scope_json TEXT NOT NULL,
            {scope_cols}
        )"
    );
    conn.execute(&sql, [])?;
    let index_cols = scope_index_columns(model);
    if !index_cols.is_empty() {
        conn.execute(
            &format!("CREATE INDEX IF NOT EXISTS idx_resources_scope ON resources ({index_cols})"),
            [],
        )?;
    }
    Ok(())
}

pub fn ensure_item_table(conn: &Connection, model: &ScopeModel) -> Result<(), StorageError> {
    let scope_cols = scope_columns_sql(model);
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS memory_items (
            id TEXT PRIMARY KEY,
            resource_id TEXT,
            memory_type TEXT NOT NULL,
            summary TEXT NOT NULL,
            embedding TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            scope_json TEXT NOT NULL,
            {scope_cols}
        )"
    );
    conn.execute(&sql, [])?;
    let index_cols = scope_index_columns(model);
    if !index_cols.is_empty() {
        conn.execute(
            &format!("CREATE INDEX IF NOT EXISTS idx_items_scope ON memory_items ({index_cols})"),
            [],
        )?;
    }
    Ok(())
}

pub fn ensure_category_table(conn: &Connection, model: &ScopeModel) -> Result<(), StorageError> {
    let scope_cols = scope_columns_sql(model);
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS memory_categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            normalized_name TEXT NOT NULL,
            description TEXT NOT NULL,
            summary TEXT,
            embedding TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            scope_json TEXT NOT NULL,
            {scope_cols}
        )"
    );
    conn.execute(&sql, [])?;
    let index_cols = scope_index_columns(model);
    if !index_cols.is_empty() {
        conn.execute(
            &format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_scope_name ON memory_categories ({index_cols}, normalized_name)"
            ),
            [],
        )?;
    }
    Ok(())
}

pub fn ensure_category_item_table(conn: &Connection, model: &ScopeModel) -> Result<(), StorageError> {
    let scope_cols = scope_columns_sql(model);
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS category_items (
            id TEXT PRIMARY KEY,
            item_id TEXT NOT NULL,
            category_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            scope_json TEXT NOT NULL,
            {scope_cols}
        )"
    );
    conn.execute(&sql, [])?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_category_items_item ON category_items (item_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_category_items_category ON category_items (category_id)",
        [],
    )?;
    Ok(())
}
