use async_trait::async_trait;
use rusqlite::{params_from_iter, types::Value as SqlValue, Row};

use crate::model::CategoryItem;
use crate::scope::Scope;
use crate::storage::error::StorageError;
use crate::storage::filter::WhereFilter;
use crate::storage::repository::CategoryItemRepository;

use super::common::{
    build_where_clause, scope_columns_for_insert, scope_from_json, scope_to_json, timestamp_from_text,
    timestamp_to_text,
};
use super::RelationalConfig;

pub struct RelationalCategoryItemRepository {
    config: RelationalConfig,
}

impl RelationalCategoryItemRepository {
    pub fn new(config: RelationalConfig) -> Self {
        Self { config }
    }

    fn open(&self) -> Result<rusqlite::Connection, StorageError> {
        Ok(rusqlite::Connection::open(&self.config.dsn)?)
    }
}

fn row_to_edge(row: &Row) -> rusqlite::Result<CategoryItem> {
    let scope_json: String = row.get("scope_json")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    Ok(CategoryItem {
        id: row.get("id")?,
        item_id: row.get("item_id")?,
        category_id: row.get("category_id")?,
        created_at: timestamp_from_text(&created_at).unwrap_or_else(|_| chrono::Utc::now()),
        updated_at: timestamp_from_text(&updated_at).unwrap_or_else(|_| chrono::Utc::now()),
        scope: scope_from_json(&scope_json).unwrap_or_default(),
    })
}

#[async_trait]
impl CategoryItemRepository for RelationalCategoryItemRepository {
    async fn create(&self, edge: CategoryItem) -> Result<CategoryItem, StorageError> {
        let conn = self.open()?;
        let scope_cols = scope_columns_for_insert(&self.config.scope_model, &edge.scope)?;
        let mut columns = vec![
            "id".to_string(),
            "item_id".to_string(),
            "category_id".to_string(),
            "created_at".to_string(),
            "updated_at".to_string(),
            "scope_json".to_string(),
        ];
        let mut values: Vec<SqlValue> = vec![
            SqlValue::Text(edge.id.clone()),
            SqlValue::Text(edge.item_id.clone()),
            SqlValue::Text(edge.category_id.clone()),
            SqlValue::Text(timestamp_to_text(&edge.created_at)),
            SqlValue::Text(timestamp_to_text(&edge.updated_at)),
            SqlValue::Text(scope_to_json(&edge.scope)?),
        ];
        for (col, val) in scope_cols {
            columns.push(col);
            values.push(SqlValue::Text(val));
        }
        let placeholders = columns.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!("INSERT INTO category_items ({}) VALUES ({})", columns.join(", "), placeholders);
        conn.execute(&sql, params_from_iter(values))?;
        Ok(edge)
    }

    async fn get_by_id(&self, id: &str, scope: &Scope) -> Result<Option<CategoryItem>, StorageError> {
        let conn = self.open()?;
        let row = conn
            .query_row("SELECT * FROM category_items WHERE id = ?", [id], row_to_edge)
            .ok();
        Ok(row.filter(|e| &e.scope == scope))
    }

    async fn list(&self, where_: &WhereFilter) -> Result<Vec<CategoryItem>, StorageError> {
        let conn = self.open()?;
        let (clause, sql_params) = build_where_clause(where_);
        let sql = format!("SELECT * FROM category_items WHERE {clause}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(sql_params), row_to_edge)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    async fn list_by_item(&self, item_id: &str, scope: &Scope) -> Result<Vec<CategoryItem>, StorageError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare("SELECT * FROM category_items WHERE item_id = ?")?;
        let rows = stmt.query_map([item_id], row_to_edge)?;
        let mut out = Vec::new();
        for row in rows {
            let edge = row?;
            if &edge.scope == scope {
                out.push(edge);
            }
        }
        Ok(out)
    }

    async fn list_by_category(&self, category_id: &str, scope: &Scope) -> Result<Vec<CategoryItem>, StorageError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare("SELECT * FROM category_items WHERE category_id = ?")?;
        let rows = stmt.query_map([category_id], row_to_edge)?;
        let mut out = Vec::new();
        for row in rows {
            let edge = row?;
            if &edge.scope == scope {
                out.push(edge);
            }
        }
        Ok(out)
    }

    async fn update(&self, edge: CategoryItem) -> Result<CategoryItem, StorageError> {
        let conn = self.open()?;
        let changed = conn.execute(
            "UPDATE category_items SET item_id = ?, category_id = ?, updated_at = ? WHERE id = ?",
            rusqlite::params![edge.item_id, edge.category_id, timestamp_to_text(&edge.updated_at), edge.id],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(edge.id));
        }
        Ok(edge)
    }

    async fn delete(&self, id: &str, scope: &Scope) -> Result<(), StorageError> {
        let existing = self.get_by_id(id, scope).await?;
        if existing.is_none() {
            let conn = self.open()?;
            let exists: bool = conn
                .query_row("SELECT 1 FROM category_items WHERE id = ?", [id], |_| Ok(true))
                .unwrap_or(false);
            return Err(if exists {
                StorageError::ScopeMismatch(id.to_string())
            } else {
                StorageError::NotFound(id.to_string())
            });
        }
        let conn = self.open()?;
        conn.execute("DELETE FROM category_items WHERE id = ?", [id])?;
        Ok(())
    }

    async fn delete_by_item(&self, item_id: &str, scope: &Scope) -> Result<Vec<CategoryItem>, StorageError> {
        let removed = self.list_by_item(item_id, scope).await?;
        let conn = self.open()?;
        conn.execute("DELETE FROM category_items WHERE item_id = ?", [item_id])?;
        Ok(removed)
    }
}
