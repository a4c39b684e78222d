use async_trait::async_trait;
use rusqlite::{params_from_iter, types::Value as SqlValue, Row};

use crate::model::MemoryItem;
use crate::scope::Scope;
use crate::storage::error::StorageError;
use crate::storage::filter::WhereFilter;
use crate::storage::repository::{ItemRepository, Scored};
use crate::storage::similarity::cosine_similarity;

use super::common::{
    build_where_clause, check_embedding_dimension, embedding_from_json, embedding_to_json, scope_columns_for_insert,
    scope_from_json, scope_to_json, timestamp_from_text, timestamp_to_text,
};
use super::RelationalConfig;

pub struct RelationalItemRepository {
    config: RelationalConfig,
}

impl RelationalItemRepository {
    pub fn new(config: RelationalConfig) -> Self {
        Self { config }
    }

    fn open(&self) -> Result<rusqlite::Connection, StorageError> {
        Ok(rusqlite::Connection::open(&self.config.dsn)?)
    }
}

pub(crate) fn row_to_item(row: &Row) -> rusqlite::Result<MemoryItem> {
    let embedding_raw: Option<String> = row.get("embedding")?;
    let scope_json: String = row.get("scope_json")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    Ok(MemoryItem {
        id: row.get("id")?,
        resource_id: row.get("resource_id")?,
        memory_type: row.get("memory_type")?,
        summary: row.get("summary")?,
        embedding: embedding_from_json(&embedding_raw).unwrap_or(None),
        created_at: timestamp_from_text(&created_at).unwrap_or_else(|_| chrono::Utc::now()),
        updated_at: timestamp_from_text(&updated_at).unwrap_or_else(|_| chrono::Utc::now()),
        scope: scope_from_json(&scope_json).unwrap_or_default(),
    })
}

#[async_trait]
impl ItemRepository for RelationalItemRepository {
    async fn create(&self, item: MemoryItem) -> Result<MemoryItem, StorageError> {
        let conn = self.open()?;
        let scope_json_for_check = scope_to_json(&item.scope)?;
        check_embedding_dimension(&conn, "memory_items", &scope_json_for_check, &item.id, &item.embedding)?;
        let scope_cols = scope_columns_for_insert(&self.config.scope_model, &item.scope)?;
        let mut columns = vec![
            "id".to_string(),
            "resource_id".to_string(),
            "memory_type".to_string(),
            "summary".to_string(),
            "embedding".to_string(),
            "created_at".to_string(),
            "updated_at".to_string(),
            "scope_json".to_string(),
        ];
        let mut values: Vec<SqlValue> = vec![
            SqlValue::Text(item.id.clone()),
            item.resource_id.clone().map(SqlValue::Text).unwrap_or(SqlValue::Null),
            SqlValue::Text(item.memory_type.clone()),
            SqlValue::Text(item.summary.clone()),
            embedding_to_json(&item.embedding)?.map(SqlValue::Text).unwrap_or(SqlValue::Null),
            SqlValue::Text(timestamp_to_text(&item.created_at)),
            SqlValue::Text(timestamp_to_text(&item.updated_at)),
            SqlValue::Text(scope_to_json(&item.scope)?),
        ];
        for (col, val) in scope_cols {
            columns.push(col);
            values.push(SqlValue::Text(val));
        }
        let placeholders = columns.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!("INSERT INTO memory_items ({}) VALUES ({})", columns.join(", "), placeholders);
        conn.execute(&sql, params_from_iter(values))?;
        Ok(item)
    }

    async fn get_by_id(&self, id: &str, scope: &Scope) -> Result<Option<MemoryItem>, StorageError> {
        let conn = self.open()?;
        let row = conn
            .query_row("SELECT * FROM memory_items WHERE id = ?", [id], row_to_item)
            .ok();
        Ok(row.filter(|i| &i.scope == scope))
    }

    async fn list(&self, where_: &WhereFilter) -> Result<Vec<MemoryItem>, StorageError> {
        let conn = self.open()?;
        let (clause, sql_params) = build_where_clause(where_);
        let sql = format!("SELECT * FROM memory_items WHERE {clause}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(sql_params), row_to_item)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    async fn update(&self, item: MemoryItem) -> Result<MemoryItem, StorageError> {
        let conn = self.open()?;
        let scope_json_for_check = scope_to_json(&item.scope)?;
        check_embedding_dimension(&conn, "memory_items", &scope_json_for_check, &item.id, &item.embedding)?;
        let embedding_json = embedding_to_json(&item.embedding)?;
        let changed = conn.execute(
            "UPDATE memory_items SET memory_type = ?, summary = ?, embedding = ?, updated_at = ? WHERE id = ?",
            rusqlite::params![
                item.memory_type,
                item.summary,
                embedding_json,
                timestamp_to_text(&item.updated_at),
                item.id,
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(item.id));
        }
        Ok(item)
    }

    async fn delete(&self, id: &str, scope: &Scope) -> Result<(), StorageError> {
        let existing = self.get_by_id(id, scope).await?;
        if existing.is_none() {
            let conn = self.open()?;
            let exists: bool = conn
                .query_row("SELECT 1 FROM memory_items WHERE id = ?", [id], |_| Ok(true))
                .unwrap_or(false);
            return Err(if exists {
                StorageError::ScopeMismatch(id.to_string())
            } else {
                StorageError::NotFound(id.to_string())
            });
        }
        let conn = self.open()?;
        conn.execute("DELETE FROM memory_items WHERE id = ?", [id])?;
        Ok(())
    }

    async fn similarity_search(
        &self,
        embedding: &[f32],
        k: usize,
        where_: &WhereFilter,
    ) -> Result<Vec<Scored<MemoryItem>>, StorageError> {
        let candidates = self.list(where_).await?;
        let mut scored: Vec<Scored<MemoryItem>> = candidates
            .into_iter()
            .filter_map(|i| {
                i.embedding
                    .clone()
                    .map(|e| Scored { score: cosine_similarity(embedding, &e), record: i })
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}
