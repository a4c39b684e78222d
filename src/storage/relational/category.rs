use async_trait::async_trait;
use rusqlite::{params_from_iter, types::Value as SqlValue, Row};

use crate::model::MemoryCategory;
use crate::scope::Scope;
use crate::storage::error::StorageError;
use crate::storage::filter::WhereFilter;
use crate::storage::repository::{CategoryRepository, Scored};
use crate::storage::similarity::cosine_similarity;

use super::common::{
    build_where_clause, check_embedding_dimension, embedding_from_json, embedding_to_json, scope_columns_for_insert,
    scope_from_json, scope_to_json, timestamp_from_text, timestamp_to_text,
};
use super::RelationalConfig;

pub struct RelationalCategoryRepository {
    config: RelationalConfig,
}

impl RelationalCategoryRepository {
    pub fn new(config: RelationalConfig) -> Self {
        Self { config }
    }

    fn open(&self) -> Result<rusqlite::Connection, StorageError> {
        Ok(rusqlite::Connection::open(&self.config.dsn)?)
    }
}

pub(crate) fn row_to_category(row: &Row) -> rusqlite::Result<MemoryCategory> {
    let embedding_raw: Option<String> = row.get("embedding")?;
    let scope_json: String = row.get("scope_json")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    Ok(MemoryCategory {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        summary: row.get("summary")?,
        embedding: embedding_from_json(&embedding_raw).unwrap_or(None),
        created_at: timestamp_from_text(&created_at).unwrap_or_else(|_| chrono::Utc::now()),
        updated_at: timestamp_from_text(&updated_at).unwrap_or_else(|_| chrono::Utc::now()),
        scope: scope_from_json(&scope_json).unwrap_or_default(),
    })
}

#[async_trait]
impl CategoryRepository for RelationalCategoryRepository {
    async fn create(&self, category: MemoryCategory) -> Result<MemoryCategory, StorageError> {
        if self
            .get_by_normalized_name(&category.normalized_name(), &category.scope)
            .await?
            .is_some()
        {
            return Err(StorageError::DuplicateCategoryName(category.name.clone()));
        }
        let conn = self.open()?;
        let scope_json_for_check = scope_to_json(&category.scope)?;
        check_embedding_dimension(&conn, "memory_categories", &scope_json_for_check, &category.id, &category.embedding)?;
        let scope_cols = scope_columns_for_insert(&self.config.scope_model, &category.scope)?;
        let mut columns = vec![
            "id".to_string(),
            "name".to_string(),
            "normalized_name".to_string(),
            "description".to_string(),
            "summary".to_string(),
            "embedding".to_string(),
            "created_at".to_string(),
            "updated_at".to_string(),
            "scope_json".to_string(),
        ];
        let mut values: Vec<SqlValue> = vec![
            SqlValue::Text(category.id.clone()),
            SqlValue::Text(category.name.clone()),
            SqlValue::Text(category.normalized_name()),
            SqlValue::Text(category.description.clone()),
            category.summary.clone().map(SqlValue::Text).unwrap_or(SqlValue::Null),
            embedding_to_json(&category.embedding)?.map(SqlValue::Text).unwrap_or(SqlValue::Null),
            SqlValue::Text(timestamp_to_text(&category.created_at)),
            SqlValue::Text(timestamp_to_text(&category.updated_at)),
            SqlValue::Text(scope_to_json(&category.scope)?),
        ];
        for (col, val) in scope_cols {
            columns.push(col);
            values.push(SqlValue::Text(val));
        }
        let placeholders = columns.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let sql = format!(
            "INSERT INTO memory_categories ({}) VALUES ({})",
            columns.join(", "),
            placeholders
        );
        conn.execute(&sql, params_from_iter(values))
            .map_err(|_| StorageError::DuplicateCategoryName(category.name.clone()))?;
        Ok(category)
    }

    async fn get_by_id(&self, id: &str, scope: &Scope) -> Result<Option<MemoryCategory>, StorageError> {
        let conn = self.open()?;
        let row = conn
            .query_row("SELECT * FROM memory_categories WHERE id = ?", [id], row_to_category)
            .ok();
        Ok(row.filter(|c| &c.scope == scope))
    }

    async fn get_by_normalized_name(
        &self,
        normalized_name: &str,
        scope: &Scope,
    ) -> Result<Option<MemoryCategory>, StorageError> {
        let conn = self.open()?;
        let candidates: Vec<MemoryCategory> = {
            let mut stmt = conn.prepare("SELECT * FROM memory_categories WHERE normalized_name = ?")?;
            let rows = stmt.query_map([normalized_name], row_to_category)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            out
        };
        Ok(candidates.into_iter().find(|c| &c.scope == scope))
    }

    async fn list(&self, where_: &WhereFilter) -> Result<Vec<MemoryCategory>, StorageError> {
        let conn = self.open()?;
        let (clause, sql_params) = build_where_clause(where_);
        let sql = format!("SELECT * FROM memory_categories WHERE {clause}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(sql_params), row_to_category)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    async fn update(&self, category: MemoryCategory) -> Result<MemoryCategory, StorageError> {
        if let Some(existing) = self
            .get_by_normalized_name(&category.normalized_name(), &category.scope)
            .await?
        {
            if existing.id != category.id {
                return Err(StorageError::DuplicateCategoryName(category.name.clone()));
            }
        }
        let conn = self.open()?;
        let scope_json_for_check = scope_to_json(&category.scope)?;
        check_embedding_dimension(&conn, "memory_categories", &scope_json_for_check, &category.id, &category.embedding)?;
        let embedding_json = embedding_to_json(&category.embedding)?;
        let changed = conn.execute(
            "UPDATE memory_categories SET name = ?, normalized_name = ?, description = ?, summary = ?, embedding = ?, updated_at = ? WHERE id = ?",
            rusqlite::params![
                category.name,
                category.normalized_name(),
                category.description,
                category.summary,
                embedding_json,
                timestamp_to_text(&category.updated_at),
                category.id,
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(category.id));
        }
        Ok(category)
    }

    async fn delete(&self, id: &str, scope: &Scope) -> Result<(), StorageError> {
        let existing = self.get_by_id(id, scope).await?;
        if existing.is_none() {
            let conn = self.open()?;
            let exists: bool = conn
                .query_row("SELECT 1 FROM memory_categories WHERE id = ?", [id], |_| Ok(true))
                .unwrap_or(false);
            return Err(if exists {
                StorageError::ScopeMismatch(id.to_string())
            } else {
                StorageError::NotFound(id.to_string())
            });
        }
        let conn = self.open()?;
        conn.execute("DELETE FROM memory_categories WHERE id = ?", [id])?;
        Ok(())
    }

    async fn similarity_search(
        &self,
        embedding: &[f32],
        k: usize,
        where_: &WhereFilter,
    ) -> Result<Vec<Scored<MemoryCategory>>, StorageError> {
        let candidates = self.list(where_).await?;
        let mut scored: Vec<Scored<MemoryCategory>> = candidates
            .into_iter()
            .filter_map(|c| {
                c.embedding
                    .clone()
                    .map(|e| Scored { score: cosine_similarity(embedding, &e), record: c })
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}
