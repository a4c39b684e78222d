use async_trait::async_trait;
use rusqlite::{params_from_iter, types::Value as SqlValue, Row};

use crate::model::{Modality, Resource};
use crate::scope::Scope;
use crate::storage::error::StorageError;
use crate::storage::filter::WhereFilter;
use crate::storage::repository::{ResourceRepository, Scored};
use crate::storage::similarity::cosine_similarity;

use super::common::{
    build_where_clause, check_embedding_dimension, embedding_from_json, embedding_to_json, scope_columns_for_insert,
    scope_from_json, scope_to_json, timestamp_from_text, timestamp_to_text,
};
use super::RelationalConfig;

pub struct RelationalResourceRepository {
    config: RelationalConfig,
}

impl RelationalResourceRepository {
    pub fn new(config: RelationalConfig) -> Self {
        Self { config }
    }

    fn open(&self) -> Result<rusqlite::Connection, StorageError> {
        Ok(rusqlite::Connection::open(&self.config.dsn)?)
    }
}

pub(crate) fn row_to_resource(row: &Row) -> rusqlite::Result<(Resource, String)> {
    let modality_str: String = row.get("modality")?;
    let embedding_raw: Option<String> = row.get("embedding")?;
    let scope_json: String = row.get("scope_json")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let resource = (
        Resource {
            id: row.get("id")?,
            url: row.get("url")?,
            modality: modality_str.parse::<Modality>().unwrap_or(Modality::Document),
            local_path: row.get("local_path")?,
            caption: row.get("caption")?,
            embedding: embedding_from_json(&embedding_raw).unwrap_or(None),
            created_at: timestamp_from_text(&created_at).unwrap_or_else(|_| chrono::Utc::now()),
            updated_at: timestamp_from_text(&updated_at).unwrap_or_else(|_| chrono::Utc::now()),
            scope: scope_from_json(&scope_json).unwrap_or_default(),
        },
        scope_json,
    );
    Ok(resource)
}

#[async_trait]
impl ResourceRepository for RelationalResourceRepository {
    async fn create(&self, resource: Resource) -> Result<Resource, StorageError> {
        let config = self.config.clone();
        let resource2 = resource.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
            let conn = rusqlite::Connection::open(&config.dsn)?;
            let scope_json_for_check = scope_to_json(&resource2.scope)?;
            check_embedding_dimension(&conn, "resources", &scope_json_for_check, &resource2.id, &resource2.embedding)?;
            let scope_cols = scope_columns_for_insert(&config.scope_model, &resource2.scope)?;
            let mut columns = vec![
                "id".to_string(),
                "url".to_string(),
                "modality".to_string(),
                "local_path".to_string(),
                "caption".to_string(),
                "embedding".to_string(),
                "created_at".to_string(),
                "updated_at".to_string(),
                "scope_json".to_string(),
            ];
            let mut values: Vec<SqlValue> = vec![
                SqlValue::Text(resource2.id.clone()),
                SqlValue::Text(resource2.url.clone()),
                SqlValue::Text(resource2.modality.as_str().to_string()),
                resource2.local_path.clone().map(SqlValue::Text).unwrap_or(SqlValue::Null),
                resource2.caption.clone().map(SqlValue::Text).unwrap_or(SqlValue::Null),
                embedding_to_json(&resource2.embedding)?.map(SqlValue::Text).unwrap_or(SqlValue::Null),
                SqlValue::Text(timestamp_to_text(&resource2.created_at)),
                SqlValue::Text(timestamp_to_text(&resource2.updated_at)),
                SqlValue::Text(scope_to_json(&resource2.scope)?),
            ];
            for (col, val) in scope_cols {
                columns.push(col);
                values.push(SqlValue::Text(val));
            }
            let placeholders = columns.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
            let sql = format!(
                "INSERT INTO resources ({}) VALUES ({})",
                columns.join(", "),
                placeholders
            );
            conn.execute(&sql, params_from_iter(values))?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::BackendUnavailable(e.to_string()))??;
        Ok(resource)
    }

    async fn get_by_id(&self, id: &str, scope: &Scope) -> Result<Option<Resource>, StorageError> {
        let conn = self.open()?;
        let id = id.to_string();
        let scope = scope.clone();
        let row = conn
            .query_row("SELECT * FROM resources WHERE id = ?", [&id], row_to_resource)
            .ok();
        Ok(row.and_then(|(r, _)| if r.scope == scope { Some(r) } else { None }))
    }

    async fn list(&self, where_: &WhereFilter) -> Result<Vec<Resource>, StorageError> {
        let conn = self.open()?;
        let (clause, sql_params) = build_where_clause(where_);
        let sql = format!("SELECT * FROM resources WHERE {clause}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(sql_params), row_to_resource)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?.0);
        }
        Ok(out)
    }

    async fn update(&self, resource: Resource) -> Result<Resource, StorageError> {
        let conn = self.open()?;
        let scope_json = scope_to_json(&resource.scope)?;
        check_embedding_dimension(&conn, "resources", &scope_json, &resource.id, &resource.embedding)?;
        let embedding_json = embedding_to_json(&resource.embedding)?;
        let changed = conn.execute(
            "UPDATE resources SET url = ?, modality = ?, local_path = ?, caption = ?, embedding = ?, updated_at = ? WHERE id = ?",
            rusqlite::params![
                resource.url,
                resource.modality.as_str(),
                resource.local_path,
                resource.caption,
                embedding_json,
                timestamp_to_text(&resource.updated_at),
                resource.id,
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(resource.id));
        }
        Ok(resource)
    }

    async fn delete(&self, id: &str, scope: &Scope) -> Result<(), StorageError> {
        let existing = self.get_by_id(id, scope).await?;
        if existing.is_none() {
            let conn = self.open()?;
            let exists: bool = conn
                .query_row("SELECT 1 FROM resources WHERE id = ?", [id], |_| Ok(true))
                .unwrap_or(false);
            return Err(if exists {
                StorageError::ScopeMismatch(id.to_string())
            } else {
                StorageError::NotFound(id.to_string())
            });
        }
        let conn = self.open()?;
        conn.execute("DELETE FROM resources WHERE id = ?", [id])?;
        Ok(())
    }

    async fn similarity_search(
        &self,
        embedding: &[f32],
        k: usize,
        where_: &WhereFilter,
    ) -> Result<Vec<Scored<Resource>>, StorageError> {
        let candidates = self.list(where_).await?;
        let mut scored: Vec<Scored<Resource>> = candidates
            .into_iter()
            .filter_map(|r| {
                r.embedding
                    .clone()
                    .map(|e| Scored { score: cosine_similarity(embedding, &e), record: r })
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}
