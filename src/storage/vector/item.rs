use async_trait::async_trait;
use rusqlite::params;

use crate::model::MemoryItem;
use crate::scope::Scope;
use crate::storage::error::StorageError;
use crate::storage::filter::WhereFilter;
use crate::storage::relational::common::build_where_clause;
use crate::storage::relational::item::row_to_item;
use crate::storage::relational::{RelationalConfig, RelationalItemRepository};
use crate::storage::repository::{ItemRepository, Scored};
use crate::storage::similarity::cosine_similarity;

fn vector_to_json(v: &[f32]) -> String {
    let parts: Vec<String> = v.iter().map(|f| f.to_string()).collect();
    format!("[{}]", parts.join(","))
}

pub struct VectorItemRepository {
    inner: RelationalItemRepository,
    config: RelationalConfig,
    native: bool,
}

impl VectorItemRepository {
    pub fn new(config: RelationalConfig, native: bool) -> Self {
        Self { inner: RelationalItemRepository::new(config.clone()), config, native }
    }

    fn open(&self) -> Result<rusqlite::Connection, StorageError> {
        Ok(rusqlite::Connection::open(&self.config.dsn)?)
    }

    fn sync_vec_row(&self, id: &str, embedding: &Option<Vec<f32>>) -> Result<(), StorageError> {
        if !self.native {
            return Ok(());
        }
        let conn = self.open()?;
        let existing_rowid: Option<i64> = conn
            .query_row("SELECT vec_rowid FROM memory_items WHERE id = ?", [id], |r| r.get(0))
            .unwrap_or(None);
        if let Some(rowid) = existing_rowid {
            conn.execute("DELETE FROM items_vec WHERE rowid = ?", params![rowid])?;
        }
        let Some(embedding) = embedding else {
            return Ok(());
        };
        let vec_json = vector_to_json(embedding);
        conn.execute("INSERT INTO items_vec (embedding) VALUES (?)", params![vec_json])?;
        let rowid = conn.last_insert_rowid();
        conn.execute("UPDATE memory_items SET vec_rowid = ? WHERE id = ?", params![rowid, id])?;
        Ok(())
    }

    fn clear_vec_row(&self, id: &str) -> Result<(), StorageError> {
        if !self.native {
            return Ok(());
        }
        let conn = self.open()?;
        let rowid: Option<i64> = conn
            .query_row("SELECT vec_rowid FROM memory_items WHERE id = ?", [id], |r| r.get(0))
            .unwrap_or(None);
        if let Some(rowid) = rowid {
            conn.execute("DELETE FROM items_vec WHERE rowid = ?", params![rowid])?;
        }
        Ok(())
    }
}

#[async_trait]
impl ItemRepository for VectorItemRepository {
    async fn create(&self, item: MemoryItem) -> Result<MemoryItem, StorageError> {
        let created = self.inner.create(item).await?;
        self.sync_vec_row(&created.id, &created.embedding)?;
        Ok(created)
    }

    async fn get_by_id(&self, id: &str, scope: &Scope) -> Result<Option<MemoryItem>, StorageError> {
        self.inner.get_by_id(id, scope).await
    }

    async fn list(&self, where_: &WhereFilter) -> Result<Vec<MemoryItem>, StorageError> {
        self.inner.list(where_).await
    }

    async fn update(&self, item: MemoryItem) -> Result<MemoryItem, StorageError> {
        let updated = self.inner.update(item).await?;
        self.sync_vec_row(&updated.id, &updated.embedding)?;
        Ok(updated)
    }

    async fn delete(&self, id: &str, scope: &Scope) -> Result<(), StorageError> {
        self.clear_vec_row(id)?;
        self.inner.delete(id, scope).await
    }

    async fn similarity_search(
        &self,
        embedding: &[f32],
        k: usize,
        where_: &WhereFilter,
    ) -> Result<Vec<Scored<MemoryItem>>, StorageError> {
        if !self.native {
            return self.inner.similarity_search(embedding, k, where_).await;
        }

        let conn = self.open()?;
        let (clause, mut sql_params) = build_where_clause(where_);
        let vec_json = vector_to_json(embedding);
        let sql = format!(
            "SELECT i.* FROM items_vec v \
             JOIN memory_items i ON i.vec_rowid = v.rowid \
             WHERE v.embedding MATCH ?1 AND k = ?2 AND {clause} \
             ORDER BY v.distance"
        );
        let mut bound: Vec<rusqlite::types::Value> =
            vec![rusqlite::types::Value::Text(vec_json), rusqlite::types::Value::Integer(k as i64)];
        bound.append(&mut sql_params);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(bound), row_to_item)?;
        let mut scored = Vec::new();
        for row in rows {
            let record = row?;
            let score = record
                .embedding
                .as_ref()
                .map(|e| cosine_similarity(embedding, e))
                .unwrap_or(0.0);
            scored.push(Scored { record, score });
        }
        Ok(scored)
    }
}
