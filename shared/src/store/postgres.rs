use async_trait::async_trait;
use serde_json::Value;
use sqlx::Row;
use tracing::{debug, instrument};

use super::search::{self, SearchIndexDefinition};
use super::subdoc::apply_mutations;
use super::{
    ensure_object, Cas, Document, DocumentStore, MutateInSpec, QueryStatement, SearchQuery,
    SearchResults, StoreError, StoreResult,
};
use crate::database::postgres::{ensure_bucket_table, quote_ident};
use crate::database::{test_connection, DatabaseError, DbPool};

/// [`DocumentStore`] backed by one PostgreSQL table per bucket.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: DbPool,
    bucket: String,
    table: String,
    indexes: Vec<SearchIndexDefinition>,
}

impl PostgresStore {
    /// Open `bucket`, creating its table when missing.
    pub async fn open(pool: DbPool, bucket: &str) -> Result<Self, DatabaseError> {
        ensure_bucket_table(&pool, bucket).await?;
        Ok(Self {
            pool,
            bucket: bucket.to_string(),
            table: quote_ident(bucket),
            indexes: Vec::new(),
        })
    }

    /// Register a full-text index searchable through [`DocumentStore::search`].
    pub fn with_search_index(mut self, index: SearchIndexDefinition) -> Self {
        self.indexes.retain(|existing| existing.name != index.name);
        self.indexes.push(index);
        self
    }

    fn search_index(&self, name: &str) -> StoreResult<&SearchIndexDefinition> {
        self.indexes
            .iter()
            .find(|index| index.name == name)
            .ok_or_else(|| StoreError::SearchIndexNotFound(name.to_string()))
    }
}

fn to_cas(raw: i64) -> Cas {
    raw.max(0) as Cas
}

#[async_trait]
impl DocumentStore for PostgresStore {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get(&self, id: &str) -> StoreResult<Document> {
        let statement = format!("SELECT cas, content FROM {} WHERE id = $1", self.table);
        let row = sqlx::query(&statement)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::DocumentNotFound(id.to_string()))?;

        Ok(Document {
            id: id.to_string(),
            cas: to_cas(row.try_get("cas")?),
            content: row.try_get("content")?,
        })
    }

    #[instrument(skip(self, content), fields(bucket = %self.bucket))]
    async fn insert(&self, id: &str, content: &Value) -> StoreResult<Cas> {
        ensure_object(id, content)?;
        let statement = format!(
            "INSERT INTO {} (id, cas, content) VALUES ($1, 1, $2) \
             ON CONFLICT (id) DO NOTHING RETURNING cas",
            self.table
        );
        let cas: Option<i64> = sqlx::query_scalar(&statement)
            .bind(id)
            .bind(content)
            .fetch_optional(&self.pool)
            .await?;

        match cas {
            Some(cas) => {
                debug!("Inserted document {}", id);
                Ok(to_cas(cas))
            }
            None => Err(StoreError::DocumentExists(id.to_string())),
        }
    }

    #[instrument(skip(self, content), fields(bucket = %self.bucket))]
    async fn upsert(&self, id: &str, content: &Value) -> StoreResult<Cas> {
        ensure_object(id, content)?;
        let statement = format!(
            "INSERT INTO {table} (id, cas, content) VALUES ($1, 1, $2) \
             ON CONFLICT (id) DO UPDATE SET cas = {table}.cas + 1, content = EXCLUDED.content \
             RETURNING cas",
            table = self.table
        );
        let cas: i64 = sqlx::query_scalar(&statement)
            .bind(id)
            .bind(content)
            .fetch_one(&self.pool)
            .await?;

        debug!("Upserted document {} at cas {}", id, cas);
        Ok(to_cas(cas))
    }

    #[instrument(skip(self, content), fields(bucket = %self.bucket))]
    async fn replace(&self, id: &str, content: &Value, cas: Cas) -> StoreResult<Cas> {
        ensure_object(id, content)?;
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT cas FROM {} WHERE id = $1 FOR UPDATE", self.table);
        let current: i64 = sqlx::query_scalar(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::DocumentNotFound(id.to_string()))?;

        if to_cas(current) != cas {
            return Err(StoreError::CasMismatch {
                id: id.to_string(),
                expected: cas,
                actual: to_cas(current),
            });
        }

        let update = format!(
            "UPDATE {} SET cas = cas + 1, content = $2 WHERE id = $1 RETURNING cas",
            self.table
        );
        let next: i64 = sqlx::query_scalar(&update)
            .bind(id)
            .bind(content)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(to_cas(next))
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn remove(&self, id: &str) -> StoreResult<()> {
        let statement = format!("DELETE FROM {} WHERE id = $1", self.table);
        let result = sqlx::query(&statement).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DocumentNotFound(id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self, statement), fields(bucket = %self.bucket))]
    async fn query(&self, statement: &QueryStatement) -> StoreResult<Vec<Value>> {
        debug!("Running statement: {}", statement.statement);

        let mut query = sqlx::query(&statement.statement);
        for param in &statement.params {
            query = query.bind(param);
        }
        let rows = query.fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| {
                row.try_get::<Value, _>("row")
                    .map_err(|e| StoreError::Query(e.to_string()))
            })
            .collect()
    }

    #[instrument(skip(self, specs), fields(bucket = %self.bucket))]
    async fn mutate_in(&self, id: &str, specs: &[MutateInSpec]) -> StoreResult<Cas> {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT content FROM {} WHERE id = $1 FOR UPDATE",
            self.table
        );
        let mut content: Value = sqlx::query_scalar(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| StoreError::DocumentNotFound(id.to_string()))?;

        apply_mutations(&mut content, specs)?;

        let update = format!(
            "UPDATE {} SET cas = cas + 1, content = $2 WHERE id = $1 RETURNING cas",
            self.table
        );
        let cas: i64 = sqlx::query_scalar(&update)
            .bind(id)
            .bind(&content)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!("Applied {} mutation(s) to {}", specs.len(), id);
        Ok(to_cas(cas))
    }

    #[instrument(skip(self, query), fields(bucket = %self.bucket, index = %query.index))]
    async fn search(&self, query: &SearchQuery) -> StoreResult<SearchResults> {
        let index = self.search_index(&query.index)?;

        let rows = match &index.doc_type {
            Some(doc_type) => {
                let statement = format!(
                    "SELECT id, cas, content FROM {} WHERE content->>'type' = $1",
                    self.table
                );
                sqlx::query(&statement)
                    .bind(doc_type)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let statement = format!("SELECT id, cas, content FROM {}", self.table);
                sqlx::query(&statement).fetch_all(&self.pool).await?
            }
        };

        let documents = rows
            .iter()
            .map(|row| {
                Ok(Document {
                    id: row.try_get("id")?,
                    cas: to_cas(row.try_get("cas")?),
                    content: row.try_get("content")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        search::execute(index, query, &documents)
    }

    async fn ping(&self) -> StoreResult<()> {
        test_connection(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}
