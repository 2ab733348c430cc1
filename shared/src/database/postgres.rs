/// PostgreSQL-specific utilities for bucket tables
use sqlx::postgres::PgPool;
use tracing::{debug, info};

use super::{DatabaseError, DatabaseResult};

/// Quote a bucket name for use as a SQL identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Check if a table exists in the database
pub async fn table_exists(pool: &PgPool, table_name: &str) -> DatabaseResult<bool> {
    let row: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name = $1
        )
        "#,
    )
    .bind(table_name)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::Connection)?;

    Ok(row.0)
}

/// Create the table backing a bucket if it is missing.
///
/// Every bucket has the same shape: the document key, its cas and the JSON
/// body. The GIN index serves the `content->>'type' = ...` filters.
pub async fn ensure_bucket_table(pool: &PgPool, bucket: &str) -> DatabaseResult<()> {
    if bucket.is_empty() {
        return Err(DatabaseError::Config("bucket name is empty".to_string()));
    }

    if table_exists(pool, bucket).await? {
        debug!("Bucket '{}' already exists", bucket);
        return Ok(());
    }

    info!("Creating bucket '{}'", bucket);

    let table = quote_ident(bucket);
    let create_table = format!(
        "CREATE TABLE IF NOT EXISTS {} (\
            id TEXT PRIMARY KEY, \
            cas BIGINT NOT NULL, \
            content JSONB NOT NULL)",
        table
    );
    sqlx::query(&create_table)
        .execute(pool)
        .await
        .map_err(DatabaseError::Connection)?;

    let index_name = quote_ident(&format!("{}_content_idx", bucket));
    let create_index = format!(
        "CREATE INDEX IF NOT EXISTS {} ON {} USING GIN (content)",
        index_name, table
    );
    sqlx::query(&create_index)
        .execute(pool)
        .await
        .map_err(DatabaseError::Connection)?;

    Ok(())
}
