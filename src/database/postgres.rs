use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use super::document::{
    with_id, DeleteResult, Document, Filter, InsertOneResult, Projection, UpdateResult, ID_FIELD,
};
use super::store::{DocumentStore, StoreError};
use crate::config::is_valid_collection_name;

/// Document store on PostgreSQL: one JSONB table per collection.
///
/// Field filters use JSONB containment (`doc @> filter`), so they match on
/// equality of top-level fields only.
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        connection_timeout: u64,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connection_timeout))
            .connect(database_url)
            .await?;

        info!("Connected to document store at {}", redact_url(database_url));
        Ok(Self { pool })
    }

    /// Create the backing table for each collection if it does not exist
    pub async fn ensure_collections(&self, collections: &[&str]) -> Result<(), StoreError> {
        for collection in collections {
            let table = table_name(collection)?;
            let ddl = format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id UUID PRIMARY KEY,
                    doc JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
                )"
            );
            sqlx::query(&ddl).execute(&self.pool).await?;

            let index = format!(
                "CREATE INDEX IF NOT EXISTS {} ON {table} USING GIN (doc jsonb_path_ops)",
                quote_identifier(&format!("{collection}_doc_idx"))
            );
            sqlx::query(&index).execute(&self.pool).await?;

            info!("Collection ready: {}", collection);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Vec<Document>, StoreError> {
        let sql = format!(
            "SELECT id, doc FROM {} WHERE {} ORDER BY created_at, id",
            table_name(collection)?,
            FILTER_CLAUSE
        );

        let rows: Vec<(Uuid, Json<Value>)> = sqlx::query_as(&sql)
            .bind(filter.id)
            .bind(Json(Value::Object(filter.fields.clone())))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(doc))| {
                let doc = with_id(id, into_document(doc));
                match projection {
                    Some(p) => p.apply(doc),
                    None => doc,
                }
            })
            .collect())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let sql = format!(
            "SELECT id, doc FROM {} WHERE {} ORDER BY created_at, id LIMIT 1",
            table_name(collection)?,
            FILTER_CLAUSE
        );

        let row: Option<(Uuid, Json<Value>)> = sqlx::query_as(&sql)
            .bind(filter.id)
            .bind(Json(Value::Object(filter.fields.clone())))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id, Json(doc))| with_id(id, into_document(doc))))
    }

    async fn insert_one(&self, collection: &str, mut doc: Document) -> Result<InsertOneResult, StoreError> {
        let sql = format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", table_name(collection)?);
        doc.remove(ID_FIELD);

        let id = Uuid::new_v4();
        sqlx::query(&sql)
            .bind(id)
            .bind(Json(Value::Object(doc)))
            .execute(&self.pool)
            .await?;

        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        mut set: Document,
    ) -> Result<UpdateResult, StoreError> {
        let table = table_name(collection)?;
        let sql = format!(
            "WITH target AS (
                SELECT id, doc FROM {table} WHERE {FILTER_CLAUSE} ORDER BY created_at, id LIMIT 1
            )
            UPDATE {table} AS d SET doc = d.doc || $3
            FROM target
            WHERE d.id = target.id
            RETURNING target.doc IS DISTINCT FROM d.doc"
        );
        set.remove(ID_FIELD);

        let row: Option<(bool,)> = sqlx::query_as(&sql)
            .bind(filter.id)
            .bind(Json(Value::Object(filter.fields.clone())))
            .bind(Json(Value::Object(set)))
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some((modified,)) => UpdateResult {
                acknowledged: true,
                matched_count: 1,
                modified_count: u64::from(modified),
            },
            None => UpdateResult {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
            },
        })
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<DeleteResult, StoreError> {
        let table = table_name(collection)?;
        let sql = format!(
            "DELETE FROM {table} WHERE id = (
                SELECT id FROM {table} WHERE {FILTER_CLAUSE} ORDER BY created_at, id LIMIT 1
            )"
        );

        let result = sqlx::query(&sql)
            .bind(filter.id)
            .bind(Json(Value::Object(filter.fields.clone())))
            .execute(&self.pool)
            .await?;

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: result.rows_affected(),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Closed document store pool");
    }
}

/// `$1` is the optional id, `$2` the JSONB field filter
const FILTER_CLAUSE: &str = "($1::uuid IS NULL OR id = $1) AND doc @> $2";

fn table_name(collection: &str) -> Result<String, StoreError> {
    if !is_valid_collection_name(collection) {
        return Err(StoreError::InvalidCollection(collection.to_string()));
    }
    Ok(quote_identifier(collection))
}

/// Quote SQL identifier to prevent injection
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn into_document(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

/// Host and database portion of a connection URL, without credentials
fn redact_url(database_url: &str) -> String {
    match url::Url::parse(database_url) {
        Ok(url) => format!(
            "{}:{}{}",
            url.host_str().unwrap_or("localhost"),
            url.port().unwrap_or(5432),
            url.path()
        ),
        Err(_) => "<invalid url>".to_string(),
    }
}
