use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres};
use tracing::debug;

use super::{DocRef, Document, DocumentStore, FieldFilter, StoreError, StoreResult, Transaction};

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// JSONB documents in a single `documents` table keyed by `(collection, id)`.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn get(&self, doc: &DocRef) -> StoreResult<Option<Value>> {
        let data = sqlx::query_scalar::<_, Value>(
            r#"SELECT data FROM documents WHERE collection = $1 AND id = $2"#,
        )
        .bind(&doc.collection)
        .bind(&doc.id)
        .fetch_optional(&self.db)
        .await?;
        Ok(data)
    }

    async fn set(&self, doc: &DocRef, value: Value) -> StoreResult<()> {
        upsert(&self.db, doc, value).await
    }

    async fn update(&self, doc: &DocRef, fields: Map<String, Value>) -> StoreResult<()> {
        let done = sqlx::query(
            r#"
            UPDATE documents
               SET data = data || $3, updated_at = now()
             WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(&doc.collection)
        .bind(&doc.id)
        .bind(Value::Object(fields))
        .execute(&self.db)
        .await?;
        if done.rows_affected() == 0 {
            return Err(StoreError::Missing(doc.clone()));
        }
        Ok(())
    }

    async fn delete(&self, doc: &DocRef) -> StoreResult<()> {
        sqlx::query(r#"DELETE FROM documents WHERE collection = $1 AND id = $2"#)
            .bind(&doc.collection)
            .bind(&doc.id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filter: Option<&FieldFilter>,
        order_by: Option<&str>,
    ) -> StoreResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, (String, Value)>(
            r#"
            SELECT id, data
              FROM documents
             WHERE collection = $1
               AND ($2::text IS NULL OR data -> $2::text = $3::jsonb)
             ORDER BY CASE WHEN $4::text IS NULL THEN NULL ELSE data -> $4::text END ASC NULLS FIRST,
                      id ASC
            "#,
        )
        .bind(collection)
        .bind(filter.map(|f| f.field.as_str()))
        .bind(filter.map(|f| f.equals.clone()))
        .bind(order_by)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, data)| Document { id, data })
            .collect())
    }

    async fn begin(&self) -> StoreResult<Box<dyn Transaction>> {
        let tx = self.db.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }
}

async fn upsert<'e, E>(executor: E, doc: &DocRef, value: Value) -> StoreResult<()>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO documents (collection, id, data, updated_at)
        VALUES ($1, $2, $3, now())
        ON CONFLICT (collection, id)
        DO UPDATE SET data = EXCLUDED.data, updated_at = now()
        "#,
    )
    .bind(&doc.collection)
    .bind(&doc.id)
    .bind(value)
    .execute(executor)
    .await?;
    Ok(())
}

struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn get(&mut self, doc: &DocRef) -> StoreResult<Option<Value>> {
        // Held until commit/rollback; also covers documents that do not exist yet.
        sqlx::query(r#"SELECT pg_advisory_xact_lock(hashtextextended($1, 0))"#)
            .bind(doc.to_string())
            .execute(&mut *self.tx)
            .await?;
        debug!(doc = %doc, "document locked");

        let data = sqlx::query_scalar::<_, Value>(
            r#"SELECT data FROM documents WHERE collection = $1 AND id = $2"#,
        )
        .bind(&doc.collection)
        .bind(&doc.id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(data)
    }

    async fn set(&mut self, doc: &DocRef, value: Value) -> StoreResult<()> {
        upsert(&mut *self.tx, doc, value).await
    }

    async fn delete(&mut self, doc: &DocRef) -> StoreResult<()> {
        sqlx::query(r#"DELETE FROM documents WHERE collection = $1 AND id = $2"#)
            .bind(&doc.collection)
            .bind(&doc.id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
