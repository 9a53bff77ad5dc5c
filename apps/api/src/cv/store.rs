//! Storage abstraction for CV records.
//!
//! The locator never issues SQL itself: it speaks to a `CvStore` in terms of
//! lookup keys, which keeps the resolution strategies testable against an
//! in-memory fake. `PgCvStore` is the production implementation; each
//! logical collection is a Postgres table with the shared CV schema.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::cv::models::CvDocument;

/// One interpretation of a loosely specified CV identifier.
#[derive(Debug, Clone)]
pub enum LookupKey<'a> {
    /// The identifier parsed as the native key type. Matching is done
    /// against the canonical (hyphenated, lowercase) rendering, which
    /// catches ids stored with different casing or formatting.
    NativeId(Uuid),
    /// The identifier compared verbatim against the primary id column.
    StringId(&'a str),
    /// The identifier compared against the secondary `file_id` column.
    FileId(&'a str),
    /// Substring match against the stored filename.
    FilenameContains(&'a str),
}

/// A lookup key plus an optional owner constraint.
#[derive(Debug, Clone)]
pub struct Lookup<'a> {
    pub key: LookupKey<'a>,
    /// When set, only records owned by this user match. Unset only in the
    /// explicitly opted-in unscoped fallback pass.
    pub owner: Option<&'a str>,
}

#[async_trait]
pub trait CvStore: Send + Sync {
    async fn find_one(&self, collection: &str, lookup: &Lookup<'_>) -> Result<Option<CvDocument>>;

    async fn insert(&self, collection: &str, doc: &CvDocument) -> Result<()>;

    /// Persists recovered text onto a record, optionally healing the stored
    /// file path, and bumps `last_used`. Returns false if no record matched.
    async fn update_extracted_text(
        &self,
        collection: &str,
        id: &str,
        text: &str,
        healed_path: Option<&Path>,
    ) -> Result<bool>;

    /// Bumps `last_used` on a successful read that did not modify the record.
    async fn touch_last_used(&self, collection: &str, id: &str) -> Result<()>;

    async fn list_for_user(&self, collection: &str, user_id: &str) -> Result<Vec<CvDocument>>;
}

/// Postgres-backed store. Collection names arrive pre-validated from config
/// (identifier character set only), so interpolating them into SQL is safe;
/// all values still go through bind parameters.
pub struct PgCvStore {
    pool: PgPool,
}

impl PgCvStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escapes LIKE wildcards in user-supplied fragments.
fn escape_like(fragment: &str) -> String {
    fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl CvStore for PgCvStore {
    async fn find_one(&self, collection: &str, lookup: &Lookup<'_>) -> Result<Option<CvDocument>> {
        let (predicate, value) = match &lookup.key {
            LookupKey::NativeId(id) => ("id = $1", id.to_string()),
            LookupKey::StringId(id) => ("id = $1", (*id).to_string()),
            LookupKey::FileId(id) => ("file_id = $1", (*id).to_string()),
            LookupKey::FilenameContains(fragment) => (
                "filename LIKE '%' || $1 || '%' ESCAPE '\\'",
                escape_like(fragment),
            ),
        };

        let sql = match lookup.owner {
            Some(_) => {
                format!("SELECT * FROM {collection} WHERE {predicate} AND user_id = $2 LIMIT 1")
            }
            None => format!("SELECT * FROM {collection} WHERE {predicate} LIMIT 1"),
        };

        let mut query = sqlx::query_as::<_, CvDocument>(&sql).bind(value);
        if let Some(owner) = lookup.owner {
            query = query.bind(owner);
        }

        Ok(query.fetch_optional(&self.pool).await?)
    }

    async fn insert(&self, collection: &str, doc: &CvDocument) -> Result<()> {
        let sql = format!(
            r#"
            INSERT INTO {collection}
                (id, user_id, file_id, filename, original_name, file_path,
                 content_type, file_size, extracted_text, content, cv_text,
                 uploaded_at, last_used)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#
        );
        sqlx::query(&sql)
            .bind(&doc.id)
            .bind(&doc.user_id)
            .bind(&doc.file_id)
            .bind(&doc.filename)
            .bind(&doc.original_name)
            .bind(&doc.file_path)
            .bind(&doc.content_type)
            .bind(doc.file_size)
            .bind(&doc.extracted_text)
            .bind(&doc.content)
            .bind(&doc.cv_text)
            .bind(doc.uploaded_at)
            .bind(doc.last_used)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_extracted_text(
        &self,
        collection: &str,
        id: &str,
        text: &str,
        healed_path: Option<&Path>,
    ) -> Result<bool> {
        let result = match healed_path {
            Some(path) => {
                let sql = format!(
                    "UPDATE {collection} \
                     SET extracted_text = $2, file_path = $3, last_used = now() \
                     WHERE id = $1"
                );
                sqlx::query(&sql)
                    .bind(id)
                    .bind(text)
                    .bind(path.to_string_lossy().as_ref())
                    .execute(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "UPDATE {collection} SET extracted_text = $2, last_used = now() WHERE id = $1"
                );
                sqlx::query(&sql)
                    .bind(id)
                    .bind(text)
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected() > 0)
    }

    async fn touch_last_used(&self, collection: &str, id: &str) -> Result<()> {
        let sql = format!("UPDATE {collection} SET last_used = now() WHERE id = $1");
        sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(())
    }

    async fn list_for_user(&self, collection: &str, user_id: &str) -> Result<Vec<CvDocument>> {
        let sql = format!(
            "SELECT * FROM {collection} WHERE user_id = $1 ORDER BY uploaded_at DESC LIMIT 100"
        );
        Ok(sqlx::query_as::<_, CvDocument>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }
}
