use async_trait::async_trait;
use anyhow::Result;
use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::models::Document;
use crate::services::thumbnails::path::META_KEY_PREFIX;
use crate::services::thumbnails::{
    DocumentStore, MetaEntry, MetaReference, MetaValue, MetadataStore, ThumbnailError,
};

/// 转义 LIKE 模式中的通配符（配合 `ESCAPE '\'` 使用）
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// SQLite 数据库仓库实现
///
/// 同时充当文档存储与文档元数据存储
#[derive(Clone)]
pub struct SqliteRepository {
    pool: Pool<Sqlite>,
}

impl SqliteRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn insert_document(&self, title: &str, content: &str) -> Result<Document> {
        let now = Utc::now();

        let id = sqlx::query(
            "INSERT INTO documents (title, content, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(content)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Document {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn update_document(&self, document: &Document) -> Result<()> {
        sqlx::query("UPDATE documents SET title = ?, content = ?, updated_at = ? WHERE id = ?")
            .bind(&document.title)
            .bind(&document.content)
            .bind(document.updated_at)
            .bind(document.id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// 删除文档及其全部元数据，返回文档是否存在
    pub async fn delete_document(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM document_meta WHERE document_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(deleted > 0)
    }

    /// 追加一行元数据（不覆盖同名 key）
    pub async fn add_meta(&self, document_id: i64, key: &str, value: &str) -> Result<()> {
        sqlx::query("INSERT INTO document_meta (document_id, meta_key, meta_value) VALUES (?, ?, ?)")
            .bind(document_id)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for SqliteRepository {
    async fn get_document(&self, id: i64) -> Result<Option<Document>, ThumbnailError> {
        let document = sqlx::query_as::<_, Document>(
            "SELECT id, title, content, created_at, updated_at FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }
}

#[async_trait]
impl MetadataStore for SqliteRepository {
    async fn get_meta(&self, document_id: i64, key: &str) -> Result<Option<String>, ThumbnailError> {
        let value: Option<(String,)> = sqlx::query_as(
            "SELECT meta_value FROM document_meta WHERE document_id = ? AND meta_key = ? ORDER BY meta_id LIMIT 1",
        )
        .bind(document_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value.map(|(v,)| v))
    }

    async fn get_all_meta(&self, document_id: i64) -> Result<Vec<MetaEntry>, ThumbnailError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT meta_key, meta_value FROM document_meta WHERE document_id = ? ORDER BY meta_id",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        let mut entries: Vec<MetaEntry> = Vec::new();
        for (key, value) in rows {
            match entries.iter_mut().find(|e| e.key == key) {
                Some(MetaEntry {
                    value: MetaValue::Wrapped(values),
                    ..
                }) => values.push(value),
                Some(entry) => {
                    let first = entry.value.first().map(str::to_string);
                    entry.value = MetaValue::Wrapped(first.into_iter().chain([value]).collect());
                }
                None => entries.push(MetaEntry {
                    key,
                    value: MetaValue::Wrapped(vec![value]),
                }),
            }
        }

        Ok(entries)
    }

    async fn update_meta(
        &self,
        document_id: i64,
        key: &str,
        value: &str,
    ) -> Result<(), ThumbnailError> {
        self.update_meta_many(document_id, &[(key, value)]).await
    }

    async fn update_meta_many(
        &self,
        document_id: i64,
        entries: &[(&str, &str)],
    ) -> Result<(), ThumbnailError> {
        let mut tx = self.pool.begin().await?;

        for (key, value) in entries {
            sqlx::query("DELETE FROM document_meta WHERE document_id = ? AND meta_key = ?")
                .bind(document_id)
                .bind(*key)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                "INSERT INTO document_meta (document_id, meta_key, meta_value) VALUES (?, ?, ?)",
            )
            .bind(document_id)
            .bind(*key)
            .bind(*value)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn delete_meta(&self, document_id: i64, key: &str) -> Result<(), ThumbnailError> {
        sqlx::query("DELETE FROM document_meta WHERE document_id = ? AND meta_key = ?")
            .bind(document_id)
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_thumbnail_references(&self) -> Result<Vec<MetaReference>, ThumbnailError> {
        // 伴随 key 的 URL 值一并取出，调用方按文件名精确比较
        let key_pattern = format!("{}%", escape_like(META_KEY_PREFIX));

        let references = sqlx::query_as::<_, MetaReference>(
            "SELECT DISTINCT document_id, meta_value FROM document_meta \
             WHERE meta_key LIKE ? ESCAPE '\\'",
        )
        .bind(key_pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(references)
    }
}
