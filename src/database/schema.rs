use sqlx::{Pool, Sqlite, Row};
use anyhow::Result;

/// 验证数据库schema完整性
pub async fn verify_schema(pool: &Pool<Sqlite>) -> Result<()> {
    // 检查所有必需的表是否存在
    let required_tables = vec!["documents", "document_meta"];

    for table in required_tables {
        let exists = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name=?")
            .bind(table)
            .fetch_optional(pool)
            .await?;

        if exists.is_none() {
            return Err(anyhow::anyhow!("Required table '{}' does not exist", table));
        }
    }

    // 检查关键索引是否存在
    let required_indexes = vec!["idx_document_meta_document_id", "idx_document_meta_key"];

    for index in required_indexes {
        let exists = sqlx::query("SELECT name FROM sqlite_master WHERE type='index' AND name=?")
            .bind(index)
            .fetch_optional(pool)
            .await?;

        if exists.is_none() {
            return Err(anyhow::anyhow!("Required index '{}' does not exist", index));
        }
    }

    // 验证外键约束是否启用
    let foreign_keys_enabled: i32 = sqlx::query("PRAGMA foreign_keys")
        .fetch_one(pool)
        .await?
        .get(0);

    if foreign_keys_enabled != 1 {
        tracing::warn!("Foreign key constraints are not enabled");
    }

    tracing::debug!("Database schema verification completed successfully");
    Ok(())
}

/// 获取数据库统计信息
pub async fn get_database_stats(pool: &Pool<Sqlite>) -> Result<DatabaseStats> {
    let document_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(pool)
        .await?;

    let meta_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM document_meta")
        .fetch_one(pool)
        .await?;

    // 伴随 key 的值是 URL，文件名 key 的值是文件名
    let thumbnail_reference_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM document_meta WHERE meta_key LIKE 'embed\\_privacy\\_thumbnail\\_%' ESCAPE '\\' AND meta_value NOT LIKE '%://%'",
    )
    .fetch_one(pool)
    .await?;

    // 获取数据库文件大小
    let db_size: i64 = sqlx::query_scalar("SELECT page_count * page_size as size FROM pragma_page_count(), pragma_page_size()")
        .fetch_one(pool)
        .await?;

    Ok(DatabaseStats {
        document_count,
        meta_count,
        thumbnail_reference_count,
        database_size_bytes: db_size,
    })
}

/// 数据库统计信息
#[derive(Debug)]
pub struct DatabaseStats {
    pub document_count: i64,
    pub meta_count: i64,
    pub thumbnail_reference_count: i64,
    pub database_size_bytes: i64,
}

impl DatabaseStats {
    pub fn database_size_mb(&self) -> f64 {
        self.database_size_bytes as f64 / (1024.0 * 1024.0)
    }
}
