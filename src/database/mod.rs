use sqlx::{sqlite::{SqlitePoolOptions, SqliteConnectOptions}, Pool, Sqlite};
use anyhow::Result;
use std::str::FromStr;

pub mod schema;
pub mod repository;

pub use repository::SqliteRepository;

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    repository: SqliteRepository,
}

impl Database {
    /// 从 `DATABASE_URL` 连接数据库
    pub async fn new() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:./embed_thumbnails.db?mode=rwc".to_string());

        Self::connect(&database_url).await
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        tracing::info!("Connecting to database: {}", database_url);

        // 配置 SQLite 连接选项
        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(30));  // 设置忙等待超时

        // SQLite 单写入者，限制为1个连接；内存库的连接不能被回收，否则数据丢失
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await?;

        // Run migrations
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;

        // Verify schema integrity
        schema::verify_schema(&pool).await?;

        let stats = schema::get_database_stats(&pool).await?;
        tracing::info!(
            "Database initialized - Documents: {}, Meta rows: {}, Thumbnail references: {}, Size: {:.2} MB",
            stats.document_count,
            stats.meta_count,
            stats.thumbnail_reference_count,
            stats.database_size_mb()
        );

        let repository = SqliteRepository::new(pool.clone());

        Ok(Self { pool, repository })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub fn repository(&self) -> &SqliteRepository {
        &self.repository
    }

    /// 获取数据库统计信息
    pub async fn get_stats(&self) -> Result<schema::DatabaseStats> {
        schema::get_database_stats(&self.pool).await
    }

    /// 验证数据库完整性
    pub async fn verify_integrity(&self) -> Result<()> {
        schema::verify_schema(&self.pool).await
    }
}
