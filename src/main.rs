use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use embed_thumbnail_cache::api::{self, AppState};
use embed_thumbnail_cache::database::Database;
use embed_thumbnail_cache::services::thumbnails::{
    ConfigManager, HttpThumbnailFetcher, LifecycleHooks, ProviderRegistry, ThumbnailService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize database
    let database = Database::new().await?;

    // 加载缩略图配置，支持环境变量配置路径
    let config_path = std::env::var("THUMBNAIL_CONFIG_PATH").ok().map(PathBuf::from);
    let config_manager = Arc::new(ConfigManager::load(config_path).await?);
    let config = config_manager.get_config().await;

    // Initialize thumbnail service
    let repository = Arc::new(database.repository().clone());
    let fetcher = Arc::new(
        HttpThumbnailFetcher::new(config.fetch_timeout())?.with_max_bytes(config.max_download_bytes),
    );
    let service = ThumbnailService::new(
        repository.clone(),
        repository,
        fetcher,
        ProviderRegistry::with_defaults(),
        config.thumbnail_paths(),
    )
    .await?;

    let hooks = Arc::new(LifecycleHooks::register(&config, service));

    let app = api::router(
        AppState {
            database: database.clone(),
            hooks,
            config: config_manager.clone(),
        },
        &config.install_root,
    );

    // Run the server
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("🚀 Server listening on {}", addr);
    tracing::info!("📁 Serving static files from {:?}", config.install_root);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
