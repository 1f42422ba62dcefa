// 集成测试公共设施
//
// - 按 URL 片段决定成败的获取器
// - 基于内存 SQLite 与临时目录的服务构造

#![allow(dead_code)]

use async_trait::async_trait;
use embed_thumbnail_cache::database::{Database, SqliteRepository};
use embed_thumbnail_cache::services::thumbnails::{
    FetchError, ProviderRegistry, ThumbnailFetcher, ThumbnailPaths, ThumbnailService,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const EMBED_URL: &str = "https://youtu.be/abc123";
pub const THUMBNAIL_URL: &str = "https://i.ytimg.com/vi/abc123/hqdefault.jpg";

/// URL 中包含任一失败片段时返回 404，否则写出一个临时文件
#[derive(Default)]
pub struct ScriptedFetcher {
    failing: Vec<String>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn failing(fragments: &[&str]) -> Self {
        Self {
            failing: fragments.iter().map(|f| f.to_string()).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ThumbnailFetcher for ScriptedFetcher {
    async fn fetch_to_temp(&self, url: &str, temp_dir: &Path) -> Result<PathBuf, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());

        if self.failing.iter().any(|f| url.contains(f.as_str())) {
            return Err(FetchError::HttpError(404));
        }

        let path = temp_dir.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, url.as_bytes())
            .await
            .map_err(|e| FetchError::TempFile(e.to_string()))?;
        Ok(path)
    }
}

pub struct Harness {
    pub root: TempDir,
    pub database: Database,
    pub fetcher: Arc<ScriptedFetcher>,
    pub service: ThumbnailService,
}

impl Harness {
    pub async fn new(fetcher: ScriptedFetcher) -> Self {
        Self::with_providers(fetcher, ProviderRegistry::with_defaults()).await
    }

    pub async fn with_providers(fetcher: ScriptedFetcher, providers: ProviderRegistry) -> Self {
        let root = TempDir::new().unwrap();
        let database = Database::connect("sqlite::memory:").await.unwrap();
        let repository = Arc::new(database.repository().clone());
        let fetcher = Arc::new(fetcher);

        let service = ThumbnailService::new(
            repository.clone(),
            repository,
            fetcher.clone(),
            providers,
            test_paths(&root),
        )
        .await
        .unwrap();

        Self {
            root,
            database,
            fetcher,
            service,
        }
    }

    pub fn repo(&self) -> &SqliteRepository {
        self.database.repository()
    }

    pub fn cache_file(&self, filename: &str) -> PathBuf {
        self.service.paths().cache_dir().join(filename)
    }

    pub fn cache_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.service.paths().cache_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

pub fn test_paths(root: &TempDir) -> ThumbnailPaths {
    ThumbnailPaths::new(
        root.path().join("uploads/embed-thumbnails"),
        root.path().to_path_buf(),
        "https://blog.example.com".to_string(),
    )
}
