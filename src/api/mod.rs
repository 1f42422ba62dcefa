pub mod documents;
pub mod error;
pub mod health;
pub mod response;
pub mod settings;

use axum::{
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::database::Database;
use crate::services::thumbnails::{ConfigManager, LifecycleHooks};

#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub hooks: Arc<LifecycleHooks>,
    pub config: Arc<ConfigManager>,
}

/// 构建路由，`install_root` 下的静态文件（包括缓存的缩略图）直接对外提供
pub fn router(state: AppState, install_root: &Path) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/documents", post(documents::create_document))
        .route(
            "/api/documents/:id",
            get(documents::get_document)
                .put(documents::update_document)
                .delete(documents::delete_document),
        )
        .route("/api/documents/:id/oembed", post(documents::oembed_parsed))
        .route("/api/documents/:id/thumbnail", get(documents::get_thumbnail))
        .route(
            "/api/settings/thumbnails",
            get(settings::get_thumbnail_settings).put(settings::update_thumbnail_settings),
        )
        .fallback_service(ServeDir::new(install_root))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::thumbnails::error::FetchError;
    use crate::services::thumbnails::{
        ProviderRegistry, ThumbnailConfig, ThumbnailFetcher, ThumbnailService,
    };
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct StaticFetcher;

    #[async_trait]
    impl ThumbnailFetcher for StaticFetcher {
        async fn fetch_to_temp(&self, _url: &str, temp_dir: &Path) -> Result<PathBuf, FetchError> {
            let path = temp_dir.join(".static.tmp");
            std::fs::write(&path, b"jpeg bytes").unwrap();
            Ok(path)
        }
    }

    async fn test_app() -> (TempDir, Router) {
        let root = TempDir::new().unwrap();
        let config = ThumbnailConfig {
            download_thumbnails: true,
            cache_dir: root.path().join("uploads/embed-thumbnails"),
            install_root: root.path().to_path_buf(),
            public_base_url: "http://localhost:3000".to_string(),
            ..ThumbnailConfig::default()
        };

        let config_path = root.path().join("thumbnail_config.json");
        std::fs::write(&config_path, serde_json::to_string(&config).unwrap()).unwrap();
        let config_manager = ConfigManager::load(Some(config_path)).await.unwrap();

        let database = Database::connect("sqlite::memory:").await.unwrap();
        let repo = Arc::new(database.repository().clone());
        let service = ThumbnailService::new(
            repo.clone(),
            repo,
            Arc::new(StaticFetcher),
            ProviderRegistry::with_defaults(),
            config.thumbnail_paths(),
        )
        .await
        .unwrap();

        let state = AppState {
            database,
            hooks: Arc::new(LifecycleHooks::register(&config, service)),
            config: Arc::new(config_manager),
        };
        let app = router(state, &config.install_root);

        (root, app)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (_root, app) = test_app().await;
        let (status, body) = send(&app, "GET", "/api/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "healthy");
        assert_eq!(body["data"]["thumbnails"], "enabled");
    }

    #[tokio::test]
    async fn test_document_lifecycle_over_http() {
        let (root, app) = test_app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/documents",
            Some(json!({ "title": "Post", "content": "https://youtu.be/abc123" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/documents/{}/oembed", id),
            Some(json!({
                "html": "<iframe></iframe>",
                "url": "https://youtu.be/abc123",
                "data": { "thumbnail_url": "https://i.ytimg.com/vi/abc123/hqdefault.jpg" }
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["html"], "<iframe></iframe>");
        assert_eq!(
            body["data"]["thumbnail"]["url"],
            "http://localhost:3000/uploads/embed-thumbnails/youtube-abc123-maxresdefault.jpg"
        );

        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/documents/{}/thumbnail?url=https://youtu.be/abc123", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        // 缓存文件通过静态文件服务对外提供
        let request = Request::builder()
            .uri("/uploads/embed-thumbnails/youtube-abc123-maxresdefault.jpg")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, _) = send(&app, "DELETE", &format!("/api/documents/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!root
            .path()
            .join("uploads/embed-thumbnails/youtube-abc123-maxresdefault.jpg")
            .exists());

        let (status, _) = send(&app, "GET", &format!("/api/documents/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_reclaims_removed_embed() {
        let (root, app) = test_app().await;

        let (_, body) = send(
            &app,
            "POST",
            "/api/documents",
            Some(json!({ "content": "https://youtu.be/abc123" })),
        )
        .await;
        let id = body["data"]["id"].as_i64().unwrap();

        send(
            &app,
            "POST",
            &format!("/api/documents/{}/oembed", id),
            Some(json!({
                "url": "https://youtu.be/abc123",
                "data": { "thumbnail_url": "https://i.ytimg.com/vi/abc123/hqdefault.jpg" }
            })),
        )
        .await;

        let (status, body) = send(
            &app,
            "PUT",
            &format!("/api/documents/{}", id),
            Some(json!({ "content": "no more video" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["content"], "no more video");
        assert!(!root
            .path()
            .join("uploads/embed-thumbnails/youtube-abc123-maxresdefault.jpg")
            .exists());

        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/documents/{}/thumbnail?url=https://youtu.be/abc123", id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oembed_validation() {
        let (_root, app) = test_app().await;
        let (_, body) = send(&app, "POST", "/api/documents", Some(json!({}))).await;
        let id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/documents/{}/oembed", id),
            Some(json!({ "url": "not a url" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["type"], "validation_error");
    }

    #[tokio::test]
    async fn test_thumbnail_settings_toggle() {
        let (root, app) = test_app().await;

        let (status, body) = send(&app, "GET", "/api/settings/thumbnails", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["config"]["download_thumbnails"], true);
        assert_eq!(body["data"]["active"], true);
        assert_eq!(body["data"]["restart_required"], false);

        let (status, body) = send(
            &app,
            "PUT",
            "/api/settings/thumbnails",
            Some(json!({ "download_thumbnails": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["config"]["download_thumbnails"], false);
        assert_eq!(body["data"]["active"], true);
        assert_eq!(body["data"]["restart_required"], true);

        // 开关已写入配置文件
        let reloaded = ConfigManager::load(Some(root.path().join("thumbnail_config.json")))
            .await
            .unwrap();
        assert!(!reloaded.get_config().await.download_thumbnails);
    }

    #[tokio::test]
    async fn test_thumbnail_settings_rejects_bad_body() {
        let (_root, app) = test_app().await;

        let (status, _) = send(
            &app,
            "PUT",
            "/api/settings/thumbnails",
            Some(json!({ "download_thumbnails": "yes" })),
        )
        .await;

        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_oembed_missing_document() {
        let (_root, app) = test_app().await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/documents/999/oembed",
            Some(json!({ "url": "https://youtu.be/abc123" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
