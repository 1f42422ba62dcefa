// 文档生命周期钩子
//
// 宿主在以下事件发生时调用：
// - 文档删除前：回收该文档的缩略图
// - 文档更新后：回收内容中已不再出现的缩略图
// - oEmbed HTML 解析完成后：获取并缓存缩略图
//
// 总开关关闭时钩子不生效，已有的缓存文件保持不动。
// 钩子内的错误只记录日志，不会影响宿主流程

use crate::models::{Document, OEmbedResponse};
use crate::services::thumbnails::config::ThumbnailConfig;
use crate::services::thumbnails::thumbnail_service::{
    ReclaimReport, ResolvedThumbnail, ThumbnailService,
};
use tracing::{debug, error, info};

/// 生命周期钩子
#[derive(Clone)]
pub struct LifecycleHooks {
    /// 总开关关闭时为 None
    service: Option<ThumbnailService>,
}

impl LifecycleHooks {
    /// 根据配置注册钩子
    pub fn register(config: &ThumbnailConfig, service: ThumbnailService) -> Self {
        if config.download_thumbnails {
            info!("缩略图缓存已启用，注册生命周期钩子");
            Self {
                service: Some(service),
            }
        } else {
            info!("缩略图缓存未启用，不注册生命周期钩子");
            Self::inactive()
        }
    }

    pub fn inactive() -> Self {
        Self { service: None }
    }

    pub fn is_active(&self) -> bool {
        self.service.is_some()
    }

    pub fn service(&self) -> Option<&ThumbnailService> {
        self.service.as_ref()
    }

    /// 文档删除前
    pub async fn before_document_delete(&self, document_id: i64) -> ReclaimReport {
        let Some(service) = &self.service else {
            return ReclaimReport::default();
        };

        match service.reclaim_on_delete(document_id).await {
            Ok(report) => report,
            Err(e) => {
                error!("删除文档时回收缩略图失败: document_id={}, error={:?}", document_id, e);
                ReclaimReport::default()
            }
        }
    }

    /// 文档更新后
    ///
    /// # 参数
    /// - `before`: 更新前的文档，只用于日志
    /// - `after`: 更新后的文档，用它的内容判断外部 ID 是否仍被引用
    pub async fn after_document_update(
        &self,
        document_id: i64,
        before: &Document,
        after: &Document,
    ) -> ReclaimReport {
        let Some(service) = &self.service else {
            return ReclaimReport::default();
        };

        if before.content == after.content {
            debug!("文档内容未变化: document_id={}", document_id);
        }

        match service.reclaim_on_update(document_id, &after.content).await {
            Ok(report) => report,
            Err(e) => {
                error!("更新文档时回收缩略图失败: document_id={}, error={:?}", document_id, e);
                ReclaimReport::default()
            }
        }
    }

    /// oEmbed HTML 解析完成后
    ///
    /// 返回值是原样的 HTML
    pub async fn after_oembed_parsed(
        &self,
        document_id: i64,
        html: String,
        response: &OEmbedResponse,
        url: &str,
    ) -> String {
        let Some(service) = &self.service else {
            return html;
        };

        let Some(thumbnail_url) = response.thumbnail_url.as_deref() else {
            debug!("oEmbed 数据中没有 thumbnail_url: {}", url);
            return html;
        };

        if let Err(e) = service.acquire(document_id, url, thumbnail_url).await {
            error!("获取缩略图失败: document_id={}, url={}, error={:?}", document_id, url, e);
        }

        html
    }

    /// 解析已缓存的缩略图，钩子未启用时总是返回 None
    pub async fn resolve(&self, document_id: i64, embed_url: &str) -> Option<ResolvedThumbnail> {
        let service = self.service.as_ref()?;

        match service.resolve(document_id, embed_url).await {
            Ok(resolved) => resolved,
            Err(e) => {
                error!("解析缩略图失败: document_id={}, error={:?}", document_id, e);
                None
            }
        }
    }
}
