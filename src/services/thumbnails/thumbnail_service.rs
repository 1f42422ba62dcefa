// 缩略图服务 - 缩略图缓存的获取、解析与回收
//
// 本模块是缩略图缓存的核心服务，负责：
// - Acquire：按档位顺序获取远程缩略图，写入缓存目录并记录到文档元数据
// - Resolve：根据文档与嵌入 URL 返回已缓存缩略图的本地路径与公开 URL
// - Reclaim：文档删除或更新时，回收不再被任何其他文档引用的缓存文件
//
// 同一个缓存文件可能被多个文档引用，回收前必须对全局引用快照做检查

use crate::services::thumbnails::error::FileSystemError;
use crate::services::thumbnails::fetcher::ThumbnailFetcher;
use crate::services::thumbnails::metadata::{
    DocumentStore, MetadataStore, ReferenceSnapshot,
};
use crate::services::thumbnails::path::{
    companion_base, is_thumbnail_key, meta_key, provider_key_prefix, thumbnail_filename,
    url_meta_key, URL_KEY_SUFFIX,
};
use crate::services::thumbnails::provider::{is_safe_external_id, ProviderRegistry};
use crate::services::thumbnails::{ThumbnailError, ThumbnailPaths};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// 已缓存的缩略图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedThumbnail {
    /// 本地文件路径
    pub path: PathBuf,
    /// 公开访问 URL
    pub url: String,
}

/// 一次回收的结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReclaimReport {
    /// 已删除的文件名
    pub deleted: Vec<String>,
    /// 因被其他文档引用而保留的文件名
    pub kept_in_use: Vec<String>,
    /// 因外部 ID 仍出现在文档内容中而保留的文件名（仅更新时）
    pub kept_referenced: Vec<String>,
}

/// 缩略图服务
///
/// 持有缓存目录与各个协作者，显式构造后传给调用方
#[derive(Clone)]
pub struct ThumbnailService {
    /// 文档存储
    documents: Arc<dyn DocumentStore>,

    /// 文档元数据存储
    metadata: Arc<dyn MetadataStore>,

    /// 远程获取器
    fetcher: Arc<dyn ThumbnailFetcher>,

    /// 已注册的提供方
    providers: ProviderRegistry,

    /// 路径生成器
    paths: ThumbnailPaths,
}

impl ThumbnailService {
    /// 创建新的缩略图服务
    ///
    /// # 参数
    /// - `documents`: 文档存储（Acquire 用来确认文档存在）
    /// - `metadata`: 文档元数据存储
    /// - `fetcher`: 远程获取器
    /// - `providers`: 已注册的提供方
    /// - `paths`: 路径生成器
    ///
    /// # 返回
    /// - `Result<Self, ThumbnailError>`: 服务实例，缓存目录创建失败时返回错误
    pub async fn new(
        documents: Arc<dyn DocumentStore>,
        metadata: Arc<dyn MetadataStore>,
        fetcher: Arc<dyn ThumbnailFetcher>,
        providers: ProviderRegistry,
        paths: ThumbnailPaths,
    ) -> Result<Self, ThumbnailError> {
        fs::create_dir_all(paths.cache_dir()).await.map_err(|e| {
            FileSystemError::CreateDirFailed(format!("{:?}: {}", paths.cache_dir(), e))
        })?;

        info!("缩略图缓存目录: {:?}", paths.cache_dir());

        Ok(Self {
            documents,
            metadata,
            fetcher,
            providers,
            paths,
        })
    }

    pub fn paths(&self) -> &ThumbnailPaths {
        &self.paths
    }

    /// 获取并缓存缩略图
    ///
    /// 由 oEmbed 解析完成事件触发。外部 ID 从提供方返回的缩略图 URL 中提取，
    /// 然后按档位顺序尝试，第一个成功的档位写入缓存并记录元数据。
    ///
    /// # 参数
    /// - `document_id`: 所属文档 ID
    /// - `embed_url`: 原始嵌入 URL
    /// - `thumbnail_url`: 提供方返回的缩略图 URL
    ///
    /// # 返回
    /// - `Ok(Some(filename))`: 缓存成功
    /// - `Ok(None)`: 文档不存在、提供方不支持或所有档位都失败，状态不变
    /// - `Err(ThumbnailError)`: 移动文件或写入元数据失败，两个 key 都不会写入
    pub async fn acquire(
        &self,
        document_id: i64,
        embed_url: &str,
        thumbnail_url: &str,
    ) -> Result<Option<String>, ThumbnailError> {
        if self.documents.get_document(document_id).await?.is_none() {
            debug!("文档不存在，跳过获取缩略图: document_id={}", document_id);
            return Ok(None);
        }

        let Some(provider) = self.providers.find(embed_url) else {
            debug!("不支持的嵌入 URL: {}", embed_url);
            return Ok(None);
        };

        let Some(external_id) = provider.id_from_thumbnail_url(thumbnail_url) else {
            debug!("无法从缩略图 URL 提取外部 ID: {}", thumbnail_url);
            return Ok(None);
        };

        if !is_safe_external_id(&external_id) {
            warn!("外部 ID 含有非法字符，跳过: {:?}", external_id);
            return Ok(None);
        }

        let kind = provider.kind();

        for tier in provider.tiers() {
            let remote_url = provider.remote_thumbnail_url(&external_id, tier);

            let temp_path = match self
                .fetcher
                .fetch_to_temp(&remote_url, self.paths.cache_dir())
                .await
            {
                Ok(path) => path,
                Err(e) => {
                    debug!("档位 {} 获取失败: {} ({})", tier, remote_url, e);
                    continue;
                }
            };

            let filename = thumbnail_filename(kind, &external_id, tier);
            let target = self.paths.cache_dir().join(&filename);

            if let Err(e) = fs::rename(&temp_path, &target).await {
                let _ = fs::remove_file(&temp_path).await;
                return Err(FileSystemError::RenameFailed {
                    from: temp_path,
                    to: target,
                    source: e,
                }
                .into());
            }

            let filename_key = meta_key(kind, &external_id);
            let url_key = url_meta_key(kind, &external_id);

            if let Err(e) = self
                .metadata
                .update_meta_many(
                    document_id,
                    &[(filename_key.as_str(), filename.as_str()), (url_key.as_str(), embed_url)],
                )
                .await
            {
                warn!("写入缩略图元数据失败: document_id={}, {}", document_id, e);
                self.discard_unreferenced(&filename).await;
                return Err(e);
            }

            info!(
                "缩略图已缓存: document_id={}, {} -> {}",
                document_id, embed_url, filename
            );
            return Ok(Some(filename));
        }

        info!(
            "所有档位都获取失败: document_id={}, provider={}, id={}",
            document_id, kind, external_id
        );
        Ok(None)
    }

    /// 解析已缓存的缩略图
    ///
    /// 外部 ID 直接从原始嵌入 URL 提取。只读，不会触发获取
    ///
    /// # 返回
    /// - `Ok(Some(_))`: 元数据存在且文件在磁盘上
    /// - `Ok(None)`: 其他所有情况
    pub async fn resolve(
        &self,
        document_id: i64,
        embed_url: &str,
    ) -> Result<Option<ResolvedThumbnail>, ThumbnailError> {
        let Some(provider) = self.providers.find(embed_url) else {
            return Ok(None);
        };

        let Some(external_id) = provider.id_from_embed_url(embed_url) else {
            return Ok(None);
        };

        let Some(filename) = self
            .metadata
            .get_meta(document_id, &meta_key(provider.kind(), &external_id))
            .await?
        else {
            return Ok(None);
        };

        let Some(path) = self.paths.file_path(&filename) else {
            warn!("元数据中的文件名不合法: {:?}", filename);
            return Ok(None);
        };

        if !fs::try_exists(&path).await.unwrap_or(false) {
            debug!("缓存文件不存在: {:?}", path);
            return Ok(None);
        }

        let Some(url) = self.paths.public_url(&path) else {
            warn!("缓存文件不在站点根目录之内: {:?}", path);
            return Ok(None);
        };

        Ok(Some(ResolvedThumbnail { path, url }))
    }

    /// 文档删除前回收缩略图
    pub async fn reclaim_on_delete(&self, document_id: i64) -> Result<ReclaimReport, ThumbnailError> {
        self.reclaim(document_id, None).await
    }

    /// 文档更新后回收缩略图
    ///
    /// 外部 ID 仍出现在更新后内容中的缩略图视为仍在使用
    pub async fn reclaim_on_update(
        &self,
        document_id: i64,
        current_content: &str,
    ) -> Result<ReclaimReport, ThumbnailError> {
        self.reclaim(document_id, Some(current_content)).await
    }

    async fn reclaim(
        &self,
        document_id: i64,
        current_content: Option<&str>,
    ) -> Result<ReclaimReport, ThumbnailError> {
        let snapshot = ReferenceSnapshot::load(self.metadata.as_ref()).await?;
        let entries = self.metadata.get_all_meta(document_id).await?;
        let keys: HashSet<&str> = entries.iter().map(|e| e.key.as_str()).collect();

        let mut report = ReclaimReport::default();

        for entry in &entries {
            if !is_thumbnail_key(&entry.key) {
                continue;
            }

            // 以 `_url` 结尾的 key 只有在对应文件名 key 存在时才是伴随 key
            if companion_base(&entry.key).is_some_and(|base| keys.contains(base)) {
                continue;
            }

            let Some(filename) = entry.value.first() else {
                continue;
            };

            if self.paths.file_path(filename).is_none() {
                debug!("元数据值不是缓存文件名，跳过: {} = {:?}", entry.key, filename);
                continue;
            }

            if let Some(content) = current_content {
                // 无法判断内容是否仍引用它，保持原样
                let Some(external_id) = self.external_id_from_key(&entry.key) else {
                    debug!("未注册的提供方，跳过: {}", entry.key);
                    continue;
                };

                if content.contains(external_id) {
                    debug!("外部 ID 仍出现在文档内容中，保留: {}", filename);
                    report.kept_referenced.push(filename.to_string());
                    continue;
                }
            }

            if snapshot.is_in_use_elsewhere(filename, document_id) {
                debug!("缩略图仍被其他文档使用，保留: {}", filename);
                report.kept_in_use.push(filename.to_string());
                continue;
            }

            self.delete_cached_file(filename).await?;
            self.metadata.delete_meta(document_id, &entry.key).await?;
            self.metadata
                .delete_meta(document_id, &format!("{}{}", entry.key, URL_KEY_SUFFIX))
                .await?;

            info!("已回收缩略图: document_id={}, {}", document_id, filename);
            report.deleted.push(filename.to_string());
        }

        Ok(report)
    }

    /// 删除缓存文件
    ///
    /// # 返回
    /// - `Ok(true)`: 文件已删除
    /// - `Ok(false)`: 文件本来就不存在，或文件名不合法
    pub async fn delete_cached_file(&self, filename: &str) -> Result<bool, ThumbnailError> {
        let Some(path) = self.paths.file_path(filename) else {
            warn!("拒绝删除不合法的文件名: {:?}", filename);
            return Ok(false);
        };

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FileSystemError::RemoveFailed(format!("{:?}: {}", path, e)).into()),
        }
    }

    /// 元数据写入失败后，移除没有任何文档引用的新缓存文件
    ///
    /// 引用快照读取失败时保留文件
    async fn discard_unreferenced(&self, filename: &str) {
        match ReferenceSnapshot::load(self.metadata.as_ref()).await {
            Ok(snapshot) if !snapshot.is_referenced(filename) => {
                if let Err(e) = self.delete_cached_file(filename).await {
                    warn!("清理缓存文件失败: {} ({})", filename, e);
                }
            }
            Ok(_) => debug!("缓存文件已被其他元数据引用，保留: {}", filename),
            Err(e) => warn!("读取引用快照失败，保留缓存文件: {} ({})", filename, e),
        }
    }

    /// 从文件名 key 中取出外部 ID
    fn external_id_from_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        self.providers
            .iter()
            .find_map(|p| key.strip_prefix(provider_key_prefix(p.kind()).as_str()))
            .filter(|id| !id.is_empty())
    }
}
