// 缩略图模块 - 嵌入内容缩略图的本地缓存
//
// 本模块提供嵌入视频缩略图的引用计数式缓存，包括：
// - 首次渲染时按档位获取远程缩略图
// - 根据文档与嵌入 URL 解析已缓存的缩略图
// - 文档删除或更新时回收不再被引用的缓存文件
// - 由配置开关控制的生命周期钩子

pub mod config;
pub mod config_manager;
pub mod error;
pub mod fetcher;
pub mod hooks;
pub mod metadata;
pub mod path;
pub mod provider;
pub mod thumbnail_service;

pub use config::ThumbnailConfig;
pub use config_manager::ConfigManager;
pub use error::{FetchError, FileSystemError, ThumbnailError};
pub use fetcher::{HttpThumbnailFetcher, ThumbnailFetcher};
pub use hooks::LifecycleHooks;
pub use metadata::{
    DocumentStore, MetaEntry, MetaReference, MetaValue, MetadataStore, ReferenceSnapshot,
};
pub use path::ThumbnailPaths;
pub use provider::{EmbedProvider, ProviderRegistry, YouTubeProvider};
pub use thumbnail_service::{ReclaimReport, ResolvedThumbnail, ThumbnailService};
