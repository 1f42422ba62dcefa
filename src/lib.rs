// 嵌入缩略图缓存后端库
//
// 本库提供嵌入内容缩略图缓存的核心功能，包括：
// - API 路由
// - 数据库操作
// - 缩略图获取、解析与回收

pub mod api;
pub mod database;
pub mod models;
pub mod services;

pub use services::thumbnails::{LifecycleHooks, ThumbnailConfig, ThumbnailError, ThumbnailService};
