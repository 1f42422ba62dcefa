// 元数据存储接口
//
// 缩略图记录不使用独立的表，而是以键值对的形式挂在文档元数据上：
// - `embed_privacy_thumbnail_<provider>_<id>` -> 缓存文件名
// - `embed_privacy_thumbnail_<provider>_<id>_url` -> 原始嵌入 URL
//
// 本模块定义宿主需要提供的读写原语，以及回收时使用的全局引用快照

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::Document;
use crate::services::thumbnails::ThumbnailError;

/// 元数据值
///
/// 按 key 读取全部元数据时，同一个 key 的值会被包装成数组
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Single(String),
    Wrapped(Vec<String>),
}

impl MetaValue {
    /// 取出实际的值，包装形式取第一个元素
    pub fn first(&self) -> Option<&str> {
        match self {
            MetaValue::Single(value) => Some(value.as_str()),
            MetaValue::Wrapped(values) => values.first().map(String::as_str),
        }
    }
}

/// 文档的一条元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaEntry {
    pub key: String,
    pub value: MetaValue,
}

/// 全局快照中的一条引用：(文档 ID, 文件名)
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct MetaReference {
    pub document_id: i64,
    pub meta_value: String,
}

/// 文档元数据存储
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// 读取单个 key 的值（多行时取第一行）
    async fn get_meta(&self, document_id: i64, key: &str) -> Result<Option<String>, ThumbnailError>;

    /// 读取文档的全部元数据，同一个 key 的多行合并为 `MetaValue::Wrapped`
    async fn get_all_meta(&self, document_id: i64) -> Result<Vec<MetaEntry>, ThumbnailError>;

    /// 写入（覆盖）一个 key
    async fn update_meta(
        &self,
        document_id: i64,
        key: &str,
        value: &str,
    ) -> Result<(), ThumbnailError>;

    /// 在同一个事务中写入（覆盖）多个 key，要么全部成功要么全部不写
    async fn update_meta_many(
        &self,
        document_id: i64,
        entries: &[(&str, &str)],
    ) -> Result<(), ThumbnailError>;

    /// 删除一个 key，不存在时不报错
    async fn delete_meta(&self, document_id: i64, key: &str) -> Result<(), ThumbnailError>;

    /// 一次查询取出所有文档中本模块 key 的 (文档 ID, 值)
    ///
    /// 结果中也包含伴随 key 的 URL 值，它们不会与任何文件名相等
    async fn find_thumbnail_references(&self) -> Result<Vec<MetaReference>, ThumbnailError>;
}

/// 文档存储，只用到读取
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_document(&self, id: i64) -> Result<Option<Document>, ThumbnailError>;
}

/// 缩略图引用快照
///
/// 回收时只查询一次，之后的"是否被其他文档使用"判断都在内存里完成
#[derive(Debug, Clone, Default)]
pub struct ReferenceSnapshot {
    references: Vec<MetaReference>,
}

impl ReferenceSnapshot {
    pub fn new(references: Vec<MetaReference>) -> Self {
        Self { references }
    }

    /// 加载全局快照
    pub async fn load(store: &dyn MetadataStore) -> Result<Self, ThumbnailError> {
        let references = store.find_thumbnail_references().await?;
        tracing::debug!("已加载缩略图引用快照: {} 条", references.len());
        Ok(Self::new(references))
    }

    /// 文件名是否被任何文档引用
    pub fn is_referenced(&self, filename: &str) -> bool {
        self.references.iter().any(|r| r.meta_value == filename)
    }

    /// 文件名是否被 `document_id` 之外的文档引用
    pub fn is_in_use_elsewhere(&self, filename: &str, document_id: i64) -> bool {
        self.references
            .iter()
            .any(|r| r.document_id != document_id && r.meta_value == filename)
    }
}
