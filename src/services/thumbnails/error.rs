// 缩略图模块错误类型定义
//
// 定义了缩略图获取、解析与回收中可能出现的各种错误类型

use std::path::PathBuf;
use thiserror::Error;

/// 缩略图操作的统一错误类型
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("获取错误: {0}")]
    Fetch(#[from] FetchError),

    #[error("文件系统错误: {0}")]
    FileSystem(#[from] FileSystemError),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 序列化错误: {0}")]
    Json(#[from] serde_json::Error),
}

/// 远程获取相关错误
///
/// 在 Acquire 中，任何一个分辨率档位的获取错误都会被吞掉并尝试下一个档位
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("网络错误: {0}")]
    NetworkError(String),

    #[error("下载超时")]
    Timeout,

    #[error("无效的 URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP 错误: 状态码 {0}")]
    HttpError(u16),

    /// 提供方对不存在的档位返回的占位图
    #[error("占位图: {width}x{height}")]
    Placeholder { width: u32, height: u32 },

    #[error("响应超过大小上限: {limit} 字节")]
    TooLarge { limit: u64 },

    #[error("无法识别的图片数据: {0}")]
    InvalidImage(String),

    #[error("请求错误: {0}")]
    RequestError(String),

    #[error("写入临时文件失败: {0}")]
    TempFile(String),
}

/// 文件系统相关错误
#[derive(Debug, Error)]
pub enum FileSystemError {
    #[error("路径不存在: {0:?}")]
    PathNotFound(PathBuf),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("创建目录失败: {0}")]
    CreateDirFailed(String),

    #[error("移动文件失败: {from:?} -> {to:?}: {source}")]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("删除文件失败: {0}")]
    RemoveFailed(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_status() {
            if let Some(status) = err.status() {
                FetchError::HttpError(status.as_u16())
            } else {
                FetchError::NetworkError(err.to_string())
            }
        } else if err.is_builder() {
            FetchError::InvalidUrl(err.to_string())
        } else if err.is_request() {
            FetchError::RequestError(err.to_string())
        } else {
            FetchError::NetworkError(err.to_string())
        }
    }
}

impl From<sqlx::Error> for ThumbnailError {
    fn from(err: sqlx::Error) -> Self {
        ThumbnailError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_display() {
        let err = FetchError::Placeholder {
            width: 120,
            height: 90,
        };
        assert_eq!(err.to_string(), "占位图: 120x90");
    }

    #[test]
    fn test_fetch_error_into_thumbnail_error() {
        let err: ThumbnailError = FetchError::HttpError(404).into();
        assert!(matches!(err, ThumbnailError::Fetch(FetchError::HttpError(404))));
    }

    #[test]
    fn test_sqlx_error_into_thumbnail_error() {
        let err: ThumbnailError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ThumbnailError::Database(_)));
    }
}
