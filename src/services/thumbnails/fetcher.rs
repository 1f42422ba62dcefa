// 缩略图获取器 - 将远程缩略图下载到临时文件
//
// 本模块提供：
// - 获取器接口（Acquire 只依赖这个接口）
// - 基于 reqwest 的 HTTP 实现，包括超时控制、大小上限与占位图检测
//
// 提供方对不存在的档位可能返回 404，也可能返回一张 120x90 的占位图，
// 两种情况都视为获取失败

use crate::services::thumbnails::error::{FetchError, ThumbnailError};
use async_trait::async_trait;
use reqwest::Client;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::time::timeout;
use tracing::debug;
use uuid::Uuid;

/// 提供方"档位不存在"占位图的尺寸
pub const PLACEHOLDER_DIMENSIONS: (u32, u32) = (120, 90);

/// 默认的单次下载大小上限
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// 缩略图获取器
#[async_trait]
pub trait ThumbnailFetcher: Send + Sync {
    /// 下载 `url` 到 `temp_dir` 下的临时文件并返回其路径
    ///
    /// 失败时不会留下临时文件
    async fn fetch_to_temp(&self, url: &str, temp_dir: &Path) -> Result<PathBuf, FetchError>;
}

/// 检查图片数据不是占位图
///
/// # 返回
/// - `Ok((width, height))`: 正常图片的尺寸
/// - `Err(FetchError::Placeholder)`: 尺寸与占位图一致
/// - `Err(FetchError::InvalidImage)`: 无法识别的图片数据
pub fn check_not_placeholder(bytes: &[u8]) -> Result<(u32, u32), FetchError> {
    let reader = image::io::Reader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| FetchError::InvalidImage(e.to_string()))?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| FetchError::InvalidImage(e.to_string()))?;

    if (width, height) == PLACEHOLDER_DIMENSIONS {
        return Err(FetchError::Placeholder { width, height });
    }

    Ok((width, height))
}

/// HTTP 缩略图获取器
pub struct HttpThumbnailFetcher {
    client: Client,
    timeout: Duration,
    max_bytes: u64,
}

impl HttpThumbnailFetcher {
    /// 创建新的获取器
    ///
    /// # 参数
    /// - `timeout`: 单次请求的超时时间，超时后视为该档位获取失败
    pub fn new(timeout: Duration) -> Result<Self, ThumbnailError> {
        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ThumbnailError::Config(format!("创建 HTTP 客户端失败: {}", e)))?;

        Ok(Self::with_client(client, timeout))
    }

    pub fn with_client(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            max_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
        }
    }

    /// 设置单次下载的大小上限
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    async fn download_with_timeout(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match timeout(self.timeout, self.download(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpError(status.as_u16()));
        }

        let too_large = FetchError::TooLarge {
            limit: self.max_bytes,
        };

        if response.content_length().is_some_and(|len| len > self.max_bytes) {
            return Err(too_large);
        }

        // Content-Length 可能缺失或不准确，边读边检查
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(too_large);
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(bytes)
    }
}

#[async_trait]
impl ThumbnailFetcher for HttpThumbnailFetcher {
    async fn fetch_to_temp(&self, url: &str, temp_dir: &Path) -> Result<PathBuf, FetchError> {
        debug!("开始获取缩略图: {}", url);

        let bytes = self.download_with_timeout(url).await?;
        let (width, height) = check_not_placeholder(&bytes)?;

        let temp_path = temp_dir.join(format!(".{}.tmp", Uuid::new_v4()));
        fs::write(&temp_path, &bytes)
            .await
            .map_err(|e| FetchError::TempFile(format!("{:?}: {}", temp_path, e)))?;

        debug!(
            "缩略图已下载: {} -> {:?} ({}x{}, {} 字节)",
            url,
            temp_path,
            width,
            height,
            bytes.len()
        );

        Ok(temp_path)
    }
}
