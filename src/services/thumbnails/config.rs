// 缩略图配置数据结构
//
// 定义了缩略图缓存的配置，包括：
// - 总开关（关闭时不注册任何生命周期钩子）
// - 缓存目录与站点根目录
// - 公开访问的基础 URL
// - 获取超时与单次下载的大小上限

use crate::services::thumbnails::{ThumbnailError, ThumbnailPaths};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 缩略图配置（存储在 thumbnail_config.json）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThumbnailConfig {
    /// 是否下载缩略图
    /// - true: 注册生命周期钩子，首次渲染嵌入内容时下载缩略图
    /// - false: 整个子系统不工作，已有缓存文件保持不动
    #[serde(default)]
    pub download_thumbnails: bool,

    /// 缩略图缓存目录（扁平目录）
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// 站点根目录，公开 URL 以此为基准计算相对路径
    #[serde(default = "default_install_root")]
    pub install_root: PathBuf,

    /// 站点公开基础 URL
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// 单次远程获取的超时时间（秒）
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// 单个缩略图允许下载的最大字节数，超过后该档位视为获取失败
    #[serde(default = "default_max_download_bytes")]
    pub max_download_bytes: u64,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("public/uploads/embed-thumbnails")
}

fn default_install_root() -> PathBuf {
    PathBuf::from("public")
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_max_download_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for ThumbnailConfig {
    /// 默认配置：关闭下载
    fn default() -> Self {
        Self {
            download_thumbnails: false,
            cache_dir: default_cache_dir(),
            install_root: default_install_root(),
            public_base_url: default_public_base_url(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_download_bytes: default_max_download_bytes(),
        }
    }
}

impl ThumbnailConfig {
    /// 校验配置
    ///
    /// # 规则
    /// - `cache_dir` 必须位于 `install_root` 之内，否则无法计算公开 URL
    /// - `public_base_url` 不能为空
    /// - `fetch_timeout_secs` 与 `max_download_bytes` 必须大于 0
    pub fn validate(&self) -> Result<(), ThumbnailError> {
        if !self.cache_dir.starts_with(&self.install_root) {
            return Err(ThumbnailError::Config(format!(
                "缓存目录 {:?} 不在站点根目录 {:?} 之内",
                self.cache_dir, self.install_root
            )));
        }

        if self.public_base_url.trim().is_empty() {
            return Err(ThumbnailError::Config("public_base_url 不能为空".to_string()));
        }

        if self.fetch_timeout_secs == 0 {
            return Err(ThumbnailError::Config("fetch_timeout_secs 必须大于 0".to_string()));
        }

        if self.max_download_bytes == 0 {
            return Err(ThumbnailError::Config("max_download_bytes 必须大于 0".to_string()));
        }

        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// 根据配置生成路径生成器
    pub fn thumbnail_paths(&self) -> ThumbnailPaths {
        ThumbnailPaths::new(
            self.cache_dir.clone(),
            self.install_root.clone(),
            self.public_base_url.clone(),
        )
    }
}
