// 配置管理器 - 管理缩略图配置的读写
//
// 本模块提供缩略图配置的持久化管理功能，包括：
// - 从 JSON 文件加载配置
// - 保存配置到 JSON 文件
// - 切换下载开关

use crate::services::thumbnails::{ThumbnailConfig, ThumbnailError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;

/// 配置管理器
///
/// 负责管理缩略图配置的读写，使用 Arc<RwLock> 保证线程安全
pub struct ConfigManager {
    /// 配置文件路径
    config_path: PathBuf,

    /// 缩略图配置
    config: Arc<RwLock<ThumbnailConfig>>,
}

impl ConfigManager {
    /// 默认配置文件路径
    const DEFAULT_CONFIG_PATH: &'static str = "thumbnail_config.json";

    /// 从配置文件加载配置
    ///
    /// # 参数
    /// - `config_path`: 可选的配置文件路径，如果为 None 则使用默认路径
    ///
    /// # 行为
    /// - 如果配置文件不存在，使用默认配置并创建文件
    /// - 如果配置文件损坏，使用默认配置并备份旧文件
    /// - 加载后的配置必须通过 `ThumbnailConfig::validate`
    pub async fn load(config_path: Option<PathBuf>) -> Result<Self, ThumbnailError> {
        let config_path = config_path.unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CONFIG_PATH));

        let config = if config_path.exists() {
            match fs::read_to_string(&config_path).await {
                Ok(content) => match serde_json::from_str::<ThumbnailConfig>(&content) {
                    Ok(config) => {
                        tracing::info!("成功加载缩略图配置: {:?}", config_path);
                        config
                    }
                    Err(e) => {
                        tracing::warn!("配置文件损坏，使用默认配置: {}", e);
                        Self::backup_corrupted_config(&config_path).await;
                        ThumbnailConfig::default()
                    }
                },
                Err(e) => {
                    tracing::warn!("读取配置文件失败，使用默认配置: {}", e);
                    ThumbnailConfig::default()
                }
            }
        } else {
            tracing::info!("配置文件不存在，使用默认配置");
            ThumbnailConfig::default()
        };

        config.validate()?;

        let manager = Self {
            config_path,
            config: Arc::new(RwLock::new(config)),
        };

        if !manager.config_path.exists() {
            manager.save().await?;
        }

        Ok(manager)
    }

    /// 保存配置到文件
    pub async fn save(&self) -> Result<(), ThumbnailError> {
        let config = self.config.read().await;
        let json = serde_json::to_string_pretty(&*config)?;

        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ThumbnailError::Config(format!("创建配置目录失败: {}", e)))?;
            }
        }

        fs::write(&self.config_path, json)
            .await
            .map_err(|e| ThumbnailError::Config(format!("写入配置文件失败: {}", e)))?;

        tracing::info!("成功保存缩略图配置: {:?}", self.config_path);
        Ok(())
    }

    /// 切换缩略图下载开关
    ///
    /// 钩子在启动时按开关注册，修改后需重启才会生效；
    /// 关闭开关不会清理已有的缓存文件
    pub async fn set_download_thumbnails(&self, enabled: bool) -> Result<(), ThumbnailError> {
        let mut config = self.config.write().await;
        config.download_thumbnails = enabled;

        tracing::info!("更新缩略图下载开关: {}", enabled);

        drop(config);
        self.save().await
    }

    /// 获取完整配置（克隆）
    pub async fn get_config(&self) -> ThumbnailConfig {
        self.config.read().await.clone()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 备份损坏的配置文件，备份失败不影响主流程
    async fn backup_corrupted_config(config_path: &Path) {
        let backup_path = config_path.with_extension("json.bak");

        match fs::rename(config_path, &backup_path).await {
            Ok(_) => tracing::info!("已备份损坏的配置文件到: {:?}", backup_path),
            Err(e) => tracing::warn!("备份配置文件失败: {}", e),
        }
    }
}
