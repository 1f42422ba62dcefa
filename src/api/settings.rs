use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};
use super::response::success;
use super::AppState;
use crate::services::thumbnails::ThumbnailConfig;

/// 缩略图设置响应
#[derive(Debug, Serialize)]
pub struct ThumbnailSettings {
    pub config: ThumbnailConfig,

    /// 配置文件路径
    pub config_path: String,

    /// 当前进程中钩子是否已注册
    pub active: bool,

    /// 已保存的开关与运行中的钩子不一致，需要重启
    pub restart_required: bool,
}

/// 更新缩略图设置请求体
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateThumbnailSettingsRequest {
    pub download_thumbnails: bool,
}

async fn current_settings(state: &AppState) -> ThumbnailSettings {
    let config = state.config.get_config().await;
    let active = state.hooks.is_active();

    ThumbnailSettings {
        restart_required: config.download_thumbnails != active,
        config_path: state.config.config_path().display().to_string(),
        config,
        active,
    }
}

/// 获取缩略图设置
///
/// # 端点
/// GET /api/settings/thumbnails
pub async fn get_thumbnail_settings(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let settings = current_settings(&state).await;

    tracing::debug!("获取缩略图设置成功");

    Ok(success(settings))
}

/// 更新缩略图下载开关
///
/// # 端点
/// PUT /api/settings/thumbnails
///
/// # 请求体
/// ```json
/// { "download_thumbnails": true }
/// ```
///
/// 开关写入配置文件，钩子在下次启动时按新值注册
pub async fn update_thumbnail_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateThumbnailSettingsRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .config
        .set_download_thumbnails(request.download_thumbnails)
        .await
        .map_err(|e| {
            tracing::error!("更新缩略图下载开关失败: {}", e);
            ApiError::Internal(format!("Failed to update thumbnail settings: {}", e))
        })?;

    let settings = current_settings(&state).await;

    tracing::info!(
        "缩略图设置已更新: download_thumbnails={}, restart_required={}",
        request.download_thumbnails,
        settings.restart_required
    );

    Ok(success(settings))
}
