use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::error::{ApiError, ApiResult};
use super::response::{success, success_message, ApiResponse};
use super::AppState;
use crate::models::{
    CreateDocumentRequest, Document, OEmbedParsedRequest, UpdateDocumentRequest, Validator,
};
use crate::services::thumbnails::DocumentStore;

#[derive(Debug, Deserialize)]
pub struct ThumbnailQuery {
    pub url: String,
}

async fn load_document(state: &AppState, id: i64) -> ApiResult<Document> {
    state
        .database
        .repository()
        .get_document(id)
        .await?
        .ok_or(ApiError::DocumentNotFound(id))
}

pub async fn create_document(
    State(state): State<AppState>,
    Json(payload): Json<CreateDocumentRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;

    let document = state
        .database
        .repository()
        .insert_document(&payload.title, &payload.content)
        .await?;

    tracing::info!("Document created: id={}", document.id);

    Ok((StatusCode::CREATED, ApiResponse::success(document)))
}

pub async fn get_document(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let document = load_document(&state, id).await?;
    Ok(success(document))
}

/// 更新文档，保存后触发缩略图回收
pub async fn update_document(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateDocumentRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;

    let before = load_document(&state, id).await?;
    let after = payload.apply_to(&before);

    state.database.repository().update_document(&after).await?;

    let report = state.hooks.after_document_update(id, &before, &after).await;
    if !report.deleted.is_empty() {
        tracing::info!("Reclaimed {} thumbnails after update of document {}", report.deleted.len(), id);
    }

    Ok(success(after))
}

/// 删除文档，删除前回收缩略图
pub async fn delete_document(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    load_document(&state, id).await?;

    let report = state.hooks.before_document_delete(id).await;
    if !report.deleted.is_empty() {
        tracing::info!("Reclaimed {} thumbnails before deleting document {}", report.deleted.len(), id);
    }

    state.database.repository().delete_document(id).await?;

    Ok(success_message("Document deleted successfully"))
}

/// oEmbed HTML 解析完成，触发缩略图获取
pub async fn oembed_parsed(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<OEmbedParsedRequest>,
) -> ApiResult<impl IntoResponse> {
    payload.validate()?;
    load_document(&state, id).await?;

    let html = state
        .hooks
        .after_oembed_parsed(id, payload.html, &payload.data, &payload.url)
        .await;
    let thumbnail = state.hooks.resolve(id, &payload.url).await;

    Ok(success(json!({
        "html": html,
        "thumbnail": thumbnail,
    })))
}

/// 解析已缓存的缩略图
pub async fn get_thumbnail(
    Path(id): Path<i64>,
    Query(query): Query<ThumbnailQuery>,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let thumbnail = state
        .hooks
        .resolve(id, &query.url)
        .await
        .ok_or_else(|| ApiError::ThumbnailNotCached(query.url.clone()))?;

    Ok(success(thumbnail))
}
