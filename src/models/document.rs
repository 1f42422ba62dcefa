use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::validation::{StringValidator, ValidationError, Validator};

/// 文档（可能包含嵌入内容的文章）
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl Validator for CreateDocumentRequest {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        StringValidator::validate_title(&self.title)?;
        StringValidator::validate_content(&self.content)?;
        Ok(())
    }
}

/// 更新文档，未提供的字段保持不变
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDocumentRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl Validator for UpdateDocumentRequest {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        if let Some(ref title) = self.title {
            StringValidator::validate_title(title)?;
        }
        if let Some(ref content) = self.content {
            StringValidator::validate_content(content)?;
        }
        Ok(())
    }
}

impl UpdateDocumentRequest {
    /// 将更新应用到已有文档上，返回更新后的文档
    pub fn apply_to(&self, document: &Document) -> Document {
        Document {
            title: self.title.clone().unwrap_or_else(|| document.title.clone()),
            content: self.content.clone().unwrap_or_else(|| document.content.clone()),
            updated_at: Utc::now(),
            ..document.clone()
        }
    }
}
