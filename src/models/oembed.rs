use serde::{Deserialize, Serialize};

use super::validation::{StringValidator, ValidationError, Validator};

/// oEmbed 提供方返回的数据
///
/// 只声明用到的字段，其余字段忽略
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OEmbedResponse {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub thumbnail_width: Option<u32>,
    #[serde(default)]
    pub thumbnail_height: Option<u32>,
}

/// oEmbed HTML 解析完成事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OEmbedParsedRequest {
    /// 解析出的嵌入 HTML，原样返回
    #[serde(default)]
    pub html: String,
    /// 被嵌入内容的原始 URL
    pub url: String,
    /// 提供方返回的数据
    #[serde(default)]
    pub data: OEmbedResponse,
}

impl Validator for OEmbedParsedRequest {
    type Error = ValidationError;

    fn validate(&self) -> Result<(), Self::Error> {
        StringValidator::validate_url(&self.url)?;
        StringValidator::validate_optional_url(&self.data.thumbnail_url)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_youtube_oembed_payload() {
        let json = r#"{
            "html": "<iframe src=\"https://www.youtube.com/embed/abc123\"></iframe>",
            "url": "https://youtu.be/abc123",
            "data": {
                "type": "video",
                "title": "Demo",
                "provider_name": "YouTube",
                "thumbnail_url": "https://i.ytimg.com/vi/abc123/hqdefault.jpg",
                "thumbnail_width": 480,
                "thumbnail_height": 360,
                "author_name": "ignored"
            }
        }"#;

        let request: OEmbedParsedRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.data.kind.as_deref(), Some("video"));
        assert_eq!(
            request.data.thumbnail_url.as_deref(),
            Some("https://i.ytimg.com/vi/abc123/hqdefault.jpg")
        );
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_missing_data_defaults() {
        let request: OEmbedParsedRequest =
            serde_json::from_str(r#"{ "url": "https://youtu.be/abc123" }"#).unwrap();
        assert!(request.data.thumbnail_url.is_none());
        assert!(request.html.is_empty());
    }
}
