use thiserror::Error;

/// 验证错误类型
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Title is too long (max 500 characters)")]
    TitleTooLong,

    #[error("Content is too long (max 1000000 characters)")]
    ContentTooLong,

    #[error("URL cannot be empty")]
    EmptyUrl,

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
}

/// 验证器trait
pub trait Validator {
    type Error;

    fn validate(&self) -> Result<(), Self::Error>;
}

/// 字符串验证工具
pub struct StringValidator;

impl StringValidator {
    pub fn validate_title(title: &str) -> Result<(), ValidationError> {
        if title.len() > 500 {
            return Err(ValidationError::TitleTooLong);
        }

        Ok(())
    }

    pub fn validate_content(content: &str) -> Result<(), ValidationError> {
        if content.len() > 1_000_000 {
            return Err(ValidationError::ContentTooLong);
        }

        Ok(())
    }

    /// 必填的 http(s) URL
    pub fn validate_url(url: &str) -> Result<(), ValidationError> {
        if url.trim().is_empty() {
            return Err(ValidationError::EmptyUrl);
        }

        match url::Url::parse(url) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
            _ => Err(ValidationError::InvalidUrl(url.to_string())),
        }
    }

    pub fn validate_optional_url(url: &Option<String>) -> Result<(), ValidationError> {
        match url {
            Some(url_str) if !url_str.is_empty() => Self::validate_url(url_str),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title() {
        assert!(StringValidator::validate_title("").is_ok());
        assert!(StringValidator::validate_title("Hello").is_ok());
        assert!(matches!(
            StringValidator::validate_title(&"a".repeat(501)),
            Err(ValidationError::TitleTooLong)
        ));
    }

    #[test]
    fn test_validate_url() {
        assert!(StringValidator::validate_url("https://youtu.be/abc123").is_ok());
        assert!(matches!(StringValidator::validate_url(" "), Err(ValidationError::EmptyUrl)));
        assert!(matches!(
            StringValidator::validate_url("ftp://example.com/a"),
            Err(ValidationError::InvalidUrl(_))
        ));
        assert!(StringValidator::validate_url("youtu.be/abc").is_err());
    }

    #[test]
    fn test_validate_optional_url() {
        assert!(StringValidator::validate_optional_url(&None).is_ok());
        assert!(StringValidator::validate_optional_url(&Some(String::new())).is_ok());
        assert!(StringValidator::validate_optional_url(&Some("nope".to_string())).is_err());
    }
}
