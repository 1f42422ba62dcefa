// 缩略图路径管理
//
// 提供统一的命名规则：
// - 缓存文件名：`<provider>-<external_id>-<tier>.jpg`
// - 元数据 key：`embed_privacy_thumbnail_<provider>_<external_id>`，
//   以及存放原始嵌入 URL 的 `..._url` 伴随 key
// - 缓存文件的本地路径与公开 URL

use std::path::{Component, Path, PathBuf};

/// 本模块拥有的元数据 key 前缀
pub const META_KEY_PREFIX: &str = "embed_privacy_thumbnail_";

/// 原始嵌入 URL 伴随 key 的后缀
pub const URL_KEY_SUFFIX: &str = "_url";

/// 缩略图文件名
pub fn thumbnail_filename(provider_kind: &str, external_id: &str, tier: &str) -> String {
    format!("{}-{}-{}.jpg", provider_kind, external_id, tier)
}

/// 存放文件名的元数据 key
pub fn meta_key(provider_kind: &str, external_id: &str) -> String {
    format!("{}{}_{}", META_KEY_PREFIX, provider_kind, external_id)
}

/// 存放原始嵌入 URL 的伴随 key
pub fn url_meta_key(provider_kind: &str, external_id: &str) -> String {
    format!("{}{}", meta_key(provider_kind, external_id), URL_KEY_SUFFIX)
}

/// 某个提供方的文件名 key 的公共前缀
pub fn provider_key_prefix(provider_kind: &str) -> String {
    format!("{}{}_", META_KEY_PREFIX, provider_kind)
}

/// 是否为本模块拥有的 key（文件名 key 或 URL 伴随 key）
pub fn is_thumbnail_key(key: &str) -> bool {
    key.starts_with(META_KEY_PREFIX)
}

/// 若 `key` 形如伴随 key，返回它对应的文件名 key
///
/// 外部 ID 本身可能以 `_url` 结尾，只有对应的文件名 key 在同一文档中
/// 确实存在时，`key` 才是伴随 key
pub fn companion_base(key: &str) -> Option<&str> {
    key.strip_suffix(URL_KEY_SUFFIX).filter(|base| is_thumbnail_key(base))
}

/// 缩略图路径生成器
///
/// 持有缓存目录、站点根目录与公开基础 URL
#[derive(Debug, Clone)]
pub struct ThumbnailPaths {
    cache_dir: PathBuf,
    install_root: PathBuf,
    public_base_url: String,
}

impl ThumbnailPaths {
    pub fn new(cache_dir: PathBuf, install_root: PathBuf, public_base_url: String) -> Self {
        Self {
            cache_dir,
            install_root,
            public_base_url,
        }
    }

    /// 缓存目录
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// 缓存文件的本地路径
    ///
    /// 文件名来自元数据，只接受单个普通路径组件，
    /// 含分隔符、`.` 或 `..` 的值返回 None
    ///
    /// # 示例
    /// ```
    /// use embed_thumbnail_cache::services::thumbnails::ThumbnailPaths;
    /// use std::path::PathBuf;
    ///
    /// let paths = ThumbnailPaths::new(
    ///     PathBuf::from("/srv/site/uploads/thumbnails"),
    ///     PathBuf::from("/srv/site"),
    ///     "https://example.com".to_string(),
    /// );
    /// assert_eq!(
    ///     paths.file_path("youtube-abc123-hqdefault.jpg"),
    ///     Some(PathBuf::from("/srv/site/uploads/thumbnails/youtube-abc123-hqdefault.jpg"))
    /// );
    /// assert_eq!(paths.file_path("../secret"), None);
    /// ```
    pub fn file_path(&self, filename: &str) -> Option<PathBuf> {
        let mut components = Path::new(filename).components();

        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Some(self.cache_dir.join(filename)),
            _ => None,
        }
    }

    /// 将本地路径转换为公开 URL
    ///
    /// 去掉站点根目录前缀后拼接到公开基础 URL 上；
    /// 路径不在站点根目录之内时返回 None
    ///
    /// # 示例
    /// ```
    /// use embed_thumbnail_cache::services::thumbnails::ThumbnailPaths;
    /// use std::path::{Path, PathBuf};
    ///
    /// let paths = ThumbnailPaths::new(
    ///     PathBuf::from("/srv/site/uploads/thumbnails"),
    ///     PathBuf::from("/srv/site"),
    ///     "https://example.com/".to_string(),
    /// );
    /// let url = paths.public_url(Path::new("/srv/site/uploads/thumbnails/youtube-abc123-0.jpg"));
    /// assert_eq!(url.as_deref(), Some("https://example.com/uploads/thumbnails/youtube-abc123-0.jpg"));
    /// ```
    pub fn public_url(&self, local_path: &Path) -> Option<String> {
        let relative = local_path.strip_prefix(&self.install_root).ok()?;

        let segments: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if segments.is_empty() {
            return None;
        }

        Some(format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            segments.join("/")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_paths() -> ThumbnailPaths {
        ThumbnailPaths::new(
            PathBuf::from("site/uploads/thumbnails"),
            PathBuf::from("site"),
            "https://example.com".to_string(),
        )
    }

    #[test]
    fn test_thumbnail_filename() {
        assert_eq!(
            thumbnail_filename("youtube", "abc123", "maxresdefault"),
            "youtube-abc123-maxresdefault.jpg"
        );
        assert_eq!(thumbnail_filename("youtube", "abc123", "0"), "youtube-abc123-0.jpg");
    }

    #[test]
    fn test_meta_keys() {
        assert_eq!(meta_key("youtube", "abc123"), "embed_privacy_thumbnail_youtube_abc123");
        assert_eq!(
            url_meta_key("youtube", "abc123"),
            "embed_privacy_thumbnail_youtube_abc123_url"
        );
        assert_eq!(provider_key_prefix("youtube"), "embed_privacy_thumbnail_youtube_");
    }

    #[test]
    fn test_key_classification() {
        assert!(is_thumbnail_key("embed_privacy_thumbnail_youtube_abc"));
        assert!(!is_thumbnail_key("_edit_lock"));
        assert_eq!(
            companion_base("embed_privacy_thumbnail_youtube_abc_url"),
            Some("embed_privacy_thumbnail_youtube_abc")
        );
        assert_eq!(companion_base("embed_privacy_thumbnail_youtube_abc"), None);
        assert_eq!(companion_base("other_url"), None);
    }

    #[test]
    fn test_file_path_rejects_traversal() {
        let paths = test_paths();
        assert!(paths.file_path("youtube-abc-0.jpg").is_some());
        assert!(paths.file_path("").is_none());
        assert!(paths.file_path("..").is_none());
        assert!(paths.file_path("a/b.jpg").is_none());
        assert!(paths.file_path("/etc/passwd").is_none());
    }

    #[test]
    fn test_public_url_relative_paths() {
        let paths = test_paths();
        let local = paths.file_path("youtube-abc-0.jpg").unwrap();
        assert_eq!(
            paths.public_url(&local).as_deref(),
            Some("https://example.com/uploads/thumbnails/youtube-abc-0.jpg")
        );
    }

    #[test]
    fn test_public_url_outside_install_root() {
        let paths = test_paths();
        assert_eq!(paths.public_url(Path::new("elsewhere/x.jpg")), None);
        assert_eq!(paths.public_url(Path::new("site")), None);
    }

    #[test]
    fn test_filename_is_deterministic() {
        let a = thumbnail_filename("youtube", "abc123", "hqdefault");
        let b = thumbnail_filename("youtube", "abc123", "hqdefault");
        assert_eq!(a, b);
        assert_ne!(a, thumbnail_filename("youtube", "abc123", "maxresdefault"));
    }
}
