// 嵌入内容提供方识别
//
// 每个提供方负责：
// - 判断嵌入 URL 是否属于自己
// - 从原始嵌入 URL 提取外部 ID（Resolve 使用）
// - 从提供方返回的缩略图 URL 提取外部 ID（Acquire 使用）
// - 给出按优先级排列的分辨率档位
//
// 两个提取方向的规则不同，Acquire 与 Resolve 各用各的

use regex::Regex;
use std::sync::{Arc, OnceLock};
use url::Url;

/// 嵌入内容提供方
pub trait EmbedProvider: Send + Sync {
    /// 提供方标识，出现在文件名与元数据 key 中（如 "youtube"）
    fn kind(&self) -> &'static str;

    /// 判断嵌入 URL 是否属于该提供方
    fn matches(&self, embed_url: &str) -> bool;

    /// 从原始嵌入 URL 提取外部 ID
    fn id_from_embed_url(&self, embed_url: &str) -> Option<String>;

    /// 从提供方返回的缩略图 URL 提取外部 ID
    fn id_from_thumbnail_url(&self, thumbnail_url: &str) -> Option<String>;

    /// 分辨率档位，按从大到小的顺序尝试
    fn tiers(&self) -> &'static [&'static str];

    /// 指定档位的远程缩略图地址
    fn remote_thumbnail_url(&self, external_id: &str, tier: &str) -> String;
}

/// YouTube
#[derive(Debug, Clone, Copy, Default)]
pub struct YouTubeProvider;

impl YouTubeProvider {
    const KIND: &'static str = "youtube";

    /// 原始嵌入 URL 的两种已知前缀
    const EMBED_PREFIXES: [&'static str; 2] =
        ["https://www.youtube.com/watch?v=", "https://youtu.be/"];

    /// oEmbed 返回的缩略图地址前缀，格式：`<prefix><id>/<name>.jpg`
    const THUMBNAIL_PREFIX: &'static str = "https://i.ytimg.com/vi/";

    const TIERS: [&'static str; 3] = ["maxresdefault", "hqdefault", "0"];
}

impl EmbedProvider for YouTubeProvider {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn matches(&self, embed_url: &str) -> bool {
        let Ok(url) = Url::parse(embed_url) else {
            return false;
        };

        match url.host_str() {
            Some(host) => {
                let host = host.to_ascii_lowercase();
                host == "youtu.be" || host == "youtube.com" || host.ends_with(".youtube.com")
            }
            None => false,
        }
    }

    fn id_from_embed_url(&self, embed_url: &str) -> Option<String> {
        Self::EMBED_PREFIXES
            .iter()
            .find_map(|prefix| embed_url.strip_prefix(*prefix))
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    fn id_from_thumbnail_url(&self, thumbnail_url: &str) -> Option<String> {
        thumbnail_url
            .strip_prefix(Self::THUMBNAIL_PREFIX)?
            .split('/')
            .next()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }

    fn tiers(&self) -> &'static [&'static str] {
        &Self::TIERS
    }

    fn remote_thumbnail_url(&self, external_id: &str, tier: &str) -> String {
        format!("https://img.youtube.com/vi/{}/{}.jpg", external_id, tier)
    }
}

/// 外部 ID 会成为文件名的一部分，只允许字母、数字、`_` 与 `-`
pub fn is_safe_external_id(external_id: &str) -> bool {
    static EXTERNAL_ID_REGEX: OnceLock<Regex> = OnceLock::new();

    let regex = EXTERNAL_ID_REGEX
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("外部 ID 正则表达式编译失败"));

    regex.is_match(external_id)
}

/// 已注册的提供方
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn EmbedProvider>>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<Arc<dyn EmbedProvider>>) -> Self {
        Self { providers }
    }

    /// 目前只有 YouTube
    pub fn with_defaults() -> Self {
        Self::new(vec![Arc::new(YouTubeProvider)])
    }

    /// 查找能处理该嵌入 URL 的提供方
    pub fn find(&self, embed_url: &str) -> Option<&dyn EmbedProvider> {
        self.providers
            .iter()
            .map(|p| p.as_ref())
            .find(|p| p.matches(embed_url))
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn EmbedProvider> + '_ {
        self.providers.iter().map(|p| p.as_ref())
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
