pub mod thumbnails;

pub use thumbnails::{ConfigManager, LifecycleHooks, ThumbnailConfig, ThumbnailError, ThumbnailService};
