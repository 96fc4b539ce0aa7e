// Local file-metadata adapter - answers existence and local path for source locators

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::domain::model::FileInfo;
use crate::ports::MetadataPort;

pub const FILE_SCHEME: &str = "file://";
pub const CONTENT_SCHEME: &str = "content://";

/// Metadata service backed by the local filesystem.
///
/// Understands three locator shapes:
/// - plain paths (`/videos/a.mp4`, `clips/a.mp4`)
/// - file locators (`file:///videos/a%20b.mp4`)
/// - content locators (`content://media/holiday/a.mp4`), looked up under the
///   configured media library root
pub struct LocalMetadataAdapter {
    media_root: Option<PathBuf>,
}

impl LocalMetadataAdapter {
    pub fn new(media_root: Option<PathBuf>) -> Self {
        Self { media_root }
    }

    /// Map a locator to the filesystem path it names, without touching the disk
    fn locate(&self, uri: &str) -> Option<PathBuf> {
        if uri.starts_with(CONTENT_SCHEME) {
            let root = self.media_root.as_ref()?;
            let relative = content_relative_path(uri)?;
            // Content locators must stay inside the library
            if relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
            {
                return None;
            }
            return Some(root.join(relative));
        }

        if uri.starts_with(FILE_SCHEME) {
            return Url::parse(uri).ok()?.to_file_path().ok();
        }

        if uri.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(uri))
        }
    }
}

/// Decoded path of a content locator relative to the library root.
///
/// `content://media/a/b.mp4` and `content://a/b.mp4` both name `a/b.mp4`.
fn content_relative_path(uri: &str) -> Option<PathBuf> {
    let parsed = Url::parse(uri).ok()?;
    let mut decoded = Url::parse("file:///").ok()?;
    match parsed.host_str() {
        Some("media") | None => decoded.set_path(parsed.path()),
        Some(host) => decoded.set_path(&format!("/{}{}", host, parsed.path())),
    }
    let absolute = decoded.to_file_path().ok()?;
    let relative = absolute.strip_prefix("/").ok()?;
    if relative.as_os_str().is_empty() {
        return None;
    }
    Some(relative.to_path_buf())
}

#[async_trait]
impl MetadataPort for LocalMetadataAdapter {
    async fn get_info(&self, uri: &str) -> FileInfo {
        let Some(path) = self.locate(uri) else {
            debug!("Locator not addressable: {}", uri);
            return FileInfo::default();
        };

        let canonical = match tokio::fs::canonicalize(&path).await {
            Ok(canonical) => canonical,
            Err(e) => {
                debug!("Metadata lookup failed for {}: {}", path.display(), e);
                return FileInfo::default();
            }
        };

        match tokio::fs::metadata(&canonical).await {
            Ok(meta) if meta.is_file() => FileInfo {
                exists: true,
                resolved_uri: Some(format!("{}{}", FILE_SCHEME, canonical.display())),
            },
            _ => FileInfo::default(),
        }
    }
}
