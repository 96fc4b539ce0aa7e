// Uri resolver - turns source locators into paths the transcoder can open

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::adapters::fs_metadata::FILE_SCHEME;
use crate::domain::errors::ResolveError;
use crate::domain::model::FileInfo;
use crate::ports::{MetadataPort, SourceResolver};

/// Resolves content or file locators through the metadata service
pub struct UriResolver {
    metadata: Arc<dyn MetadataPort>,
}

impl UriResolver {
    pub fn new(metadata: Arc<dyn MetadataPort>) -> Self {
        Self { metadata }
    }

    /// Resolve `source_uri` to a local file path.
    ///
    /// Resolving a path this method returned yields the same path again.
    pub async fn resolve(&self, source_uri: &str) -> Result<String, ResolveError> {
        let not_found = || ResolveError::NotFound {
            uri: source_uri.to_string(),
        };

        match self.metadata.get_info(source_uri).await {
            FileInfo {
                exists: true,
                resolved_uri: Some(resolved),
            } => {
                let path = to_local_path(&resolved);
                if path.is_empty() {
                    warn!("Metadata service returned an empty path for {}", source_uri);
                    return Err(not_found());
                }
                debug!("Resolved {} -> {}", source_uri, path);
                Ok(path.to_string())
            }
            _ => Err(not_found()),
        }
    }
}

/// Strip the file scheme so a subprocess can open the location directly
fn to_local_path(uri: &str) -> &str {
    uri.strip_prefix(FILE_SCHEME).unwrap_or(uri)
}

#[async_trait]
impl SourceResolver for UriResolver {
    async fn resolve(&self, source_uri: &str) -> Result<String, ResolveError> {
        UriResolver::resolve(self, source_uri).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LocalMetadataAdapter;
    use std::collections::HashMap;

    /// Metadata service answering from a fixed table
    struct TableMetadata(HashMap<String, String>);

    #[async_trait]
    impl MetadataPort for TableMetadata {
        async fn get_info(&self, uri: &str) -> FileInfo {
            match self.0.get(uri) {
                Some(resolved) => FileInfo {
                    exists: true,
                    resolved_uri: Some(resolved.clone()),
                },
                None => FileInfo::default(),
            }
        }
    }

    fn table_resolver() -> UriResolver {
        let mut table = HashMap::new();
        table.insert(
            "content://media/external/video/42".to_string(),
            "file:///storage/videos/a.mp4".to_string(),
        );
        table.insert(
            "/storage/videos/a.mp4".to_string(),
            "file:///storage/videos/a.mp4".to_string(),
        );
        table.insert("/broken".to_string(), "file://".to_string());
        UriResolver::new(Arc::new(TableMetadata(table)))
    }

    #[tokio::test]
    async fn test_content_locator_resolves_to_path() {
        let resolver = table_resolver();
        let path = resolver
            .resolve("content://media/external/video/42")
            .await
            .unwrap();
        assert_eq!(path, "/storage/videos/a.mp4");
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let resolver = table_resolver();
        let once = resolver
            .resolve("content://media/external/video/42")
            .await
            .unwrap();
        let twice = resolver.resolve(&once).await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_unknown_locator_is_not_found() {
        let resolver = table_resolver();
        assert_eq!(
            resolver.resolve("content://media/external/video/7").await,
            Err(ResolveError::NotFound {
                uri: "content://media/external/video/7".to_string()
            })
        );
        assert!(resolver.resolve("/broken").await.is_err());
    }

    #[tokio::test]
    async fn test_idempotent_against_local_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip source.mp4"), b"data").unwrap();
        let resolver = UriResolver::new(Arc::new(LocalMetadataAdapter::new(Some(
            dir.path().to_path_buf(),
        ))));

        let first = resolver
            .resolve("content://media/clip%20source.mp4")
            .await
            .unwrap();
        assert_eq!(resolver.resolve(&first).await.unwrap(), first);

        let via_file_uri = resolver.resolve(&format!("file://{}", first)).await.unwrap();
        assert_eq!(via_file_uri, first);
    }
}
