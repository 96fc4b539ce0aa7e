use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::adapters::{
    AppConfig, FFmpegAdapter, FFprobeAdapter, JsonFileStorage, LocalMetadataAdapter,
};
use crate::app::{
    catalog::ClipCatalogStore, command_builder::ClipCommandBuilder, executor::TranscodeExecutor,
    pipeline::ClipExtractionPipeline, resolver::UriResolver, session::ClipSession,
};
use crate::ports::{
    ClipExecutor, MetadataPort, ProbePort, SourceResolver, StoragePort, TranscodePort,
};
use crate::utils::token::MonotonicClock;

pub trait AppContainer: Send + Sync {
    fn pipeline(&self) -> Arc<ClipExtractionPipeline>;
    fn catalog(&self) -> Arc<ClipCatalogStore>;
    fn executor(&self) -> Arc<TranscodeExecutor>;
    fn probe(&self) -> Arc<dyn ProbePort>;
    fn resolver(&self) -> Arc<UriResolver>;

    /// A fresh session over the shared pipeline and catalog
    fn new_session(&self) -> ClipSession;
}

/// One process-wide instance of every component, built from configuration
pub struct DefaultAppContainer {
    pipeline: Arc<ClipExtractionPipeline>,
    catalog: Arc<ClipCatalogStore>,
    executor: Arc<TranscodeExecutor>,
    probe: Arc<dyn ProbePort>,
    resolver: Arc<UriResolver>,
    clip_duration: f64,
}

impl DefaultAppContainer {
    pub async fn new(config: &AppConfig) -> Self {
        let metadata_port = Arc::new(LocalMetadataAdapter::new(config.media_root.clone()));
        let transcode_port = Arc::new(FFmpegAdapter::new(config.ffmpeg_path.clone()));
        let storage_port = Arc::new(JsonFileStorage::new(config.storage_path.clone()));
        let probe_port = Arc::new(FFprobeAdapter::new(config.ffprobe_path.clone()));

        let resolver = Arc::new(UriResolver::new(
            Arc::clone(&metadata_port) as Arc<dyn MetadataPort>
        ));
        let executor = Arc::new(
            TranscodeExecutor::new(Arc::clone(&transcode_port) as Arc<dyn TranscodePort>)
                .with_timeout(config.timeout_secs.map(Duration::from_secs)),
        );
        let builder = ClipCommandBuilder::new(Arc::new(MonotonicClock::new()))
            .with_policy(config.encoding)
            .with_codecs(config.video_codec.clone(), config.audio_codec.clone());

        let pipeline = Arc::new(ClipExtractionPipeline::new(
            Arc::clone(&resolver) as Arc<dyn SourceResolver>,
            builder,
            Arc::clone(&executor) as Arc<dyn ClipExecutor>,
            config.document_dir.clone(),
        ));
        let catalog = Arc::new(
            ClipCatalogStore::open(Arc::clone(&storage_port) as Arc<dyn StoragePort>).await,
        );

        debug!(
            "Container ready: clips in {}, catalog at {}, encoding {}",
            config.document_dir.display(),
            config.storage_path.display(),
            config.encoding
        );

        Self {
            pipeline,
            catalog,
            executor,
            probe: probe_port,
            resolver,
            clip_duration: config.clip_duration,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn pipeline(&self) -> Arc<ClipExtractionPipeline> {
        Arc::clone(&self.pipeline)
    }

    fn catalog(&self) -> Arc<ClipCatalogStore> {
        Arc::clone(&self.catalog)
    }

    fn executor(&self) -> Arc<TranscodeExecutor> {
        Arc::clone(&self.executor)
    }

    fn probe(&self) -> Arc<dyn ProbePort> {
        Arc::clone(&self.probe)
    }

    fn resolver(&self) -> Arc<UriResolver> {
        Arc::clone(&self.resolver)
    }

    fn new_session(&self) -> ClipSession {
        ClipSession::new(self.pipeline(), self.catalog()).with_clip_duration(self.clip_duration)
    }
}
