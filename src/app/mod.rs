// Application layer - Clip components and their wiring

pub mod catalog;
pub mod command_builder;
pub mod container;
pub mod executor;
pub mod pipeline;
pub mod resolver;
pub mod session;

// Re-export components
pub use catalog::ClipCatalogStore;
pub use command_builder::ClipCommandBuilder;
pub use container::{AppContainer, DefaultAppContainer};
pub use executor::TranscodeExecutor;
pub use pipeline::{ClipExtractionPipeline, PipelineStage};
pub use resolver::UriResolver;
pub use session::{ClipSession, SessionPhase, SessionState};
