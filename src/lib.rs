//! Clipshelf Library
//!
//! Cuts short clips out of source videos with an external `ffmpeg` process and
//! keeps them in a small persistent catalog.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use app::{
    AppContainer, ClipCatalogStore, ClipExtractionPipeline, ClipSession, DefaultAppContainer,
};
pub use domain::errors::{CatalogError, PipelineError, SessionError};
pub use domain::model::{ClipDescriptor, ClipRecord, ClipWindow, EncodingPolicy, TimeSpec};
