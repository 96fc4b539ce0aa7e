//! Common utilities and helpers

pub mod log_buffer;
pub mod logging;
pub mod time;
pub mod token;
