pub mod config;
pub mod flusher;
pub mod timed_buffer;
pub mod types;

pub use config::{Config, ConfigBuilder, ConfigBuilderError};
pub use flusher::Flusher;
pub use timed_buffer::TimedBuffer;
pub use types::BufferError;
