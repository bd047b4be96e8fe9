//! # timed-buffer
//!
//! A bounded buffer for Tokio that collects items from any number of
//! producers and hands them to a flush callback in batches.
//!
//! ## Features
//!
//! - **Size trigger**: a full buffer is flushed inline by the inserting task
//! - **Delay trigger**: a background timer flushes once `max_delay` has
//!   passed since the previous flush
//! - **Synchronous backpressure**: producers wait while the flusher runs
//! - **Draining close** that delivers the remainder exactly once
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use timed_buffer::buffer::{Config, TimedBuffer};
//!
//! let config = Arc::new(Config::new(100, Duration::from_secs(5))?);
//!
//! let buffer: TimedBuffer<u64> = TimedBuffer::new(config, |batch: Vec<u64>| async move {
//!     println!("writing {} rows", batch.len());
//! })?;
//!
//! buffer.insert([1, 2, 3]).await?;
//! buffer.close().await?;
//! ```
//!
//! The flush callback runs while the buffer's lock is held. It must not call
//! back into the same buffer, or it will deadlock.
//!
//! ## Modules
//!
//! - [`buffer`] - The timed buffer, its config and the flusher trait

pub mod buffer;
