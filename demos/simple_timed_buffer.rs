//! Timed buffer example with several producers and a slow sink.
//!
//! Run with: cargo run --example simple_timed_buffer

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use timed_buffer::buffer::{ConfigBuilder, Flusher, TimedBuffer};
use tracing::info;

/// Sink that logs each batch and pretends to write it somewhere
struct PrintingFlusher;

#[async_trait]
impl Flusher<u32> for PrintingFlusher {
    async fn flush(&self, items: Vec<u32>) {
        info!(size = items.len(), ?items, "writing batch");
        // Simulate a downstream write
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = Arc::new(
        ConfigBuilder::default()
            .capacity(10usize)
            .max_delay(Duration::from_millis(300))
            .build()?,
    );

    let buffer: TimedBuffer<u32> = TimedBuffer::new(config, PrintingFlusher)?;

    info!("starting 3 producers, 25 items each");

    let mut producers = Vec::new();
    for p in 0..3u32 {
        let buffer = buffer.clone();
        producers.push(tokio::spawn(async move {
            for i in 0..25 {
                buffer.push(p * 100 + i).await?;
                // Slow trickle so some batches go out on the timer
                if i % 8 == 7 {
                    tokio::time::sleep(Duration::from_millis(400)).await;
                }
            }
            Ok::<(), timed_buffer::buffer::BufferError>(())
        }));
    }

    for producer in producers {
        producer.await??;
    }

    buffer.close().await?;
    info!("timed buffer closed");
    Ok(())
}
