// src/buffer/flusher.rs

use async_trait::async_trait;

/// Receives every batch a [`TimedBuffer`](super::TimedBuffer) delivers.
///
/// `flush` runs while the buffer's lock is held, on whichever task
/// triggered it: the inserting task for an inline flush, the timer task
/// for a periodic one. A slow flusher therefore stalls every other
/// operation on the same buffer.
///
/// A flusher must not call back into the buffer that invoked it. Doing so
/// waits on the lock the flush is already holding and deadlocks.
///
/// Failures are the flusher's own business: the buffer neither catches nor
/// retries them. A panic propagates to the task that ran the flush.
#[async_trait]
pub trait Flusher<T>: Send + Sync {
    /// Handles one non-empty batch, in insertion order.
    async fn flush(&self, items: Vec<T>);
}

#[async_trait]
impl<T, F, Fut> Flusher<T> for F
where
    F: Fn(Vec<T>) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = ()> + Send,
    T: Send + 'static,
{
    async fn flush(&self, items: Vec<T>) {
        self(items).await
    }
}
