use std::future::Future;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::config::Config;
use super::flusher::Flusher;
use super::types::BufferError;

struct State<T> {
    queue: Vec<T>,
    last_flush: Instant,
    closed: bool,
}

struct Shared<T> {
    config: Arc<Config>,
    state: Arc<Mutex<State<T>>>,
    flusher: Box<dyn Flusher<T>>,
    done: CancellationToken,
}

enum Worker {
    Running(JoinHandle<()>),
    Finished(Result<(), String>),
}

/// A bounded buffer that hands its items to a [`Flusher`] in batches.
///
/// A batch is delivered when an insertion finds the buffer full, or when
/// `max_delay` has passed since the previous flush, whichever comes first.
/// Every state change goes through one lock, so exactly one flush runs at a
/// time and a flush never sees half of another caller's `insert`.
///
/// Handles are cheap to clone; all clones share the same buffer and timer.
/// Call [`close`](Self::close) to deliver the remainder and stop the timer.
///
/// # Cancellation
///
/// `insert`, `push`, `flush` and `close` are cancel safe. Once one of them
/// has taken the lock, any flush it starts runs on its own task while still
/// holding that lock. Dropping the caller's future (through `timeout` or a
/// `select!` branch) lets that work finish; no batch is lost.
pub struct TimedBuffer<T> {
    shared: Arc<Shared<T>>,
    worker: Arc<Mutex<Worker>>,
}

impl<T> Clone for TimedBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            worker: self.worker.clone(),
        }
    }
}

impl<T> TimedBuffer<T>
where
    T: Send + 'static,
{
    /// Creates the buffer and starts its timer task.
    ///
    /// Must be called from within a Tokio runtime. Fails with
    /// [`BufferError::InvalidConfig`] if capacity or delay is zero.
    pub fn new<F>(config: Arc<Config>, flusher: F) -> Result<Self, BufferError>
    where
        F: Flusher<T> + 'static,
    {
        config.validate()?;

        let shared = Arc::new(Shared {
            // grows on demand, capacity is only an upper bound
            state: Arc::new(Mutex::new(State {
                queue: Vec::new(),
                last_flush: Instant::now(),
                closed: false,
            })),
            config,
            flusher: Box::new(flusher),
            done: CancellationToken::new(),
        });

        let handle = tokio::spawn(Self::run_timer(Arc::downgrade(&shared)));

        Ok(Self {
            shared,
            worker: Arc::new(Mutex::new(Worker::Running(handle))),
        })
    }

    /// Appends items in order under a single lock acquisition.
    ///
    /// Whenever the queue is already full the pending batch is flushed
    /// first, before this call returns, so a slow flusher slows producers
    /// down rather than letting the buffer grow. If the flusher panics
    /// during such an inline flush, the panic resumes here.
    pub async fn insert<I>(&self, items: I) -> Result<(), BufferError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut state = self.shared.lock().await;
        if state.closed {
            return Err(BufferError::Closed);
        }

        let capacity = self.shared.config.capacity;
        let mut items = items.into_iter();
        while let Some(item) = items.next() {
            if state.queue.len() >= capacity {
                // The rest of the call, flushes included, moves to a task
                // that owns the guard.
                let mut rest = vec![item];
                rest.extend(items);
                let shared = Arc::clone(&self.shared);
                return detached(async move {
                    for item in rest {
                        if state.queue.len() >= capacity {
                            shared.flush_locked(&mut state, "inline").await;
                        }
                        state.queue.push(item);
                    }
                })
                .await;
            }
            state.queue.push(item);
        }
        Ok(())
    }

    /// Appends a single item. See [`insert`](Self::insert).
    pub async fn push(&self, item: T) -> Result<(), BufferError> {
        self.insert(std::iter::once(item)).await
    }

    /// Delivers whatever is queued right now.
    ///
    /// Does nothing if the queue is empty. A flush that delivers items
    /// restarts the delay window just like any other flush.
    pub async fn flush(&self) -> Result<(), BufferError> {
        let mut state = self.shared.lock().await;
        if state.closed {
            return Err(BufferError::Closed);
        }
        if state.queue.is_empty() {
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        detached(async move {
            shared.flush_locked(&mut state, "manual").await;
        })
        .await
    }

    /// Flushes the remainder, stops the timer and waits for it to exit.
    ///
    /// Every call, from any clone, returns only after the timer task has
    /// exited, and reports [`BufferError::Worker`] if that task had died.
    /// Closing twice is otherwise a no-op.
    pub async fn close(&self) -> Result<(), BufferError> {
        let mut state = self.shared.lock().await;
        if state.closed {
            drop(state);
        } else {
            let shared = Arc::clone(&self.shared);
            detached(async move {
                shared.flush_locked(&mut state, "close").await;
                state.closed = true;
                shared.done.cancel();
            })
            .await?;
        }

        self.join_worker().await
    }

    /// Number of items currently waiting.
    pub async fn len(&self) -> usize {
        self.shared.state.lock().await.queue.len()
    }

    /// Whether no items are waiting.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.shared.done.is_cancelled()
    }

    /// Returns the configuration the buffer was built with.
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    // The worker lock is held across the join, so concurrent closers wait
    // for the same outcome. A dropped join leaves the handle in place.
    async fn join_worker(&self) -> Result<(), BufferError> {
        let mut worker = self.worker.lock().await;
        let outcome = match &mut *worker {
            Worker::Running(handle) => {
                let outcome = handle.await.map_err(|e| e.to_string());
                if let Err(e) = &outcome {
                    error!(error = %e, "timed buffer timer task failed");
                }
                *worker = Worker::Finished(outcome.clone());
                outcome
            }
            Worker::Finished(outcome) => outcome.clone(),
        };
        outcome.map_err(BufferError::Worker)
    }

    // Wakes at `last_flush + max_delay`. An inline flush in the meantime
    // moves that deadline, so the wake-up just re-arms for the new one.
    async fn run_timer(weak: Weak<Shared<T>>) {
        let (done, max_delay, mut deadline) = match weak.upgrade() {
            Some(shared) => {
                let last_flush = shared.state.lock().await.last_flush;
                let max_delay = shared.config.max_delay;
                (shared.done.clone(), max_delay, last_flush + max_delay)
            }
            None => return,
        };
        debug!(?max_delay, "timed buffer timer started");

        loop {
            tokio::select! {
                _ = done.cancelled() => break,
                _ = sleep_until(deadline) => {}
            }

            let Some(shared) = weak.upgrade() else {
                break;
            };
            let mut state = shared.state.lock().await;
            if state.closed {
                break;
            }

            if state.last_flush.elapsed() >= max_delay {
                if state.queue.is_empty() {
                    // idle window, start a fresh one
                    state.last_flush = Instant::now();
                } else {
                    shared.flush_locked(&mut state, "timer").await;
                }
            }
            deadline = state.last_flush + max_delay;
        }

        debug!("timed buffer timer stopped");
    }
}

impl<T> Shared<T>
where
    T: Send + 'static,
{
    async fn lock(&self) -> OwnedMutexGuard<State<T>> {
        Arc::clone(&self.state).lock_owned().await
    }

    /// Caller must hold the state lock; `state` is the guarded value.
    async fn flush_locked(&self, state: &mut State<T>, trigger: &'static str) {
        if state.queue.is_empty() {
            return;
        }

        let batch: Vec<T> = state.queue.drain(..).collect();
        debug!(items = batch.len(), trigger, "flushing timed buffer");
        self.flusher.flush(batch).await;
        state.last_flush = Instant::now();
    }
}

/// Runs `work` on its own task and waits for it, so that dropping the
/// waiting future cannot stop a delivery half way.
async fn detached<F>(work: F) -> Result<(), BufferError>
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::spawn(work).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(BufferError::Worker(e.to_string())),
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        self.done.cancel();

        if let Ok(state) = self.state.try_lock() {
            if !state.closed && !state.queue.is_empty() {
                warn!(
                    items = state.queue.len(),
                    "timed buffer dropped without close, discarding pending items"
                );
            }
        }
    }
}
