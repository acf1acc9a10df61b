//! Callback delivery for generated clients.
//!
//! A call runs as a task on a tokio runtime, away from the caller. Its
//! `Result` is then handed to a [`Delivery`], which decides where the
//! callback actually executes: inline on the worker, or queued for a
//! designated thread to drain (a UI loop, a test harness).

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::error::ClientError;

/// A callback ready to run.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Where completed callbacks run.
pub trait Delivery: Send + Sync + 'static {
    /// Runs or schedules `job`.
    fn deliver(&self, job: Job);
}

/// Runs callbacks on the runtime worker that finished the call.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDelivery;

impl Delivery for InlineDelivery {
    fn deliver(&self, job: Job) {
        job();
    }
}

/// Sends callbacks to a [`DeliveryQueue`].
///
/// Once the queue has been dropped there is nowhere to run a callback: it is
/// dropped unrun and a warning is logged.
#[derive(Debug, Clone)]
pub struct QueueDelivery {
    sender: mpsc::UnboundedSender<Job>,
}

impl Delivery for QueueDelivery {
    fn deliver(&self, job: Job) {
        if self.sender.send(job).is_err() {
            tracing::warn!("delivery queue closed; dropping callback");
        }
    }
}

/// Receiving end of a [`QueueDelivery`], drained by the designated thread.
#[derive(Debug)]
pub struct DeliveryQueue {
    receiver: mpsc::UnboundedReceiver<Job>,
}

impl DeliveryQueue {
    /// Creates a connected delivery and queue.
    pub fn channel() -> (QueueDelivery, DeliveryQueue) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (QueueDelivery { sender }, DeliveryQueue { receiver })
    }

    /// Runs every callback already queued, without waiting. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Waits for the next callback and runs it. Returns `false` once every
    /// sender is gone and the queue is empty.
    pub async fn run_next(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Blocks the current (non-runtime) thread running callbacks until every
    /// sender is dropped.
    pub fn run_blocking(mut self) {
        while let Some(job) = self.receiver.blocking_recv() {
            job();
        }
    }
}

/// Runs calls on a tokio runtime and delivers their results exactly once.
///
/// ## Examples
///
/// ```
/// use apiforge_runtime::client::{DeliveryQueue, Dispatcher};
///
/// let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// let (delivery, mut queue) = DeliveryQueue::channel();
/// let dispatcher = Dispatcher::new(runtime.handle().clone(), delivery);
///
/// let (tx, rx) = std::sync::mpsc::channel();
/// dispatcher.dispatch(async { Ok(21 * 2) }, move |result| tx.send(result.unwrap()).unwrap());
///
/// runtime.block_on(async { queue.run_next().await });
/// assert_eq!(rx.recv().unwrap(), 42);
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    runtime: Handle,
    delivery: Arc<dyn Delivery>,
}

impl Dispatcher {
    /// Creates a dispatcher running calls on `runtime`.
    pub fn new(runtime: Handle, delivery: impl Delivery) -> Self {
        Self {
            runtime,
            delivery: Arc::new(delivery),
        }
    }

    /// A dispatcher on `runtime` that runs callbacks inline.
    pub fn inline(runtime: Handle) -> Self {
        Self::new(runtime, InlineDelivery)
    }

    /// Runs `call` off the caller's context and hands its result to `callback`.
    ///
    /// The callback runs at most once. A panic inside `call` arrives as
    /// [`ClientError::Aborted`]; it never crosses into the caller.
    ///
    /// Delivery decides whether it runs at all. [`InlineDelivery`] always
    /// runs it. [`QueueDelivery`] drops it unrun when its [`DeliveryQueue`]
    /// is gone, so keep the queue alive for as long as calls are in flight.
    pub fn dispatch<T, F, C>(&self, call: F, callback: C)
    where
        T: Send + 'static,
        F: Future<Output = Result<T, ClientError>> + Send + 'static,
        C: FnOnce(Result<T, ClientError>) + Send + 'static,
    {
        let runtime = self.runtime.clone();
        let delivery = Arc::clone(&self.delivery);
        self.runtime.spawn(async move {
            let result = match runtime.spawn(call).await {
                Ok(result) => result,
                Err(join_error) => {
                    tracing::debug!(error = %join_error, "client call aborted");
                    Err(ClientError::Aborted(join_error.to_string()))
                }
            };
            delivery.deliver(Box::new(move || callback(result)));
        });
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}
