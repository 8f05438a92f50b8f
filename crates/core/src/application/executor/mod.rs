// Rollback Executor - bounded worker pool for asynchronous rollbacks
//
// Core workers start eagerly and live until shutdown. When the queue is full,
// overflow workers are added up to `max_workers` and retire after
// `keep_alive` of idleness. A full queue with every worker slot taken rejects
// the submission instead of blocking the caller.

pub mod constants;

use crate::error::{AppError, Result};
use constants::*;
use futures::future::BoxFuture;
use std::any::Any;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

type Task = BoxFuture<'static, ()>;
type SharedReceiver = Arc<AsyncMutex<mpsc::Receiver<Task>>>;

/// Sizing of the rollback pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub core_workers: usize,
    pub max_workers: usize,
    pub keep_alive: Duration,
    pub queue_capacity: usize,
}

impl ExecutorConfig {
    /// 5x / 10x the given CPU count, 60s keep-alive, 1024 queued tasks
    pub fn from_parallelism(parallelism: usize) -> Self {
        let cpus = parallelism.max(1);
        Self {
            core_workers: cpus * CORE_WORKERS_PER_CPU,
            max_workers: cpus * MAX_WORKERS_PER_CPU,
            keep_alive: WORKER_KEEP_ALIVE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(AppError::Config(
                "Rollback queue capacity must be at least 1".to_string(),
            ));
        }
        if self.core_workers == 0 {
            return Err(AppError::Config(
                "Rollback executor needs at least one core worker".to_string(),
            ));
        }
        if self.core_workers > self.max_workers {
            return Err(AppError::Config(format!(
                "core_workers ({}) exceeds max_workers ({})",
                self.core_workers, self.max_workers
            )));
        }
        Ok(())
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::from_parallelism(cpus)
    }
}

/// Bounded pool running rollback tasks off the caller's path
pub struct RollbackExecutor {
    config: ExecutorConfig,
    sender: Mutex<Option<mpsc::Sender<Task>>>,
    receiver: SharedReceiver,
    workers: Arc<AtomicUsize>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl RollbackExecutor {
    /// Start the pool with its core workers. Must be called inside a tokio runtime.
    pub fn start(config: ExecutorConfig) -> Result<Self> {
        config.validate()?;
        let (tx, rx) = mpsc::channel(config.queue_capacity);

        let executor = Self {
            config,
            sender: Mutex::new(Some(tx)),
            receiver: Arc::new(AsyncMutex::new(rx)),
            workers: Arc::new(AtomicUsize::new(0)),
            handles: Mutex::new(Vec::new()),
        };
        for _ in 0..executor.config.core_workers {
            executor.workers.fetch_add(1, Ordering::SeqCst);
            executor.spawn_worker(None, None);
        }

        info!(
            executor = EXECUTOR_NAME,
            core_workers = executor.config.core_workers,
            max_workers = executor.config.max_workers,
            queue_capacity = executor.config.queue_capacity,
            "Rollback executor started"
        );
        Ok(executor)
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Live workers (core + overflow)
    pub fn worker_count(&self) -> usize {
        self.workers.load(Ordering::SeqCst)
    }

    /// Tasks waiting in the queue
    pub fn queued(&self) -> usize {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|tx| tx.max_capacity() - tx.capacity())
            .unwrap_or(0)
    }

    /// Hand a task to the pool without waiting for it
    ///
    /// # Errors
    /// - AppError::ExecutorSaturated if the queue is full and no worker can be added
    /// - AppError::InvalidState after shutdown
    pub fn submit<F>(&self, task: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = sender.as_ref() else {
            return Err(AppError::InvalidState(
                "Rollback executor is shut down".to_string(),
            ));
        };

        match tx.try_send(Box::pin(task)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(task)) => {
                if self.reserve_worker() {
                    debug!(
                        executor = EXECUTOR_NAME,
                        workers = self.worker_count(),
                        "Queue full, adding overflow worker"
                    );
                    self.spawn_worker(Some(task), Some(self.config.keep_alive));
                    Ok(())
                } else {
                    let queued = tx.max_capacity() - tx.capacity();
                    let workers = self.worker_count();
                    warn!(
                        executor = EXECUTOR_NAME,
                        queued, workers, "Rollback submission rejected, executor saturated"
                    );
                    Err(AppError::ExecutorSaturated { queued, workers })
                }
            }
            Err(TrySendError::Closed(_)) => Err(AppError::InvalidState(
                "Rollback executor is shut down".to_string(),
            )),
        }
    }

    /// Stop accepting work, then wait up to `grace` for queued and running
    /// tasks to finish.
    ///
    /// When the grace period runs out, tasks still in the queue are dropped
    /// unstarted and the call keeps waiting for the running ones, which are
    /// never cut off mid-way. Returns false if anything had to be dropped.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if sender.is_none() {
            debug!(executor = EXECUTOR_NAME, "Shutdown requested twice");
        }
        drop(sender);

        let handles = std::mem::take(&mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner));
        info!(
            executor = EXECUTOR_NAME,
            workers = handles.len(),
            "Rollback executor draining"
        );

        let workers = futures::future::join_all(handles);
        tokio::pin!(workers);

        let drained = match tokio::time::timeout(grace, &mut workers).await {
            Ok(results) => {
                log_join_failures(results);
                true
            }
            Err(_) => {
                let dropped = self.abandon_queue().await;
                warn!(
                    executor = EXECUTOR_NAME,
                    grace_ms = grace.as_millis() as u64,
                    dropped,
                    "Shutdown grace period expired, dropped queued rollbacks, waiting for running ones"
                );
                log_join_failures(workers.await);
                false
            }
        };
        info!(executor = EXECUTOR_NAME, "Rollback executor stopped");
        drained
    }

    /// Close the queue and drop whatever has not been picked up yet
    async fn abandon_queue(&self) -> usize {
        let mut receiver = self.receiver.lock().await;
        receiver.close();
        let mut dropped = 0;
        while let Ok(task) = receiver.try_recv() {
            drop(task);
            dropped += 1;
        }
        dropped
    }

    fn reserve_worker(&self) -> bool {
        let max = self.config.max_workers;
        self.workers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < max).then_some(n + 1)
            })
            .is_ok()
    }

    // Caller has already counted the worker
    fn spawn_worker(&self, first: Option<Task>, keep_alive: Option<Duration>) {
        let handle = tokio::spawn(worker_loop(
            Arc::clone(&self.receiver),
            Arc::clone(&self.workers),
            first,
            keep_alive,
        ));
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }
}

/// `keep_alive == None` marks a core worker
async fn worker_loop(
    receiver: SharedReceiver,
    workers: Arc<AtomicUsize>,
    first: Option<Task>,
    keep_alive: Option<Duration>,
) {
    if let Some(task) = first {
        run_isolated(task).await;
    }

    loop {
        let next = match keep_alive {
            Some(idle) => match tokio::time::timeout(idle, next_task(&receiver)).await {
                Ok(next) => next,
                Err(_) => {
                    debug!(executor = EXECUTOR_NAME, "Overflow worker idle, retiring");
                    break;
                }
            },
            None => next_task(&receiver).await,
        };

        match next {
            Some(task) => run_isolated(task).await,
            // Channel closed and drained
            None => break,
        }
    }

    workers.fetch_sub(1, Ordering::SeqCst);
}

fn log_join_failures(results: Vec<std::result::Result<(), tokio::task::JoinError>>) {
    for result in results {
        if let Err(join_err) = result {
            error!(executor = EXECUTOR_NAME, "Worker join failed: {:?}", join_err);
        }
    }
}

async fn next_task(receiver: &AsyncMutex<mpsc::Receiver<Task>>) -> Option<Task> {
    receiver.lock().await.recv().await
}

async fn run_isolated(task: Task) {
    // Spawned so a panicking task cannot kill the worker
    if let Err(join_err) = tokio::spawn(task).await {
        if join_err.is_panic() {
            let panic_msg = panic_message(join_err.into_panic());
            error!(executor = EXECUTOR_NAME, panic_msg = %panic_msg, "Rollback task panicked");
        } else {
            warn!(executor = EXECUTOR_NAME, "Rollback task cancelled");
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
