//! Fixed-size worker pool used by both pipelines.
//!
//! The pool owns a set of worker threads that drain a shared job channel.
//! Work is handed out two ways:
//!
//! - [`WorkerPool::submit`] enqueues a single closure and returns a
//!   [`TaskHandle`] that can be joined for the result.
//! - [`WorkerPool::parallel_for`] fans a half-open index range out over the
//!   pool: one task per worker, each atomically claiming the next index from
//!   a shared cursor until the range is exhausted. The call blocks until
//!   every index has been processed.
//!
//! The pool is an explicit value: `main` creates one and passes it by
//! reference into the compression and extraction pipelines. Dropping the
//! pool (or calling [`WorkerPool::shutdown`]) closes the queue, wakes the
//! workers and joins them; submitting afterwards fails with a pool error.
//!
//! `parallel_for` is only ever called from the orchestrator thread; tasks
//! never re-enter the pool from inside a worker.

use crate::error::{ArchiveError, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed-size pool of worker threads.
pub struct WorkerPool {
    sender: Mutex<Option<Sender<Job>>>,
    workers: Vec<JoinHandle<()>>,
    thread_count: usize,
}

/// Completion handle for a task submitted with [`WorkerPool::submit`].
#[derive(Debug)]
pub struct TaskHandle<T> {
    done: Receiver<T>,
}

impl<T> TaskHandle<T> {
    /// Blocks until the task has run and returns its result.
    pub fn join(self) -> Result<T> {
        self.done
            .recv()
            .map_err(|_| ArchiveError::Pool("worker exited before completing the task"))
    }
}

impl WorkerPool {
    /// Creates a pool sized to the hardware: one thread per logical CPU,
    /// minus one for the orchestrator, never fewer than one.
    pub fn new() -> Self {
        Self::with_threads(num_cpus::get().saturating_sub(1))
    }

    /// Creates a pool with an explicit number of worker threads (min 1).
    pub fn with_threads(threads: usize) -> Self {
        let thread_count = threads.max(1);
        let (sender, receiver) = unbounded::<Job>();
        let workers = (0..thread_count)
            .map(|_| {
                let receiver = receiver.clone();
                thread::spawn(move || {
                    // Runs until the sender side is dropped and the queue drains.
                    for job in receiver.iter() {
                        job();
                    }
                })
            })
            .collect();

        Self { sender: Mutex::new(Some(sender)), workers, thread_count }
    }

    /// Number of worker threads in the pool.
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Enqueues a task and returns a handle for its result.
    ///
    /// Fails if the pool has been shut down.
    pub fn submit<T, F>(&self, task: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = bounded(1);
        let job: Job = Box::new(move || {
            let _ = done_tx.send(task());
        });

        let guard = self.sender.lock().unwrap();
        match guard.as_ref() {
            Some(sender) => sender
                .send(job)
                .map_err(|_| ArchiveError::Pool("worker pool is shut down"))?,
            None => return Err(ArchiveError::Pool("worker pool is shut down")),
        }
        Ok(TaskHandle { done: done_rx })
    }

    /// Runs `body(index)` for every index in `0..len` across the pool.
    ///
    /// Spawns one task per worker thread; each task repeatedly claims the
    /// next unprocessed index from a shared atomic cursor. Blocks until all
    /// indices have been processed.
    pub fn parallel_for<F>(&self, len: usize, body: F) -> Result<()>
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        if len == 0 {
            return Ok(());
        }

        let body = Arc::new(body);
        let cursor = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(self.thread_count);
        for _ in 0..self.thread_count {
            let body = Arc::clone(&body);
            let cursor = Arc::clone(&cursor);
            handles.push(self.submit(move || loop {
                let index = cursor.fetch_add(1, Ordering::Relaxed);
                if index >= len {
                    break;
                }
                body(index);
            })?);
        }

        for handle in handles {
            handle.join()?;
        }
        Ok(())
    }

    /// Closes the job queue and joins every worker thread.
    ///
    /// Queued jobs still run to completion; new submissions fail.
    pub fn shutdown(&mut self) {
        self.sender.lock().unwrap().take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn submit_returns_task_result() {
        let pool = WorkerPool::with_threads(2);
        let handle = pool.submit(|| 21 * 2).unwrap();
        assert_eq!(handle.join().unwrap(), 42);
    }

    #[test]
    fn parallel_for_visits_every_index_once() {
        let pool = WorkerPool::with_threads(4);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_cl = Arc::clone(&seen);
        pool.parallel_for(1000, move |i| {
            seen_cl.lock().unwrap().push(i);
        })
        .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1000);
        let unique: HashSet<_> = seen.iter().copied().collect();
        assert_eq!(unique.len(), 1000);
    }

    #[test]
    fn parallel_for_empty_range_is_a_noop() {
        let pool = WorkerPool::with_threads(2);
        pool.parallel_for(0, |_| panic!("must not run")).unwrap();
    }

    #[test]
    fn submit_after_shutdown_fails() {
        let mut pool = WorkerPool::with_threads(2);
        pool.shutdown();
        let err = pool.submit(|| ()).unwrap_err();
        assert!(matches!(err, ArchiveError::Pool(_)));
    }

    #[test]
    fn thread_count_has_a_floor_of_one() {
        let pool = WorkerPool::with_threads(0);
        assert_eq!(pool.thread_count(), 1);
    }
}
