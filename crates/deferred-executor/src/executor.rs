use std::future::Future;

use futures::channel::oneshot;
use tracing::debug;

use crate::{join::JoinHandle, task::TaskQueue};

/// Single-threaded cooperative executor.
///
/// Tasks run until they yield; nothing is preempted. Futures never leave
/// the executor's thread, but their wakers may be used from any thread.
/// There is no reactor: once no task can make progress, [`Executor::run`]
/// returns.
pub struct Executor {
    queue: TaskQueue,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    pub fn new() -> Self {
        Self {
            queue: TaskQueue::new(),
        }
    }

    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
    {
        let (sender, receiver) = oneshot::channel();

        self.queue.schedule(async move {
            let _ = sender.send(future.await);
        });

        JoinHandle::new(receiver)
    }

    /// Runs `future` to completion, parking the thread while every live
    /// task waits on a wake-up from elsewhere, e.g. another thread.
    ///
    /// Panics if `future` is stuck and no waker for any task is held
    /// outside the executor.
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: Future + 'static,
    {
        let mut handle = self.spawn(future);

        loop {
            self.run();

            if let Some(output) = handle.try_join() {
                return output;
            }

            assert!(
                self.queue.wakeable(),
                "Failed to complete future. Deadlock maybe?"
            );

            debug!("Waiting for a wake-up");
            self.queue.wait();
        }
    }

    /// Like [`Executor::block_on`], but returns `None` instead of waiting
    /// once no task can make progress.
    pub fn try_block_on<F>(&self, future: F) -> Option<F::Output>
    where
        F: Future + 'static,
    {
        let mut handle = self.spawn(future);

        self.run();

        handle.try_join()
    }

    pub fn run(&self) {
        while !self.queue.is_done() {
            debug!("Executing tasks");

            if self.queue.poll_woken() == 0 {
                debug!(stalled = self.queue.len(), "No task can make progress");
                break;
            }
        }
    }
}
