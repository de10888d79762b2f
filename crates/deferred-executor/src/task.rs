use std::{
    cell::RefCell,
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    task::{Context, Poll},
};

use flume::{Receiver, Sender};
use futures::{
    future::{FutureExt, LocalBoxFuture},
    task::{waker_ref, ArcWake},
};
use slab::Slab;
use tracing::trace;

/// Wake side of a task. Only the id crosses threads; the future stays in
/// the queue that spawned it.
pub struct TaskHandle {
    id: usize,
    scheduled: AtomicBool,
    queue: Sender<usize>,
}

impl TaskHandle {
    fn schedule(&self) {
        if self.scheduled.swap(true, Ordering::AcqRel) {
            return;
        }

        if self.queue.send(self.id).is_err() {
            trace!(task = self.id, "Executor gone, task not scheduled");
        }
    }
}

impl ArcWake for TaskHandle {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.schedule();
    }
}

struct Task {
    handle: Arc<TaskHandle>,
    // Taken out while the task is being polled.
    future: Option<LocalBoxFuture<'static, ()>>,
}

pub struct TaskQueue {
    tasks: RefCell<Slab<Task>>,
    sender: Sender<usize>,
    receiver: Receiver<usize>,
}

impl TaskQueue {
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            tasks: RefCell::new(Slab::new()),
            sender,
            receiver,
        }
    }

    pub fn schedule<F>(&self, future: F)
    where
        F: Future<Output = ()> + 'static,
    {
        let handle = {
            let mut tasks = self.tasks.borrow_mut();
            let entry = tasks.vacant_entry();

            let handle = Arc::new(TaskHandle {
                id: entry.key(),
                scheduled: AtomicBool::new(false),
                queue: self.sender.clone(),
            });

            entry.insert(Task {
                handle: Arc::clone(&handle),
                future: Some(future.boxed_local()),
            });

            handle
        };

        handle.schedule();
    }

    /// Polls every task woken so far, including those woken along the way.
    pub fn poll_woken(&self) -> usize {
        let mut polled = 0;
        while let Ok(id) = self.receiver.try_recv() {
            if self.poll(id) {
                polled += 1;
            }
        }
        polled
    }

    /// Blocks the thread until some task is woken, then polls it.
    pub fn wait(&self) {
        if let Ok(id) = self.receiver.recv() {
            self.poll(id);
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_done(&self) -> bool {
        self.len() == 0
    }

    /// Whether some live task has a waker held outside the queue.
    pub fn wakeable(&self) -> bool {
        self.tasks
            .borrow()
            .iter()
            .any(|(_, task)| Arc::strong_count(&task.handle) > 1)
    }

    fn poll(&self, id: usize) -> bool {
        let taken = self
            .tasks
            .borrow_mut()
            .get_mut(id)
            .and_then(|task| Some((Arc::clone(&task.handle), task.future.take()?)));

        let Some((handle, mut future)) = taken else {
            return false;
        };

        trace!(task = id, "Polling task");
        handle.scheduled.store(false, Ordering::Release);

        let waker = waker_ref(&handle);
        let mut cx = Context::from_waker(&waker);

        match future.as_mut().poll(&mut cx) {
            Poll::Ready(()) => {
                trace!(task = id, "Task finished");
                self.tasks.borrow_mut().remove(id);
            }
            Poll::Pending => {
                if let Some(task) = self.tasks.borrow_mut().get_mut(id) {
                    task.future = Some(future);
                }
            }
        }

        true
    }
}
