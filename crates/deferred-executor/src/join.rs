use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use futures::{channel::oneshot::Receiver, FutureExt};

/// Output of a spawned task. Yields `None` if the task never finished.
pub struct JoinHandle<T> {
    receiver: Receiver<T>,
}

impl<T> JoinHandle<T> {
    pub(crate) fn new(receiver: Receiver<T>) -> Self {
        Self { receiver }
    }

    pub fn try_join(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()?
    }

    pub async fn join(self) -> Option<T> {
        self.await
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = Option<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::into_inner(self)
            .receiver
            .poll_unpin(cx)
            .map(Result::ok)
    }
}
