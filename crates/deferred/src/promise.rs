use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::future::FusedFuture;

use crate::{slot::Slot, Outcome};

/// Read side of a [`Deferred`](crate::Deferred).
///
/// Resolves to the outcome of the first settle call. Clones can be handed
/// to any number of consumers; all of them observe the same outcome and
/// none of them can settle it.
pub struct Promise<T> {
    slot: Arc<Slot<T>>,
    terminated: bool,
}

impl<T> Promise<T> {
    pub(crate) fn new(slot: Arc<Slot<T>>) -> Self {
        Self {
            slot,
            terminated: false,
        }
    }

    pub(crate) fn into_slot(self) -> Arc<Slot<T>> {
        self.slot
    }
}

impl<T: Clone> Promise<T> {
    /// The outcome, if the chain behind this promise has settled with a
    /// value or a reason. Never polls.
    pub fn outcome(&self) -> Option<Outcome<T>> {
        self.slot.outcome()
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.slot))
    }
}

impl<T> Future for Promise<T>
where
    T: Clone + Send + 'static,
{
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = Pin::into_inner(self);
        let poll = this.slot.poll_outcome(cx);
        this.terminated |= poll.is_ready();
        poll
    }
}

impl<T> FusedFuture for Promise<T>
where
    T: Clone + Send + 'static,
{
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl<T> fmt::Debug for Promise<T>
where
    T: Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("outcome", &self.outcome())
            .finish()
    }
}
