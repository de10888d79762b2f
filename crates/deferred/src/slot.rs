use std::{
    future::Future,
    mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll, Waker},
};

use futures::{
    future::BoxFuture,
    task::{self, ArcWake},
};
use tracing::debug;

use crate::{AdoptionCycle, Outcome, Reason};

// Serializes linking so two slots can never be linked into each other.
static LINKING: Mutex<()> = Mutex::new(());

/// Shared state behind a [`Deferred`](crate::Deferred) and its promises.
///
/// A slot adopting another promise does not wrap it. It becomes a link to
/// the other slot, and readers follow links in a loop, so chains of any
/// length settle without recursion.
pub(crate) struct Slot<T> {
    state: Mutex<State<T>>,
}

enum State<T> {
    Pending(Vec<Waker>),
    Adopting {
        // Taken out while a consumer polls it.
        future: Option<BoxFuture<'static, Outcome<T>>>,
        wakers: Vec<Waker>,
        notified: bool,
    },
    Linked(Arc<Slot<T>>),
    Done(Outcome<T>),
}

enum Step<T> {
    Ready(Outcome<T>),
    Follow(Arc<Slot<T>>),
    Wait,
    Drive(BoxFuture<'static, Outcome<T>>),
}

impl<T> Slot<T> {
    pub(crate) fn pending() -> Self {
        Self {
            state: Mutex::new(State::Pending(Vec::new())),
        }
    }

    pub(crate) fn complete(&self, outcome: Outcome<T>) {
        wake_all(self.transition(State::Done(outcome)));
    }

    pub(crate) fn adopt(&self, future: BoxFuture<'static, Outcome<T>>) {
        wake_all(self.transition(State::Adopting {
            future: Some(future),
            wakers: Vec::new(),
            notified: false,
        }));
    }

    /// Forwards this slot to the end of `target`'s chain. Closing a cycle
    /// rejects with [`AdoptionCycle`] instead.
    pub(crate) fn link(self: &Arc<Self>, target: Arc<Self>) {
        let linking = LINKING.lock().unwrap_or_else(PoisonError::into_inner);

        let root = Self::root(target);
        if Arc::ptr_eq(&root, self) {
            drop(linking);
            debug!("Promise chain adopts itself");
            self.complete(Err(Reason::new(AdoptionCycle)));
            return;
        }

        let wakers = self.transition(State::Linked(root));
        drop(linking);
        wake_all(wakers);
    }

    fn root(mut slot: Arc<Self>) -> Arc<Self> {
        loop {
            let next = match &*slot.lock() {
                State::Linked(next) => Arc::clone(next),
                _ => break,
            };
            slot = next;
        }
        slot
    }

    pub(crate) fn outcome(self: &Arc<Self>) -> Option<Outcome<T>>
    where
        T: Clone,
    {
        match &*Self::root(Arc::clone(self)).lock() {
            State::Done(outcome) => Some(outcome.clone()),
            _ => None,
        }
    }

    /// Replaces a waiting state, handing back the wakers registered on it.
    fn transition(&self, next: State<T>) -> Vec<Waker> {
        let mut state = self.lock();
        let wakers = match &mut *state {
            State::Pending(wakers) | State::Adopting { wakers, .. } => mem::take(wakers),
            State::Linked(_) | State::Done(_) => return Vec::new(),
        };
        *state = next;
        wakers
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn unlink(&mut self) -> Option<Arc<Self>> {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        match mem::replace(state, State::Pending(Vec::new())) {
            State::Linked(next) => Some(next),
            other => {
                *state = other;
                None
            }
        }
    }
}

impl<T> Slot<T>
where
    T: Clone + Send + 'static,
{
    pub(crate) fn poll_outcome(self: &Arc<Self>, cx: &mut Context<'_>) -> Poll<Outcome<T>> {
        let mut slot = Arc::clone(self);

        loop {
            let step = match &mut *slot.lock() {
                State::Done(outcome) => Step::Ready(outcome.clone()),
                State::Linked(next) => Step::Follow(Arc::clone(next)),
                State::Pending(wakers) => {
                    register(wakers, cx.waker());
                    Step::Wait
                }
                State::Adopting {
                    future,
                    wakers,
                    notified,
                } => {
                    register(wakers, cx.waker());
                    match future.take() {
                        Some(future) => {
                            *notified = false;
                            Step::Drive(future)
                        }
                        None => Step::Wait,
                    }
                }
            };

            match step {
                Step::Ready(outcome) => return Poll::Ready(outcome),
                Step::Follow(next) => slot = next,
                Step::Wait => return Poll::Pending,
                Step::Drive(future) => return slot.drive(future),
            }
        }
    }

    fn drive(self: &Arc<Self>, mut future: BoxFuture<'static, Outcome<T>>) -> Poll<Outcome<T>> {
        let waker = task::waker(Arc::clone(self));
        let mut cx = Context::from_waker(&waker);

        loop {
            if let Poll::Ready(outcome) = future.as_mut().poll(&mut cx) {
                wake_all(self.transition(State::Done(outcome.clone())));
                return Poll::Ready(outcome);
            }

            let mut state = self.lock();
            if let State::Adopting {
                future: parked,
                notified,
                ..
            } = &mut *state
            {
                // Woken while we held the future: nobody else will poll it.
                if mem::take(notified) {
                    continue;
                }
                *parked = Some(future);
            }

            return Poll::Pending;
        }
    }
}

impl<T> ArcWake for Slot<T>
where
    T: Send,
{
    fn wake_by_ref(arc_self: &Arc<Self>) {
        let wakers = match &mut *arc_self.lock() {
            State::Adopting {
                wakers, notified, ..
            } => {
                *notified = true;
                mem::take(wakers)
            }
            State::Pending(wakers) => mem::take(wakers),
            State::Linked(_) | State::Done(_) => Vec::new(),
        };
        wake_all(wakers);
    }
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        let mut next = self.unlink();
        while let Some(slot) = next {
            next = Arc::try_unwrap(slot).ok().and_then(|mut slot| slot.unlink());
        }
    }
}

fn register(wakers: &mut Vec<Waker>, waker: &Waker) {
    if !wakers.iter().any(|known| known.will_wake(waker)) {
        wakers.push(waker.clone());
    }
}

fn wake_all(wakers: Vec<Waker>) {
    wakers.into_iter().for_each(Waker::wake);
}
