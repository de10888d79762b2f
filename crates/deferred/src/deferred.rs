use std::{
    any::Any,
    fmt,
    future::IntoFuture,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use futures::FutureExt;
use tracing::{debug, trace};

use crate::{slot::Slot, Abandoned, AlreadySettled, Outcome, Promise, Reason};

/// What happens when a settled [`Deferred`] is settled again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail with [`AlreadySettled`].
    #[default]
    Error,
    /// Drop the attempt silently, keeping the first outcome.
    Ignore,
}

impl DuplicatePolicy {
    pub fn from_ignore(ignore: bool) -> Self {
        if ignore {
            Self::Ignore
        } else {
            Self::Error
        }
    }
}

/// A promise whose resolve and reject handles live on the outside.
///
/// ```
/// let deferred = deferred::Deferred::<i32>::new();
/// let promise = deferred.promise();
///
/// deferred.resolve(42).unwrap();
/// assert!(deferred.is_settled());
/// assert_eq!(futures::executor::block_on(promise).unwrap(), 42);
/// ```
///
/// Settling takes `&self`, so a deferred can be shared behind an `Arc`.
/// Only the first settle call has any effect. Dropping a deferred that was
/// never settled rejects its promise with [`Abandoned`].
pub struct Deferred<T = ()> {
    slot: Arc<Slot<T>>,
    settled: AtomicBool,
    policy: DuplicatePolicy,
}

impl<T> Deferred<T>
where
    T: Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::with_policy(DuplicatePolicy::Error)
    }

    pub fn ignoring_duplicates() -> Self {
        Self::with_policy(DuplicatePolicy::Ignore)
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            slot: Arc::new(Slot::pending()),
            settled: AtomicBool::new(false),
            policy,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Handle for consumers. Awaiting it yields the settled outcome.
    pub fn promise(&self) -> Promise<T> {
        Promise::new(Arc::clone(&self.slot))
    }

    pub fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    pub fn resolve(&self, value: T) -> Result<(), AlreadySettled> {
        self.settle_with("resolve", |slot| slot.complete(Ok(value)))
    }

    /// Resolves with `T::default()`, e.g. `()` for a `Deferred<()>`.
    pub fn resolve_default(&self) -> Result<(), AlreadySettled>
    where
        T: Default,
    {
        self.resolve(T::default())
    }

    /// Resolves with another future, adopting its outcome once it completes.
    ///
    /// The deferred counts as settled immediately. Adopting a [`Promise`]
    /// links to it, so chains of any length settle in constant stack, and a
    /// chain that leads back here is rejected with
    /// [`AdoptionCycle`](crate::AdoptionCycle). Any other future is driven
    /// by whichever consumer polls the promise.
    pub fn resolve_with<F>(&self, future: F) -> Result<(), AlreadySettled>
    where
        F: IntoFuture<Output = Outcome<T>>,
        F::IntoFuture: Send + 'static,
    {
        let mut future = Some(future.into_future());
        let promise = (&mut future as &mut dyn Any)
            .downcast_mut::<Option<Promise<T>>>()
            .and_then(Option::take);

        self.settle_with("resolve_with", |slot| match (promise, future) {
            (Some(promise), _) => slot.link(promise.into_slot()),
            (None, Some(future)) => slot.adopt(future.boxed()),
            (None, None) => {}
        })
    }

    /// Rejects with any payload. Use `()` or [`Reason::unspecified`] when
    /// there is nothing to report.
    pub fn reject<R>(&self, reason: R) -> Result<(), AlreadySettled>
    where
        R: Any + Send + Sync,
    {
        self.settle_with("reject", |slot| slot.complete(Err(Reason::new(reason))))
    }

    pub fn settle(&self, outcome: Outcome<T>) -> Result<(), AlreadySettled> {
        match outcome {
            Ok(value) => self.resolve(value),
            Err(reason) => self.reject(reason),
        }
    }

    fn settle_with<F>(&self, op: &'static str, apply: F) -> Result<(), AlreadySettled>
    where
        F: FnOnce(&Arc<Slot<T>>),
    {
        if !self.mark_settled(op)? {
            return Ok(());
        }

        debug!(op, "Settling deferred");
        apply(&self.slot);
        Ok(())
    }

    /// Flips the settled flag. True only for the first caller.
    fn mark_settled(&self, op: &'static str) -> Result<bool, AlreadySettled> {
        if !self.settled.swap(true, Ordering::AcqRel) {
            return Ok(true);
        }

        match self.policy {
            DuplicatePolicy::Ignore => {
                trace!(op, "Ignoring duplicate settle");
                Ok(false)
            }
            DuplicatePolicy::Error => Err(AlreadySettled),
        }
    }
}

impl<T> Default for Deferred<T>
where
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Deferred<T> {
    fn drop(&mut self) {
        if !*self.settled.get_mut() {
            debug!("Deferred dropped before settling");
            self.slot.complete(Err(Reason::new(Abandoned)));
        }
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.settled.load(Ordering::Acquire))
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
