use std::{any::Any, fmt, sync::Arc};

/// Type-erased payload a [`Promise`](crate::Promise) is rejected with.
///
/// Any `Send + Sync` value can be used as a reason. Clones share the same
/// payload, so every consumer of a promise sees the exact same value.
#[derive(Clone)]
pub struct Reason {
    payload: Arc<dyn Any + Send + Sync>,
}

/// Payload of the reason seen by consumers when a
/// [`Deferred`](crate::Deferred) is dropped without being settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abandoned;

/// Payload of the reason a promise is rejected with when it ends up
/// adopting itself, directly or through a chain of other promises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdoptionCycle;

struct Unspecified;

impl Reason {
    pub fn new<R>(reason: R) -> Self
    where
        R: Any + Send + Sync,
    {
        let boxed: Box<dyn Any + Send + Sync> = Box::new(reason);
        match boxed.downcast::<Reason>() {
            Ok(reason) => *reason,
            Err(boxed) => Self {
                payload: Arc::from(boxed),
            },
        }
    }

    /// Reason for rejecting without saying why.
    pub fn unspecified() -> Self {
        Self::new(Unspecified)
    }

    pub fn is<R: Any>(&self) -> bool {
        self.payload.is::<R>()
    }

    pub fn downcast_ref<R: Any>(&self) -> Option<&R> {
        self.payload.downcast_ref::<R>()
    }

    pub fn is_unspecified(&self) -> bool {
        self.is::<Unspecified>() || self.is::<()>()
    }

    fn as_str(&self) -> Option<&str> {
        self.downcast_ref::<&'static str>()
            .copied()
            .or_else(|| self.downcast_ref::<String>().map(String::as_str))
    }
}

impl Default for Reason {
    fn default() -> Self {
        Self::unspecified()
    }
}

impl fmt::Debug for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(text) => f.debug_tuple("Reason").field(&text).finish(),
            None if self.is_unspecified() => f.write_str("Reason(unspecified)"),
            None if self.is::<Abandoned>() => f.write_str("Reason(Abandoned)"),
            None if self.is::<AdoptionCycle>() => f.write_str("Reason(AdoptionCycle)"),
            None => f.write_str("Reason(..)"),
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(text) => f.write_str(text),
            None if self.is_unspecified() => f.write_str("unspecified"),
            None if self.is::<Abandoned>() => f.write_str("deferred dropped before settling"),
            None if self.is::<AdoptionCycle>() => f.write_str("promise adopts itself"),
            None => f.write_str("rejected with an opaque reason"),
        }
    }
}

impl std::error::Error for Reason {}
