use thiserror::Error;

/// Returned when settling a [`Deferred`](crate::Deferred) that has already
/// been resolved or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deferred is already settled")]
pub struct AlreadySettled;

impl From<AlreadySettled> for crate::Reason {
    fn from(err: AlreadySettled) -> Self {
        crate::Reason::new(err)
    }
}
