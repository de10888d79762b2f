//! Promises settled from the outside.
//!
//! A [`Deferred`] owns the resolve and reject ends of a [`Promise`]. Hand the
//! promise to consumers and settle it later, exactly once.

mod deferred;
mod error;
mod promise;
mod reason;
mod slot;

pub use deferred::{Deferred, DuplicatePolicy};
pub use error::AlreadySettled;
pub use promise::Promise;
pub use reason::{Abandoned, AdoptionCycle, Reason};

/// What a [`Promise`] resolves to.
pub type Outcome<T> = Result<T, Reason>;
