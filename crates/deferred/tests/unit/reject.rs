use deferred::{Abandoned, AlreadySettled, Deferred, DuplicatePolicy, Reason};

use crate::helpers::{rejection, setup_tracing};

#[test]
fn reason() {
    setup_tracing();
    let deferred = Deferred::<i32>::new();
    let promise = deferred.promise();

    deferred.reject(42).unwrap();

    assert!(deferred.is_settled());
    assert_eq!(rejection(promise).downcast_ref::<i32>(), Some(&42));
}

#[test]
fn unspecified() {
    setup_tracing();
    let deferred = Deferred::<i32>::new();

    deferred.reject(()).unwrap();

    assert!(rejection(deferred.promise()).is_unspecified());
}

#[test]
fn error_payload() {
    setup_tracing();
    let deferred = Deferred::<String>::new();

    let err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "peer went away");
    deferred.reject(err).unwrap();

    let reason = rejection(deferred.promise());
    let err = reason.downcast_ref::<std::io::Error>().unwrap();
    assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
}

#[test]
fn settle_err() {
    setup_tracing();
    let deferred = Deferred::<i32>::new();

    deferred.settle(Err(Reason::new("nope"))).unwrap();

    let reason = rejection(deferred.promise());
    assert!(reason.is::<&'static str>());
    assert_eq!(reason.to_string(), "nope");
}

#[test]
fn twice_fails() {
    setup_tracing();
    let deferred = Deferred::<i32>::new();
    let promise = deferred.promise();

    deferred.reject(42).unwrap();

    assert_eq!(deferred.reject(1337), Err(AlreadySettled));
    assert_eq!(rejection(promise).downcast_ref::<i32>(), Some(&42));
}

#[test]
fn after_resolve_fails() {
    setup_tracing();
    let deferred = Deferred::<i32>::new();

    deferred.resolve(42).unwrap();

    assert_eq!(deferred.reject(1337), Err(AlreadySettled));
    assert_eq!(crate::helpers::outcome(deferred.promise()).unwrap(), 42);
}

#[test]
fn after_resolve_ignored() {
    setup_tracing();
    let deferred = Deferred::<i32>::with_policy(DuplicatePolicy::from_ignore(true));

    deferred.resolve(42).unwrap();
    deferred.reject(1337).unwrap();

    assert_eq!(crate::helpers::outcome(deferred.promise()).unwrap(), 42);
}

#[test]
fn twice_ignored() {
    setup_tracing();
    let deferred = Deferred::<i32>::ignoring_duplicates();

    deferred.reject(42).unwrap();
    deferred.reject(1337).unwrap();

    assert_eq!(rejection(deferred.promise()).downcast_ref::<i32>(), Some(&42));
}

#[test]
fn abandoned() {
    setup_tracing();
    let deferred = Deferred::<i32>::new();
    let promise = deferred.promise();

    drop(deferred);

    let reason = rejection(promise);
    assert!(reason.is::<Abandoned>());
}

#[test]
fn abandoned_while_awaited() {
    setup_tracing();
    let deferred = Deferred::<i32>::new();
    let promise = deferred.promise();

    let waiting = deferred_executor::spawn(async move { promise.await });

    deferred_executor::spawn(async move {
        drop(deferred);
    });

    let outcome = deferred_executor::block_on(waiting).unwrap();
    assert_eq!(
        outcome.unwrap_err().downcast_ref::<Abandoned>(),
        Some(&Abandoned)
    );
}
