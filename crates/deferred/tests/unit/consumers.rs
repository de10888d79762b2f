use std::{cell::RefCell, rc::Rc};

use deferred::{Deferred, DuplicatePolicy};
use futures::{future, FutureExt};
use rand::{seq::SliceRandom, Rng};

use crate::helpers::{outcome, setup_tracing};

#[test]
fn every_clone_sees_outcome() {
    setup_tracing();
    let deferred = Deferred::<i32>::new();
    let seen = Rc::new(RefCell::new(Vec::new()));

    for _ in 0..10 {
        let promise = deferred.promise();
        let seen = seen.clone();
        deferred_executor::spawn(async move {
            seen.borrow_mut().push(promise.await.unwrap());
        });
    }

    deferred_executor::run();
    assert!(seen.borrow().is_empty());

    deferred.resolve(42).unwrap();
    deferred_executor::run();

    assert_eq!(*seen.borrow(), vec![42; 10]);
}

#[test]
fn outcome_peek() {
    setup_tracing();
    let deferred = Deferred::<i32>::new();
    let promise = deferred.promise();

    assert!(promise.outcome().is_none());
    assert_eq!(format!("{promise:?}"), "Promise { outcome: None }");

    deferred.resolve(3).unwrap();

    assert_eq!(promise.outcome().unwrap().unwrap(), 3);
    assert_eq!(
        format!("{promise:?}"),
        "Promise { outcome: Some(Ok(3)) }"
    );
}

#[test]
fn outcome_peek_through_link() {
    setup_tracing();
    let inner = Deferred::<i32>::new();
    let outer = Deferred::<i32>::new();

    outer.resolve_with(inner.promise()).unwrap();
    assert!(outer.promise().outcome().is_none());

    inner.reject("late").unwrap();

    let reason = outer.promise().outcome().unwrap().unwrap_err();
    assert_eq!(reason.to_string(), "late");
}

#[test]
fn fused() {
    setup_tracing();
    let deferred = Deferred::<i32>::new();
    let mut promise = deferred.promise();

    assert!(!futures::future::FusedFuture::is_terminated(&promise));

    deferred.resolve(5).unwrap();
    assert_eq!((&mut promise).now_or_never().unwrap().unwrap(), 5);

    assert!(futures::future::FusedFuture::is_terminated(&promise));
}

#[derive(Debug, Clone, Copy)]
enum Attempt {
    Resolve(u32),
    Reject(u32),
    Adopt(u32),
}

fn apply(deferred: &Deferred<u32>, attempt: Attempt) -> bool {
    match attempt {
        Attempt::Resolve(value) => deferred.resolve(value).is_ok(),
        Attempt::Reject(value) => deferred.reject(value).is_ok(),
        Attempt::Adopt(value) => deferred.resolve_with(future::ok(value)).is_ok(),
    }
}

#[test]
fn first_attempt_wins() {
    setup_tracing();
    let mut rng = rand::rng();

    for _ in 0..100 {
        let mut attempts: Vec<Attempt> = (0..8)
            .map(|i| match rng.random_range(0..3) {
                0 => Attempt::Resolve(i),
                1 => Attempt::Reject(i),
                _ => Attempt::Adopt(i),
            })
            .collect();
        attempts.shuffle(&mut rng);

        let ignore = rng.random_bool(0.5);
        let deferred = Deferred::with_policy(DuplicatePolicy::from_ignore(ignore));

        let accepted: Vec<bool> = attempts.iter().map(|a| apply(&deferred, *a)).collect();

        assert!(accepted[0]);
        assert!(accepted[1..].iter().all(|ok| *ok == ignore));
        assert!(deferred.is_settled());

        match (attempts[0], outcome(deferred.promise())) {
            (Attempt::Resolve(value) | Attempt::Adopt(value), Ok(got)) => assert_eq!(got, value),
            (Attempt::Reject(value), Err(reason)) => {
                assert_eq!(reason.downcast_ref::<u32>(), Some(&value))
            }
            (attempt, got) => panic!("{attempt:?} produced {got:?}"),
        }
    }
}
