mod executor;
mod join;
mod task;

use std::future::Future;

pub use executor::Executor;
pub use join::JoinHandle;

thread_local! {
    static EXECUTOR: Executor = Executor::new();
}

pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + 'static,
{
    EXECUTOR.with(|exe| exe.spawn(future))
}

pub fn block_on<F>(future: F) -> F::Output
where
    F: Future + 'static,
{
    EXECUTOR.with(|exe| exe.block_on(future))
}

pub fn run() {
    EXECUTOR.with(Executor::run)
}
