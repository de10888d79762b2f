use deferred::{Deferred, Outcome, Reason};
use tracing::{info, warn};

fn main() -> Outcome<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let lookup = Deferred::<u16>::new();
    let port = Deferred::<u16>::ignoring_duplicates();

    port.resolve_with(lookup.promise())?;
    port.reject(Reason::new("fallback"))?;

    let consumer = deferred_executor::spawn({
        let port = port.promise();
        async move { port.await }
    });

    deferred_executor::spawn(async move {
        info!("Lookup finished");
        if lookup.resolve(8080).is_err() {
            warn!("Lookup settled twice");
        }
    });

    let port = deferred_executor::block_on(consumer)
        .unwrap_or_else(|| Err(Reason::unspecified()))?;
    info!(port, "Resolved through chain");

    Ok(())
}
