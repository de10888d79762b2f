use std::rc::Rc;

use deferred::{Deferred, Outcome};
use futures::future::join_all;
use tracing::info;

fn main() -> Outcome<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    deferred_executor::block_on(run())
}

async fn run() -> Outcome<()> {
    let config = Rc::new(Deferred::<String>::new());

    let workers: Vec<_> = (0..3)
        .map(|id| {
            let config = config.promise();
            deferred_executor::spawn(async move {
                let config = config.await?;
                info!(id, %config, "Worker configured");
                Outcome::Ok(config.len())
            })
        })
        .collect();

    let loader = config.clone();
    deferred_executor::spawn(async move {
        info!("Loading config");
        if let Err(err) = loader.resolve(String::from("workers=3")) {
            info!(%err, "Config already loaded");
        }
    });

    for joined in join_all(workers).await {
        let len = joined.unwrap_or(Ok(0))?;
        info!(len, "Worker done");
    }

    // Second load is a programmer error and is reported, not applied.
    if let Err(err) = config.resolve(String::from("workers=4")) {
        info!(%err, "Rejected second load");
    }

    Ok(())
}
