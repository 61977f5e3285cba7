//! # Example: client
//!
//! Dispatches typed records to per-collection handlers.
//!
//! Shows how to:
//! - Register typed handlers with [`JetstreamClient::on_create`].
//! - Attach the built-in [`LogWriter`] observer.
//! - Narrow the subscription at runtime with [`Jetstream::update_options`].
//!
//! ## Run
//! Requires the `logging` feature to export [`LogWriter`].
//! ```bash
//! RUST_LOG=info cargo run --example client --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use jetstream::records::{Like, Post};
use jetstream::{
    Config, EventKind, Jetstream, JetstreamBuilder, JetstreamClient, LogWriter, OptionsUpdate,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = Config {
        wanted_collections: vec!["app.bsky.feed.post".into(), "app.bsky.feed.like".into()],
        ..Config::default()
    };
    let jetstream: Jetstream = JetstreamBuilder::new(cfg)
        .with_observer(Arc::new(LogWriter))
        .build()?;
    let jetstream = Arc::new(jetstream);

    let mut client = JetstreamClient::new(Arc::clone(&jetstream));
    client
        .on_create::<Post, _, _>(|post| async move {
            let text: String = post.record.text.chars().take(50).collect();
            println!("New post from {}: {text}", post.did);
            Ok(())
        })
        .on_create::<Like, _, _>(|like| async move {
            println!("{} liked {}", like.did, like.record.subject.uri);
            Ok(())
        })
        .on(EventKind::Account, |event| async move {
            println!("account event for {}", event.did());
            Ok(())
        });

    // After a minute, keep only posts.
    let narrow = {
        let jetstream = Arc::clone(&jetstream);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            let update = OptionsUpdate::default().with_collections(["app.bsky.feed.post"]);
            if let Err(e) = jetstream.update_options(update).await {
                eprintln!("options update failed: {e}");
            }
        })
    };

    tokio::select! {
        res = client.run() => res?,
        _ = tokio::signal::ctrl_c() => println!("interrupted"),
    }

    narrow.abort();
    jetstream.shutdown().await;
    Ok(())
}
