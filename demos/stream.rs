//! # Example: stream
//!
//! Consumes the raw event stream and prints the first creates it sees.
//!
//! Shows how to:
//! - Configure collection filters through [`Config`].
//! - Attach a closure observer with [`ObserveFn`].
//! - Read [`Jetstream::stream`] until a limit or Ctrl-C, then shut down.
//!
//! ## Flow
//! ```text
//! JetstreamBuilder::build()
//!     ├─► ConnectionSupervisor ──► connect ──► read loop ──► Mailbox
//!     └─► ObserverSet ──► ObserveFn (connection events)
//! main: stream().next() ──► filter CommitCreate ──► println
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example stream
//! ```

use std::sync::Arc;

use futures::StreamExt;
use jetstream::{
    Config, Jetstream, JetstreamBuilder, JetstreamMessage, ObserveFn, RuntimeEvent,
    RuntimeEventKind,
};
use tracing_subscriber::EnvFilter;

const LIMIT: usize = 10;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = Config {
        wanted_collections: vec!["app.bsky.feed.post".into(), "app.bsky.feed.like".into()],
        ..Config::default()
    };

    let connections = ObserveFn::arc("connections", |ev: &RuntimeEvent| match &ev.kind {
        RuntimeEventKind::ConnectionOpened { url } => println!("[obs] connected to {url}"),
        RuntimeEventKind::ConnectionClosed { reason, cause } => println!(
            "[obs] disconnected: {reason} {}",
            cause.as_deref().unwrap_or("")
        ),
        _ => {}
    });

    let client: Jetstream = JetstreamBuilder::new(cfg)
        .with_observer(connections)
        .build()?;
    let client = Arc::new(client);

    let reader = {
        let client = Arc::clone(&client);
        async move {
            let mut seen = 0;
            let mut events = client.stream();
            while let Some(event) = events.next().await {
                if let JetstreamMessage::CommitCreate(e) = event? {
                    println!("New {}: {}", e.commit.collection, e.commit.rkey);
                    seen += 1;
                    if seen == LIMIT {
                        break;
                    }
                }
            }
            Ok::<_, jetstream::JetstreamError>(())
        }
    };

    tokio::select! {
        res = reader => res?,
        _ = tokio::signal::ctrl_c() => println!("interrupted"),
    }

    client.shutdown().await;
    println!("Done!");
    Ok(())
}
