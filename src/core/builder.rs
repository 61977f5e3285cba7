use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use super::{
    connection::Shared,
    jetstream::Jetstream,
    mailbox::Mailbox,
    outbound::{Encoder, Outbound},
    supervisor::{ConnectionSupervisor, SupervisorParams},
};
use crate::{
    core::Config,
    error::{ConnectionError, JetstreamError, ParseError},
    message::{FrameDecoder, SubscriberSourcedMessage},
    observers::{Observe, ObserverSet},
    transport::{Connect, WebSocketConnector, build_url},
};

/// Builder for a [`Jetstream`] client.
///
/// ```no_run
/// # async fn demo() -> Result<(), jetstream::JetstreamError> {
/// use jetstream::{Config, JetstreamBuilder};
///
/// let cfg = Config {
///     wanted_collections: vec!["app.bsky.feed.post".into()],
///     ..Config::default()
/// };
/// let client = JetstreamBuilder::new(cfg).build()?;
/// # client.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct JetstreamBuilder {
    cfg: Config,
    observers: Vec<Arc<dyn Observe>>,
    decoder: Option<FrameDecoder>,
    connector: Option<Arc<dyn Connect>>,
    encoder: Encoder,
}

impl JetstreamBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            observers: Vec::new(),
            decoder: None,
            connector: None,
            encoder: SubscriberSourcedMessage::encode,
        }
    }

    /// Sets runtime observers.
    ///
    /// Observers receive every [`RuntimeEvent`](crate::RuntimeEvent) through
    /// dedicated workers with bounded queues.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Adds one runtime observer.
    pub fn with_observer(mut self, observer: Arc<dyn Observe>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Sets the transform applied to binary frames when `compress` is enabled
    /// (typically zstd decompression with the Jetstream dictionary).
    pub fn with_decoder(mut self, decoder: FrameDecoder) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Replaces the transport (defaults to [`WebSocketConnector`]).
    pub fn with_connector(mut self, connector: Arc<dyn Connect>) -> Self {
        self.connector = Some(connector);
        self
    }

    #[cfg(test)]
    pub(crate) fn with_encoder(mut self, encoder: Encoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Validates the configuration and starts the connection supervisor.
    ///
    /// Fails before any connection attempt if:
    /// - the subscription exceeds server limits (`SubscriptionError`)
    /// - `compress` is set without a decoder (`ParseError`)
    /// - the endpoint is not a valid URL (`ConnectionError::Connect`)
    ///
    /// Must be called inside a Tokio runtime.
    pub fn build(self) -> Result<Jetstream, JetstreamError> {
        self.cfg.validate()?;

        let decoder = match (self.cfg.compress, self.decoder) {
            (false, Some(_)) => {
                warn!("frame decoder configured without compress; it will not be used");
                None
            }
            (false, None) => None,
            (true, Some(decoder)) => Some(decoder),
            (true, None) => {
                return Err(ParseError::new(
                    "Jetstream compression requires a frame decoder; none is built in",
                )
                .into());
            }
        };
        let url = build_url(&self.cfg)?;

        let mailbox = Arc::new(Mailbox::new(
            self.cfg.inbound_capacity(),
            self.cfg.inbound_buffer_strategy,
        ));
        let shared = Arc::new(Shared {
            mailbox: Arc::clone(&mailbox),
            outbound: Outbound::with_encoder(self.cfg.outbound_capacity(), self.encoder),
            observers: ObserverSet::new(self.observers),
            decoder,
        });

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WebSocketConnector));
        let supervisor = ConnectionSupervisor::new(
            Arc::clone(&shared),
            connector,
            SupervisorParams {
                url,
                connect_timeout: self.cfg.connect_timeout(),
                backoff: self.cfg.backoff,
            },
        );

        let runtime_token = CancellationToken::new();
        let token = runtime_token.clone();
        let task = tokio::spawn(async move {
            if let Err(panic) = AssertUnwindSafe(supervisor.run(token)).catch_unwind().await {
                error!(panic = ?panic, "connection supervisor panicked");
                mailbox.fail(ConnectionError::closed("connection supervisor panicked").into());
            }
        });

        Ok(Jetstream::new_internal(shared, runtime_token, task))
    }
}
