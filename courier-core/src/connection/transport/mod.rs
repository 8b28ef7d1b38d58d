//! `transport` delivers sealed envelopes to the partner's selected endpoint
//!
//! The strategy is chosen once from the connection's [`TransportProtocol`]:
//! a persistent websocket for `ws`/`wss`, a stateless POST for `http`/`https`
//! and a driver that refuses every send for anything else.
//!
//! Every driver shares the same [`InboundRouter`], which is the only way
//! inbound envelopes reach the caller's [`InboundHandler`].
use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::{debug, error, warn};
use rst_common::with_tokio::tokio::sync::RwLock;

use crate::config::Transport;

use super::codec::EnvelopeCodec;
use super::types::{ConnectionError, ConnectionID, ErrorReporter, InboundHandler, TransportProtocol};

mod http;
mod socket;
mod unsupported;

pub use http::{HttpDriver, HTTP_CONTENT_TYPE};
pub use socket::SocketDriver;
pub use unsupported::UnsupportedDriver;

/// `TransportDriver` is the delivery strategy used by a connection
#[async_trait]
pub trait TransportDriver: Send + Sync {
    async fn send(&self, packed: Vec<u8>) -> Result<(), ConnectionError>;

    /// `needs_return_route_poll` tells whether replies only come back on the
    /// response of an outbound request
    fn needs_return_route_poll(&self) -> bool;

    async fn close(&self);
}

/// `InboundRouter` opens inbound envelopes and hands the messages to the
/// current inbound handler
pub struct InboundRouter {
    connection_id: ConnectionID,
    codec: EnvelopeCodec,
    handler: RwLock<Option<Arc<dyn InboundHandler>>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl InboundRouter {
    pub fn new(
        connection_id: ConnectionID,
        codec: EnvelopeCodec,
        handler: Option<Arc<dyn InboundHandler>>,
        reporter: Option<Arc<dyn ErrorReporter>>,
    ) -> Self {
        Self {
            connection_id,
            codec,
            handler: RwLock::new(handler),
            reporter,
        }
    }

    pub fn codec(&self) -> &EnvelopeCodec {
        &self.codec
    }

    pub async fn set_handler(&self, handler: Arc<dyn InboundHandler>) {
        let mut current = self.handler.write().await;
        *current = Some(handler);
    }

    pub async fn has_handler(&self) -> bool {
        self.handler.read().await.is_some()
    }

    /// `route` opens a packed envelope and delivers it, errors are returned as is
    pub async fn route(&self, packed: &[u8]) -> Result<(), ConnectionError> {
        let message = self.codec.open(packed).await?;

        // the lock is released before the handler runs
        let handler = self.handler.read().await.clone();
        match handler {
            Some(handler) => {
                debug!(
                    "[inbound] delivering message: {:?} | connection: {}",
                    message.get_id(),
                    self.connection_id
                );
                handler.handle(message).await
            }
            None => warn!(
                "[inbound] no inbound handler, message dropped | connection: {}",
                self.connection_id
            ),
        }

        Ok(())
    }

    /// `route_logged` is used by background paths, a failing envelope never
    /// stops the caller
    pub async fn route_logged(&self, packed: &[u8]) {
        if let Err(err) = self.route(packed).await {
            error!(
                "[inbound] failed to process inbound envelope: {} | connection: {}",
                err, self.connection_id
            );
            self.report(&err);
        }
    }

    pub fn report(&self, err: &ConnectionError) {
        if let Some(reporter) = &self.reporter {
            reporter.report(&self.connection_id, err);
        }
    }
}

/// `build_driver` picks the transport strategy for a protocol
pub fn build_driver(
    protocol: &TransportProtocol,
    endpoint: &str,
    router: Arc<InboundRouter>,
    config: &Transport,
) -> Result<Box<dyn TransportDriver>, ConnectionError> {
    match protocol {
        TransportProtocol::Ws | TransportProtocol::Wss => Ok(Box::new(SocketDriver::new(
            endpoint,
            router,
            config.get_socket_connect_timeout(),
            config.get_socket_write_timeout(),
        ))),
        TransportProtocol::Http | TransportProtocol::Https => Ok(Box::new(HttpDriver::new(
            endpoint,
            router,
            config.get_http_timeout(),
        )?)),
        TransportProtocol::Unsupported(scheme) => Ok(Box::new(UnsupportedDriver::new(scheme))),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    use mockall::mock;
    use rst_common::standard::serde_json::json;
    use rst_common::with_tokio::tokio;

    use crate::connection::message::Message;
    use crate::crypto::{CipherHandle, X25519Cipher};

    mock!(
        Handler{}

        #[async_trait]
        impl InboundHandler for Handler {
            async fn handle(&self, message: Message);
        }
    );

    mock!(
        Reporter{}

        impl ErrorReporter for Reporter {
            fn report(&self, connection_id: &ConnectionID, err: &ConnectionError);
        }
    );

    #[tokio::test]
    async fn test_route_delivers_to_handler() {
        let mut handler = MockHandler::new();
        handler
            .expect_handle()
            .withf(|msg| msg.get_field("hello") == Some(&json!("world")))
            .times(1)
            .return_const(());

        let router = InboundRouter::new(
            ConnectionID::generate(),
            local_codec("ws://partner"),
            Some(Arc::new(handler)),
            None,
        );

        let message = Message::from_value(json!({"hello": "world"})).unwrap();
        let packed = partner_codec().seal(message).await.unwrap();
        assert!(router.route(&packed).await.is_ok());
    }

    #[tokio::test]
    async fn test_route_without_handler_drops_message() {
        let router = InboundRouter::new(
            ConnectionID::generate(),
            local_codec("ws://partner"),
            None,
            None,
        );

        let packed = partner_codec()
            .seal(Message::new("test/1.0/hello"))
            .await
            .unwrap();
        assert!(router.route(&packed).await.is_ok());
        assert!(!router.has_handler().await);
    }

    #[tokio::test]
    async fn test_set_handler_after_creation() {
        let router = InboundRouter::new(
            ConnectionID::generate(),
            local_codec("ws://partner"),
            None,
            None,
        );

        let (handler, mut rx) = ChannelHandler::new();
        router.set_handler(handler).await;

        let packed = partner_codec()
            .seal(Message::new("test/1.0/hello"))
            .await
            .unwrap();
        router.route(&packed).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.get_kind(), Some("test/1.0/hello".to_string()));
    }

    #[tokio::test]
    async fn test_route_logged_reports_failures() {
        let id = ConnectionID::generate();
        let expected_id = id.clone();

        let mut reporter = MockReporter::new();
        reporter
            .expect_report()
            .withf(move |conn_id, err| {
                conn_id == &expected_id && matches!(err, ConnectionError::CryptoError(_))
            })
            .times(1)
            .return_const(());

        let mut handler = MockHandler::new();
        handler.expect_handle().never();

        let router = InboundRouter::new(
            id,
            local_codec("ws://partner"),
            Some(Arc::new(handler)),
            Some(Arc::new(reporter)),
        );

        router.route_logged(b"not an envelope").await;
    }

    #[tokio::test]
    async fn test_route_rejects_envelope_from_unknown_sender() {
        let mut handler = MockHandler::new();
        handler.expect_handle().never();

        let router = InboundRouter::new(
            ConnectionID::generate(),
            local_codec("ws://partner"),
            Some(Arc::new(handler)),
            None,
        );

        let stranger = EnvelopeCodec::new(
            CipherHandle::default(),
            X25519Cipher::keypair_from_secret([33u8; 32]),
            &service_for(&local_keypair(), "ws://local"),
        );
        let packed = stranger.seal(Message::new("test/1.0/hello")).await.unwrap();

        let routed = router.route(&packed).await;
        assert!(matches!(routed.unwrap_err(), ConnectionError::CryptoError(_)));
    }

    #[tokio::test]
    async fn test_build_driver_by_protocol() {
        let router = Arc::new(InboundRouter::new(
            ConnectionID::generate(),
            local_codec("ws://partner"),
            None,
            None,
        ));
        let config = Transport::default();

        let table = vec![
            (TransportProtocol::Ws, false),
            (TransportProtocol::Wss, false),
            (TransportProtocol::Http, true),
            (TransportProtocol::Https, true),
            (TransportProtocol::Unsupported("ftp".to_string()), false),
        ];

        for (protocol, needs_poll) in table {
            let endpoint = format!("{}://partner/inbox", protocol);
            let driver = build_driver(&protocol, &endpoint, router.clone(), &config).unwrap();
            assert_eq!(driver.needs_return_route_poll(), needs_poll);
        }
    }
}
