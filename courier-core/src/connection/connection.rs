use std::fmt::{self, Debug};
use std::sync::Arc;

use rst_common::with_logging::log::{debug, info};

use crate::common::types::ToValidate;
use crate::config::Config;
use crate::crypto::CipherHandle;
use crate::doc::{Doc, Service};
use crate::keys::LocalKeypair;

use super::codec::EnvelopeCodec;
use super::message::{Message, ReturnRoute};
use super::record::{ConnectionRecord, KeyEncoded};
use super::selector::ServiceSelector;
use super::transport::{build_driver, InboundRouter, TransportDriver};
use super::types::{
    ConnectionEntityAccessor, ConnectionError, ConnectionID, ErrorReporter, InboundHandler,
    TransportProtocol,
};

/// # Connection
///
/// One peer relationship: who the partner is, which of its endpoints we talk to,
/// and the local key used to seal and open every envelope exchanged with it.
///
/// The service and the transport protocol are chosen once, when the connection
/// is built, and never change afterwards. A connection is either created fresh
/// (a new `UUID v4` id is generated) or restored from a [`ConnectionRecord`].
///
/// ## Sending
/// `send` composes the message (`@id` and optionally `~transport.return_route`),
/// seals it for the partner and hands the envelope to the transport driver.
///
/// ## Receiving
/// Replies arriving on the socket or on an HTTP response are routed to the
/// inbound handler in the background. Envelopes obtained by any other means can
/// be given to `receive`.
pub struct Connection {
    id: ConnectionID,
    label: String,
    partner_doc: Doc,
    service: Service,
    protocol: TransportProtocol,
    router: Arc<InboundRouter>,
    driver: Box<dyn TransportDriver>,
}

impl Connection {
    /// Creates a fresh connection with default transport settings
    ///
    /// # Parameters
    /// - `label`: display name of the partner
    /// - `partner_doc`: partner's `DID Doc`, at least one supported service is required
    /// - `keypair`: local keypair owned by this connection
    /// - `handler`: optional inbound handler, it can also be set later
    ///
    /// # Errors
    /// - `SelectionError` when the document declares no supported service
    pub fn new(
        label: &str,
        partner_doc: Doc,
        keypair: LocalKeypair,
        handler: Option<Arc<dyn InboundHandler>>,
    ) -> Result<Self, ConnectionError> {
        let mut builder = Connection::builder()
            .with_label(label)
            .with_partner_doc(partner_doc)
            .with_keypair(keypair);

        if let Some(handler) = handler {
            builder = builder.with_inbound_handler(handler);
        }

        builder.build()
    }

    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// Restores a connection from its persisted record
    ///
    /// The service and protocol are selected again from the stored document.
    ///
    /// # Errors
    /// - `InvalidKeyEncoding` when the stored key material is not valid base58
    /// - `SelectionError` when the stored document has no supported service
    pub fn from_record(
        record: ConnectionRecord,
        handler: Option<Arc<dyn InboundHandler>>,
    ) -> Result<Self, ConnectionError> {
        let mut builder = Connection::builder().with_record(record)?;

        if let Some(handler) = handler {
            builder = builder.with_inbound_handler(handler);
        }

        builder.build()
    }

    /// Seals and delivers a message to the partner
    ///
    /// # Parameters
    /// - `message`: application message, an `@id` is generated when it has none
    /// - `set_return_route`: sets `~transport.return_route` to `all` so the
    ///   partner can answer on the same request
    ///
    /// # Errors
    /// - `InvalidKeyEncoding` / `CryptoError` when sealing fails
    /// - `TransportError` when the socket can't be opened or written
    /// - `UnsupportedProtocol` when the selected service has an unknown scheme
    ///
    /// HTTP delivery failures are reported to the error reporter, not returned.
    pub async fn send(&self, message: Message, set_return_route: bool) -> Result<(), ConnectionError> {
        let mut message = message;
        if set_return_route {
            message.set_return_route(ReturnRoute::All);
        }

        let packed = self.router.codec().seal(message).await?;
        debug!(
            "[connection] sending envelope | connection: {} | protocol: {}",
            self.id, self.protocol
        );

        self.driver.send(packed).await
    }

    /// `send_message` sends with return route enabled
    pub async fn send_message(&self, message: Message) -> Result<(), ConnectionError> {
        self.send(message, true).await
    }

    /// Opens an inbound envelope and delivers it to the inbound handler
    ///
    /// Unlike the background paths, errors are returned to the caller.
    pub async fn receive(&self, packed: &[u8]) -> Result<(), ConnectionError> {
        self.router.route(packed).await
    }

    /// `true` when replies only come back on the response of an outbound request
    pub fn needs_return_route_poll(&self) -> bool {
        self.driver.needs_return_route_poll()
    }

    pub async fn set_inbound_handler(&self, handler: Arc<dyn InboundHandler>) {
        self.router.set_handler(handler).await
    }

    pub fn to_record(&self) -> ConnectionRecord {
        ConnectionRecord {
            id: self.id.clone(),
            label: self.label.clone(),
            did_doc: self.partner_doc.clone(),
            my_key_b58: KeyEncoded::from(self.router.codec().keypair()),
        }
    }

    /// Closes the socket if one is open, the next send opens a new one
    pub async fn close(&self) {
        self.driver.close().await
    }
}

impl Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("endpoint", &self.service.get_service_endpoint())
            .field("protocol", &self.protocol)
            .finish()
    }
}

impl ConnectionEntityAccessor for Connection {
    fn get_id(&self) -> ConnectionID {
        self.id.clone()
    }

    fn get_label(&self) -> String {
        self.label.clone()
    }

    fn get_partner_doc(&self) -> Doc {
        self.partner_doc.clone()
    }

    fn get_keypair(&self) -> LocalKeypair {
        self.router.codec().keypair().clone()
    }

    fn get_service(&self) -> Service {
        self.service.clone()
    }

    fn get_protocol(&self) -> TransportProtocol {
        self.protocol.clone()
    }
}

/// # Connection Builder
///
/// Required: `label`, `partner_doc` and `keypair`. Everything else has a default:
/// - `id`: a new `UUID v4`
/// - `cipher`: [`CipherHandle::default`]
/// - `config`: [`Config::default`]
/// - `handler` / `reporter`: none
#[derive(Default)]
pub struct ConnectionBuilder {
    id: Option<ConnectionID>,
    label: Option<String>,
    partner_doc: Option<Doc>,
    keypair: Option<LocalKeypair>,
    handler: Option<Arc<dyn InboundHandler>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    cipher: Option<CipherHandle>,
    config: Option<Config>,
}

impl ConnectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id<T: Into<ConnectionID>>(mut self, id: T) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_partner_doc(mut self, partner_doc: Doc) -> Self {
        self.partner_doc = Some(partner_doc);
        self
    }

    pub fn with_keypair(mut self, keypair: LocalKeypair) -> Self {
        self.keypair = Some(keypair);
        self
    }

    /// Fills id, label, document and keypair from a stored record
    ///
    /// # Errors
    /// - `InvalidKeyEncoding` when the stored keys can't be decoded
    pub fn with_record(self, record: ConnectionRecord) -> Result<Self, ConnectionError> {
        let keypair = record.my_key_b58.to_keypair()?;

        Ok(self
            .with_id(record.id)
            .with_label(&record.label)
            .with_partner_doc(record.did_doc)
            .with_keypair(keypair))
    }

    pub fn with_inbound_handler(mut self, handler: Arc<dyn InboundHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn with_cipher(mut self, cipher: CipherHandle) -> Self {
        self.cipher = Some(cipher);
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Selects the service, derives the protocol and prepares the transport
    ///
    /// # Errors
    /// - `MissingField` when a required field was never set
    /// - `ConfigError` when the transport settings are invalid
    /// - `SelectionError` when the document has no supported service
    /// - `TransportError` when the HTTP client can't be created
    pub fn build(self) -> Result<Connection, ConnectionError> {
        let label = self
            .label
            .ok_or_else(|| ConnectionError::MissingField("label".to_string()))?;

        let partner_doc = self
            .partner_doc
            .ok_or_else(|| ConnectionError::MissingField("partner_doc".to_string()))?;

        let keypair = self
            .keypair
            .ok_or_else(|| ConnectionError::MissingField("keypair".to_string()))?;

        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|err| ConnectionError::ConfigError(err.to_string()))?;

        let id = self.id.unwrap_or_else(ConnectionID::generate);
        let (service, protocol) = ServiceSelector::select(&partner_doc)?;

        let codec = EnvelopeCodec::new(self.cipher.unwrap_or_default(), keypair, &service);
        let router = Arc::new(InboundRouter::new(
            id.clone(),
            codec,
            self.handler,
            self.reporter,
        ));

        let driver = build_driver(
            &protocol,
            service.get_service_endpoint(),
            router.clone(),
            config.transport(),
        )?;

        info!(
            "[connection] ready | connection: {} | endpoint: {} | protocol: {}",
            id,
            service.get_service_endpoint(),
            protocol
        );

        Ok(Connection {
            id,
            label,
            partner_doc,
            service,
            protocol,
            router,
            driver,
        })
    }
}
