use std::fmt::{self, Debug, Display};

use derive_more::{AsRef, From, Into};

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::uuid::Uuid;
use rst_common::with_errors::thiserror::{self, Error};

use crate::doc::{Doc, Service};
use crate::keys::LocalKeypair;

use super::message::Message;

/// ConnectionError is a base error types for the `Connection` domain
///
/// It will contains any possible errors for the `connection`
#[derive(Debug, PartialEq, Error, Clone)]
pub enum ConnectionError {
    #[error("no supported service found: {0}")]
    SelectionError(String),

    #[error("crypto error: {0}")]
    CryptoError(String),

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("unsupported transport protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("invalid key encoding: {0}")]
    InvalidKeyEncoding(String),

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("json error: {0}")]
    JSONError(String),

    #[error("config error: {0}")]
    ConfigError(String),
}

/// ConnectionID is the storage key of a connection, a `UUID v4` string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, From, Into, AsRef)]
#[serde(crate = "self::serde")]
pub struct ConnectionID(String);

impl ConnectionID {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ConnectionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ConnectionID {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// TransportProtocol is derived from the selected service endpoint scheme
///
/// It's fixed for the whole connection lifetime and drives the transport dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportProtocol {
    Ws,
    Wss,
    Http,
    Https,
    Unsupported(String),
}

impl TransportProtocol {
    pub fn from_scheme(scheme: &str) -> Self {
        match scheme {
            "ws" => TransportProtocol::Ws,
            "wss" => TransportProtocol::Wss,
            "http" => TransportProtocol::Http,
            "https" => TransportProtocol::Https,
            other => TransportProtocol::Unsupported(other.to_string()),
        }
    }

    pub fn from_service(service: &Service) -> Self {
        Self::from_scheme(service.scheme())
    }

    pub fn is_socket(&self) -> bool {
        matches!(self, TransportProtocol::Ws | TransportProtocol::Wss)
    }

    pub fn is_http(&self) -> bool {
        matches!(self, TransportProtocol::Http | TransportProtocol::Https)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransportProtocol::Ws => "ws",
            TransportProtocol::Wss => "wss",
            TransportProtocol::Http => "http",
            TransportProtocol::Https => "https",
            TransportProtocol::Unsupported(scheme) => scheme.as_str(),
        }
    }
}

impl Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `Unpacked` is the result of opening an envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Unpacked {
    pub message: String,
    pub sender_key: Option<String>,
    pub recipient_key: String,
}

/// `EnvelopeCipher` is the encryption capability used to seal and open envelopes
///
/// The connection doesn't know anything about the envelope format. An implementation
/// may need some asynchronous setup before it can be used, that is what `ready` is for,
/// it will be awaited once before the first `pack` or `unpack`
#[async_trait]
pub trait EnvelopeCipher: Send + Sync {
    async fn ready(&self) -> Result<(), ConnectionError> {
        Ok(())
    }

    async fn pack(
        &self,
        plaintext: &[u8],
        recipient_keys: &[Vec<u8>],
        sender: &LocalKeypair,
    ) -> Result<Vec<u8>, ConnectionError>;

    async fn unpack(
        &self,
        packed: &[u8],
        receiver: &LocalKeypair,
    ) -> Result<Unpacked, ConnectionError>;
}

/// `InboundHandler` receives every message that has been successfully decrypted
#[async_trait]
pub trait InboundHandler: Send + Sync {
    async fn handle(&self, message: Message);
}

/// `ErrorReporter` gives callers visibility into failures that never reach them
/// as a returned error, like a failed HTTP delivery or a broken inbound frame
pub trait ErrorReporter: Send + Sync {
    fn report(&self, connection_id: &ConnectionID, err: &ConnectionError);
}

/// `ConnectionEntityAccessor` it's a special trait used to access main Connection entity
/// property fields.
pub trait ConnectionEntityAccessor: Debug {
    fn get_id(&self) -> ConnectionID;
    fn get_label(&self) -> String;
    fn get_partner_doc(&self) -> Doc;
    fn get_keypair(&self) -> LocalKeypair;
    fn get_service(&self) -> Service;
    fn get_protocol(&self) -> TransportProtocol;
}
