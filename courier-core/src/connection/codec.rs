use rst_common::with_logging::log::{debug, warn};

use crate::crypto::CipherHandle;
use crate::doc::Service;
use crate::keys::{decode_b58, LocalKeypair, KEY_SIZE};

use super::message::Message;
use super::types::ConnectionError;

/// `EnvelopeCodec` seals application messages for the selected service and
/// opens inbound envelopes addressed to the local key
///
/// Sealing and opening always go through the same keypair instance
#[derive(Clone)]
pub struct EnvelopeCodec {
    cipher: CipherHandle,
    keypair: LocalKeypair,
    recipient_keys: Vec<String>,
}

impl EnvelopeCodec {
    pub fn new(cipher: CipherHandle, keypair: LocalKeypair, service: &Service) -> Self {
        Self {
            cipher,
            keypair,
            recipient_keys: service.get_recipient_keys(),
        }
    }

    pub fn keypair(&self) -> &LocalKeypair {
        &self.keypair
    }

    fn decoded_recipient_keys(&self) -> Result<Vec<Vec<u8>>, ConnectionError> {
        self.recipient_keys
            .iter()
            .map(|key| {
                let decoded = decode_b58(key)?;
                if decoded.len() != KEY_SIZE {
                    return Err(ConnectionError::InvalidKeyEncoding(format!(
                        "recipient key {} must be {} bytes",
                        key, KEY_SIZE
                    )));
                }

                Ok(decoded)
            })
            .collect()
    }

    /// `seal` gives the message an `@id` when it has none and packs it for the partner
    pub async fn seal(&self, mut message: Message) -> Result<Vec<u8>, ConnectionError> {
        let id = message.ensure_id();
        let plaintext = message.to_json()?;
        let recipient_keys = self.decoded_recipient_keys()?;

        if recipient_keys.is_empty() {
            return Err(ConnectionError::CryptoError(
                "selected service has no recipient keys".to_string(),
            ));
        }

        debug!("[codec] sealing message: {}", id);
        self.cipher
            .pack(plaintext.as_bytes(), &recipient_keys, &self.keypair)
            .await
    }

    /// `open` unpacks an envelope with the local key and parses the plaintext
    ///
    /// A plaintext that isn't text stays a decode failure. When the envelope names
    /// its sender, the sender must be one of the partner's recipient keys
    pub async fn open(&self, packed: &[u8]) -> Result<Message, ConnectionError> {
        let unpacked = self
            .cipher
            .unpack(packed, &self.keypair)
            .await
            .map_err(|err| match err {
                ConnectionError::CryptoError(msg) => ConnectionError::CryptoError(msg),
                ConnectionError::DecodeError(msg) => ConnectionError::DecodeError(msg),
                other => ConnectionError::CryptoError(other.to_string()),
            })?;

        if let Some(sender) = &unpacked.sender_key {
            if !self.recipient_keys.contains(sender) {
                warn!("[codec] rejecting envelope from unknown sender: {}", sender);
                return Err(ConnectionError::CryptoError(format!(
                    "envelope sender is not a partner key: {}",
                    sender
                )));
            }
        }

        Message::from_json(&unpacked.message)
    }
}
