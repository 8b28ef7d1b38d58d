//! `keys` holds the local keypair owned by a single connection
//!
//! The keypair keeps both the binary form used by the envelope cipher and the
//! base58 form used for storage and display.
use std::fmt::{self, Debug};

use zeroize::Zeroize;

use crate::connection::types::ConnectionError;

/// Size of both halves of an X25519 keypair
pub const KEY_SIZE: usize = 32;

/// `decode_b58` turns a base58 encoded key into raw bytes
pub fn decode_b58(value: &str) -> Result<Vec<u8>, ConnectionError> {
    bs58::decode(value)
        .into_vec()
        .map_err(|err| ConnectionError::InvalidKeyEncoding(err.to_string()))
}

pub fn encode_b58(value: &[u8]) -> String {
    bs58::encode(value).into_string()
}

#[derive(Clone, PartialEq)]
pub struct LocalKeypair {
    private_key: Vec<u8>,
    public_key: Vec<u8>,
    private_key_b58: String,
    public_key_b58: String,
}

impl LocalKeypair {
    pub fn from_bytes(private_key: Vec<u8>, public_key: Vec<u8>) -> Self {
        let private_key_b58 = encode_b58(&private_key);
        let public_key_b58 = encode_b58(&public_key);

        Self {
            private_key,
            public_key,
            private_key_b58,
            public_key_b58,
        }
    }

    /// `from_b58` rebuilds a keypair from its storage encoding
    ///
    /// Both keys must decode to raw X25519 keys. A 64 byte signing key written by
    /// another agent is rejected here instead of failing on the first send
    pub fn from_b58(private_key_b58: &str, public_key_b58: &str) -> Result<Self, ConnectionError> {
        let private_key = decode_b58(private_key_b58)?;
        let public_key = decode_b58(public_key_b58)?;

        for (name, key) in [("private", &private_key), ("public", &public_key)] {
            if key.len() != KEY_SIZE {
                return Err(ConnectionError::InvalidKeyEncoding(format!(
                    "{} key must be {} bytes, got {}",
                    name,
                    KEY_SIZE,
                    key.len()
                )));
            }
        }

        Ok(Self {
            private_key,
            public_key,
            private_key_b58: private_key_b58.to_string(),
            public_key_b58: public_key_b58.to_string(),
        })
    }

    pub fn get_private_key(&self) -> &[u8] {
        &self.private_key
    }

    pub fn get_public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn get_private_key_b58(&self) -> &str {
        &self.private_key_b58
    }

    pub fn get_public_key_b58(&self) -> &str {
        &self.public_key_b58
    }
}

impl Debug for LocalKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeypair")
            .field("public_key_b58", &self.public_key_b58)
            .field("private_key_b58", &"<redacted>")
            .finish()
    }
}

impl Drop for LocalKeypair {
    fn drop(&mut self) {
        self.private_key.zeroize();
        self.private_key_b58.zeroize();
    }
}
