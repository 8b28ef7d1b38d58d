//! Wire shape of the envelope produced by [`X25519Cipher`](super::X25519Cipher)
//!
//! Keys are raw 32 byte X25519 keys. This is its own format, it is not the Aries
//! pack format and can't be opened by agents that expect it.
use rst_common::standard::serde::{self, Deserialize, Serialize};

pub const ENVELOPE_TYP: &str = "prople-courier/1.0";
pub const ENVELOPE_ENC: &str = "chacha20poly1305";
pub const ENVELOPE_ALG: &str = "X25519-HKDF-SHA256";

/// `RecipientHeader` carries what a recipient needs to recover the content key
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct RecipientHeader {
    /// recipient public key, base58
    pub kid: String,

    /// sender public key, base58
    pub skid: String,

    /// ephemeral public key, base58
    pub epk: String,

    pub iv: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct Recipient {
    pub encrypted_key: String,
    pub header: RecipientHeader,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct Protected {
    pub enc: String,
    pub typ: String,
    pub alg: String,
    pub recipients: Vec<Recipient>,
}

/// `Envelope` is the wire shape of a packed message, every binary member is
/// base64url without padding
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct Envelope {
    pub protected: String,
    pub iv: String,
    pub ciphertext: String,
    pub tag: String,
}
