use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json;

use crate::connection::types::{ConnectionError, EnvelopeCipher, Unpacked};
use crate::keys::{decode_b58, encode_b58, LocalKeypair, KEY_SIZE};

use super::envelope::{
    Envelope, Protected, Recipient, RecipientHeader, ENVELOPE_ALG, ENVELOPE_ENC, ENVELOPE_TYP,
};

const HKDF_INFO: &[u8] = b"prople-courier-envelope-v1";
const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;

fn crypto_err(msg: &str) -> ConnectionError {
    ConnectionError::CryptoError(msg.to_string())
}

fn random_bytes<const N: usize>() -> Result<[u8; N], ConnectionError> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf).map_err(|err| ConnectionError::CryptoError(err.to_string()))?;
    Ok(buf)
}

fn to_key(bytes: &[u8], what: &str) -> Result<[u8; KEY_SIZE], ConnectionError> {
    bytes
        .try_into()
        .map_err(|_| ConnectionError::CryptoError(format!("{} must be {} bytes", what, KEY_SIZE)))
}

fn b64_decode(value: &str) -> Result<Vec<u8>, ConnectionError> {
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|err| ConnectionError::CryptoError(err.to_string()))
}

fn nonce(bytes: &[u8]) -> Result<&Nonce, ConnectionError> {
    if bytes.len() != NONCE_SIZE {
        return Err(crypto_err("invalid nonce size"));
    }

    Ok(Nonce::from_slice(bytes))
}

/// Key wrapping key for one recipient, bound to both the ephemeral and the static sender key
fn derive_kek(
    ephemeral_shared: &[u8],
    static_shared: &[u8],
    epk: &[u8],
) -> Result<[u8; KEY_SIZE], ConnectionError> {
    let mut ikm = [ephemeral_shared, static_shared].concat();
    let hk = Hkdf::<Sha256>::new(Some(epk), &ikm);
    let mut kek = [0u8; KEY_SIZE];
    let expanded = hk.expand(HKDF_INFO, &mut kek);
    ikm.zeroize();

    expanded.map_err(|_| crypto_err("unable to derive key wrapping key"))?;
    Ok(kek)
}

/// `X25519Cipher` packs envelopes for one or more recipients
///
/// Each message is encrypted once with a random content key, the content key is
/// wrapped per recipient with a key derived from `X25519(ephemeral, recipient)` and
/// `X25519(sender, recipient)`. The protected header is authenticated as associated data
#[derive(Debug, Clone, Default)]
pub struct X25519Cipher;

impl X25519Cipher {
    pub fn new() -> Self {
        Self
    }

    /// `keypair_from_secret` derives the public half of an existing secret
    pub fn keypair_from_secret(secret: [u8; KEY_SIZE]) -> LocalKeypair {
        let static_secret = StaticSecret::from(secret);
        let public = PublicKey::from(&static_secret);
        LocalKeypair::from_bytes(static_secret.to_bytes().to_vec(), public.as_bytes().to_vec())
    }

    pub fn generate_keypair() -> Result<LocalKeypair, ConnectionError> {
        let mut secret = random_bytes::<KEY_SIZE>()?;
        let keypair = Self::keypair_from_secret(secret);
        secret.zeroize();
        Ok(keypair)
    }

    fn wrap_for(
        cek: &[u8; KEY_SIZE],
        recipient_key: &[u8],
        sender_secret: &StaticSecret,
        sender_public_b58: &str,
    ) -> Result<Recipient, ConnectionError> {
        let recipient_public = PublicKey::from(to_key(recipient_key, "recipient key")?);

        let ephemeral_secret = StaticSecret::from(random_bytes::<KEY_SIZE>()?);
        let ephemeral_public = PublicKey::from(&ephemeral_secret);

        let ephemeral_shared = ephemeral_secret.diffie_hellman(&recipient_public);
        let static_shared = sender_secret.diffie_hellman(&recipient_public);
        let kek = derive_kek(
            ephemeral_shared.as_bytes(),
            static_shared.as_bytes(),
            ephemeral_public.as_bytes(),
        )?;

        let key_iv = random_bytes::<NONCE_SIZE>()?;
        let encrypted_key = ChaCha20Poly1305::new(Key::from_slice(&kek))
            .encrypt(Nonce::from_slice(&key_iv), cek.as_slice())
            .map_err(|_| crypto_err("unable to wrap content key"))?;

        Ok(Recipient {
            encrypted_key: URL_SAFE_NO_PAD.encode(encrypted_key),
            header: RecipientHeader {
                kid: encode_b58(recipient_public.as_bytes()),
                skid: sender_public_b58.to_string(),
                epk: encode_b58(ephemeral_public.as_bytes()),
                iv: URL_SAFE_NO_PAD.encode(key_iv),
            },
        })
    }

    fn unwrap_for(
        recipient: &Recipient,
        receiver_secret: &StaticSecret,
    ) -> Result<[u8; KEY_SIZE], ConnectionError> {
        let epk = decode_b58(&recipient.header.epk)
            .map_err(|_| crypto_err("invalid ephemeral key encoding"))?;
        let skid = decode_b58(&recipient.header.skid)
            .map_err(|_| crypto_err("invalid sender key encoding"))?;

        let ephemeral_public = PublicKey::from(to_key(&epk, "ephemeral key")?);
        let sender_public = PublicKey::from(to_key(&skid, "sender key")?);

        let ephemeral_shared = receiver_secret.diffie_hellman(&ephemeral_public);
        let static_shared = receiver_secret.diffie_hellman(&sender_public);
        let kek = derive_kek(
            ephemeral_shared.as_bytes(),
            static_shared.as_bytes(),
            ephemeral_public.as_bytes(),
        )?;

        let key_iv = b64_decode(&recipient.header.iv)?;
        let encrypted_key = b64_decode(&recipient.encrypted_key)?;
        let mut cek = ChaCha20Poly1305::new(Key::from_slice(&kek))
            .decrypt(nonce(&key_iv)?, encrypted_key.as_slice())
            .map_err(|_| crypto_err("unable to unwrap content key"))?;

        let key = to_key(&cek, "content key");
        cek.zeroize();
        key
    }
}

#[async_trait]
impl EnvelopeCipher for X25519Cipher {
    async fn pack(
        &self,
        plaintext: &[u8],
        recipient_keys: &[Vec<u8>],
        sender: &LocalKeypair,
    ) -> Result<Vec<u8>, ConnectionError> {
        if recipient_keys.is_empty() {
            return Err(crypto_err("at least one recipient key is required"));
        }

        let sender_secret = StaticSecret::from(to_key(sender.get_private_key(), "sender key")?);
        let mut cek = random_bytes::<KEY_SIZE>()?;

        let recipients = recipient_keys
            .iter()
            .map(|key| {
                X25519Cipher::wrap_for(&cek, key, &sender_secret, sender.get_public_key_b58())
            })
            .collect::<Result<Vec<Recipient>, ConnectionError>>()?;

        let protected = Protected {
            enc: ENVELOPE_ENC.to_string(),
            typ: ENVELOPE_TYP.to_string(),
            alg: ENVELOPE_ALG.to_string(),
            recipients,
        };

        let protected_json = serde_json::to_vec(&protected)
            .map_err(|err| ConnectionError::JSONError(err.to_string()))?;
        let protected_b64 = URL_SAFE_NO_PAD.encode(protected_json);

        let iv = random_bytes::<NONCE_SIZE>()?;
        let sealed = ChaCha20Poly1305::new(Key::from_slice(&cek)).encrypt(
            Nonce::from_slice(&iv),
            Payload {
                msg: plaintext,
                aad: protected_b64.as_bytes(),
            },
        );
        cek.zeroize();

        let mut sealed = sealed.map_err(|_| crypto_err("unable to encrypt message"))?;
        let tag = sealed.split_off(sealed.len() - TAG_SIZE);

        let envelope = Envelope {
            protected: protected_b64,
            iv: URL_SAFE_NO_PAD.encode(iv),
            ciphertext: URL_SAFE_NO_PAD.encode(sealed),
            tag: URL_SAFE_NO_PAD.encode(tag),
        };

        serde_json::to_vec(&envelope).map_err(|err| ConnectionError::JSONError(err.to_string()))
    }

    async fn unpack(
        &self,
        packed: &[u8],
        receiver: &LocalKeypair,
    ) -> Result<Unpacked, ConnectionError> {
        let envelope: Envelope =
            serde_json::from_slice(packed).map_err(|_| crypto_err("malformed envelope"))?;

        let protected_json = b64_decode(&envelope.protected)?;
        let protected: Protected = serde_json::from_slice(&protected_json)
            .map_err(|_| crypto_err("malformed protected header"))?;

        if protected.alg != ENVELOPE_ALG {
            return Err(ConnectionError::CryptoError(format!(
                "unsupported envelope algorithm: {}",
                protected.alg
            )));
        }

        let recipient = protected
            .recipients
            .iter()
            .find(|recipient| recipient.header.kid == receiver.get_public_key_b58())
            .ok_or_else(|| crypto_err("no recipient entry matches the local key"))?;

        let receiver_secret =
            StaticSecret::from(to_key(receiver.get_private_key(), "receiver key")?);
        let mut cek = X25519Cipher::unwrap_for(recipient, &receiver_secret)?;

        let iv = b64_decode(&envelope.iv)?;
        let mut sealed = b64_decode(&envelope.ciphertext)?;
        sealed.extend(b64_decode(&envelope.tag)?);

        let opened = ChaCha20Poly1305::new(Key::from_slice(&cek)).decrypt(
            nonce(&iv)?,
            Payload {
                msg: sealed.as_slice(),
                aad: envelope.protected.as_bytes(),
            },
        );
        cek.zeroize();

        let plaintext = opened.map_err(|_| crypto_err("unable to decrypt message"))?;
        let message = String::from_utf8(plaintext)
            .map_err(|err| ConnectionError::DecodeError(err.to_string()))?;

        Ok(Unpacked {
            message,
            sender_key: Some(recipient.header.skid.to_owned()),
            recipient_key: recipient.header.kid.to_owned(),
        })
    }
}
