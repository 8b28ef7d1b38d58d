use std::sync::Arc;

use rst_common::with_logging::log::debug;
use rst_common::with_tokio::tokio::sync::OnceCell;

use crate::connection::types::{ConnectionError, EnvelopeCipher, Unpacked};
use crate::keys::LocalKeypair;

use super::X25519Cipher;

/// `CipherHandle` is a cloneable handle over one shared [`EnvelopeCipher`]
///
/// The cipher's `ready` is awaited only once for every clone of the same handle,
/// concurrent first callers wait on the same initialization
#[derive(Clone)]
pub struct CipherHandle {
    cipher: Arc<dyn EnvelopeCipher>,
    ready: Arc<OnceCell<()>>,
}

impl CipherHandle {
    pub fn new(cipher: impl EnvelopeCipher + 'static) -> Self {
        Self::from_arc(Arc::new(cipher))
    }

    pub fn from_arc(cipher: Arc<dyn EnvelopeCipher>) -> Self {
        Self {
            cipher,
            ready: Arc::new(OnceCell::new()),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    pub async fn ensure_ready(&self) -> Result<(), ConnectionError> {
        self.ready
            .get_or_try_init(|| async {
                debug!("[cipher] waiting for cipher readiness");
                self.cipher.ready().await
            })
            .await?;

        Ok(())
    }

    pub async fn pack(
        &self,
        plaintext: &[u8],
        recipient_keys: &[Vec<u8>],
        sender: &LocalKeypair,
    ) -> Result<Vec<u8>, ConnectionError> {
        self.ensure_ready().await?;
        self.cipher.pack(plaintext, recipient_keys, sender).await
    }

    pub async fn unpack(
        &self,
        packed: &[u8],
        receiver: &LocalKeypair,
    ) -> Result<Unpacked, ConnectionError> {
        self.ensure_ready().await?;
        self.cipher.unpack(packed, receiver).await
    }
}

impl Default for CipherHandle {
    fn default() -> Self {
        Self::new(X25519Cipher::new())
    }
}
