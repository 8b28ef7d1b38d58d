//! `crypto` provides the default [`EnvelopeCipher`](crate::connection::types::EnvelopeCipher)
//! implementation and the shared handle used to gate its readiness
pub mod envelope;

mod handle;
pub use handle::CipherHandle;

mod x25519;
pub use x25519::X25519Cipher;
