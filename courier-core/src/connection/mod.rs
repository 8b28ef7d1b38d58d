//! `connection` is the transport and crypto context of one peer relationship.
//!
//! It covers:
//!
//! - Selecting the partner service and transport protocol from its `DID Doc`
//! - Sealing outbound messages and opening inbound envelopes
//! - Delivering envelopes over a websocket or over HTTP POST
//! - Persisting and restoring the connection
pub mod codec;
pub mod message;
pub mod record;
pub mod selector;
pub mod transport;
pub mod types;

mod connection;
pub use connection::{Connection, ConnectionBuilder};
