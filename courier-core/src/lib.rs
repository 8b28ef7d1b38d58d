//! `prople-courier-core` holds a peer connection for DIDComm style agents.
//!
//! A [`Connection`](connection::Connection) picks one endpoint out of the
//! partner's `DID Doc`, seals every message for that partner and delivers it
//! over a websocket (`ws`/`wss`) or an HTTP POST (`http`/`https`). Replies are
//! opened with the connection's own key and handed to an inbound handler.
pub mod common;
pub mod config;
pub mod connection;
pub mod crypto;
pub mod doc;
pub mod keys;
