//! `doc` models the partner's `DID Doc` just deeply enough to negotiate a transport
//!
//! Resolution and validation of the document belong to the caller.
pub mod types;

pub use types::{Doc, Service, SERVICE_TYPE_DIDCOMM, SERVICE_TYPE_INDY_AGENT};
