use rst_common::with_errors::thiserror::{self, Error};

use prople_courier_core::connection::types::ConnectionError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("io error: {0}")]
    IOError(String),

    #[error("record error: {0}")]
    RecordError(String),

    #[error("message error: {0}")]
    MessageError(String),

    #[error("connection error: {0}")]
    ConnectionError(String),
}

impl From<ConnectionError> for CliError {
    fn from(err: ConnectionError) -> Self {
        CliError::ConnectionError(err.to_string())
    }
}
