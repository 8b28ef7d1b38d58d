use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::{error, info, warn};

use prople_courier_core::connection::message::Message;
use prople_courier_core::connection::types::{
    ConnectionError, ConnectionID, ErrorReporter, InboundHandler,
};

/// Prints every inbound message
pub struct LogInboundHandler;

#[async_trait]
impl InboundHandler for LogInboundHandler {
    async fn handle(&self, message: Message) {
        match message.to_json() {
            Ok(json) => info!("[inbound] message: {}", json),
            Err(err) => warn!("[inbound] unprintable message: {}", err),
        }
    }
}

pub struct LogErrorReporter;

impl ErrorReporter for LogErrorReporter {
    fn report(&self, connection_id: &ConnectionID, err: &ConnectionError) {
        error!("[connection:{}] {}", connection_id, err)
    }
}
