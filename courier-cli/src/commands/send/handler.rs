use std::sync::Arc;
use std::time::Duration;

use rst_common::with_logging::log::{debug, info};
use rst_common::with_tokio::tokio::time::sleep;

use prople_courier_core::connection::message::Message;
use prople_courier_core::connection::types::ConnectionEntityAccessor;
use prople_courier_core::connection::Connection;

use crate::commands::{LogErrorReporter, LogInboundHandler};
use crate::types::CliError;
use crate::utils::{load_config, load_record};

use super::SendArgs;

pub async fn handle_commands(args: SendArgs) -> Result<(), CliError> {
    debug!("send command handler triggered...");

    let config = load_config(args.config)?;
    let message =
        Message::from_json(&args.message).map_err(|err| CliError::MessageError(err.to_string()))?;

    let connection = Connection::builder()
        .with_record(load_record(&args.record)?)?
        .with_config(config)
        .with_inbound_handler(Arc::new(LogInboundHandler))
        .with_error_reporter(Arc::new(LogErrorReporter))
        .build()?;

    info!(
        "[send] connection: {} | endpoint: {}",
        connection.get_id(),
        connection.get_service().get_service_endpoint()
    );

    connection.send(message, !args.no_return_route).await?;

    // http replies are handled within send
    if !connection.needs_return_route_poll() && args.wait_secs > 0 {
        debug!("[send] waiting {}s for socket replies", args.wait_secs);
        sleep(Duration::from_secs(args.wait_secs)).await;
    }

    connection.close().await;
    Ok(())
}
