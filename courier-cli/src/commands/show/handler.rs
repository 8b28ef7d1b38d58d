use rst_common::with_logging::log::debug;

use prople_courier_core::connection::types::ConnectionEntityAccessor;
use prople_courier_core::connection::Connection;

use crate::types::CliError;
use crate::utils::load_record;

use super::ShowArgs;

pub async fn handle_commands(args: ShowArgs) -> Result<(), CliError> {
    debug!("show command handler triggered...");

    let record = load_record(&args.record)?;
    let connection = Connection::from_record(record, None)?;
    let service = connection.get_service();

    println!("id:        {}", connection.get_id());
    println!("label:     {}", connection.get_label());
    println!("service:   {}", service.get_id().unwrap_or_else(|| "-".to_string()));
    println!("endpoint:  {}", service.get_service_endpoint());
    println!("type:      {}", service.get_kind());
    println!("routing:   {}", service.get_routing_keys().join(", "));
    println!("protocol:  {}", connection.get_protocol());
    println!("poll:      {}", connection.needs_return_route_poll());
    println!("public:    {}", connection.get_keypair().get_public_key_b58());

    Ok(())
}
