use rst_common::with_logging::log::{debug, info};

use prople_courier_core::connection::types::ConnectionEntityAccessor;
use prople_courier_core::connection::Connection;
use prople_courier_core::crypto::X25519Cipher;

use crate::types::CliError;
use crate::utils::{load_doc, write_file};

use super::KeygenArgs;

pub async fn handle_commands(args: KeygenArgs) -> Result<(), CliError> {
    debug!("keygen command handler triggered...");

    let doc = load_doc(&args.doc)?;
    let keypair = X25519Cipher::generate_keypair()?;
    let connection = Connection::new(&args.label, doc, keypair, None)?;

    let record = connection
        .to_record()
        .to_json()
        .map_err(|err| CliError::RecordError(err.to_string()))?;

    info!(
        "[keygen] connection: {} | endpoint: {} | protocol: {}",
        connection.get_id(),
        connection.get_service().get_service_endpoint(),
        connection.get_protocol()
    );

    match args.out {
        Some(path) => write_file(&path, &record)?,
        None => println!("{}", record),
    }

    Ok(())
}
