use std::fs;

use rst_common::standard::serde_json;
use rst_common::with_logging::log::debug;

use prople_courier_core::config::{Config, Parser};
use prople_courier_core::connection::record::ConnectionRecord;
use prople_courier_core::doc::Doc;

use crate::types::CliError;

pub fn read_file(path: &str) -> Result<String, CliError> {
    debug!("[utils] reading file: {}", path);
    fs::read_to_string(path).map_err(|err| CliError::IOError(format!("{}: {}", path, err)))
}

pub fn write_file(path: &str, content: &str) -> Result<(), CliError> {
    debug!("[utils] writing file: {}", path);
    fs::write(path, content).map_err(|err| CliError::IOError(format!("{}: {}", path, err)))
}

/// `load_config` falls back to the default transport settings when no file is given
pub fn load_config(path: Option<String>) -> Result<Config, CliError> {
    match path {
        Some(path) => Parser::new(path)
            .parse_validated()
            .map_err(CliError::ConfigError),
        None => Ok(Config::default()),
    }
}

pub fn load_record(path: &str) -> Result<ConnectionRecord, CliError> {
    let raw = read_file(path)?;
    ConnectionRecord::from_json(&raw).map_err(|err| CliError::RecordError(err.to_string()))
}

pub fn load_doc(path: &str) -> Result<Doc, CliError> {
    let raw = read_file(path)?;
    serde_json::from_str(&raw).map_err(|err| CliError::RecordError(err.to_string()))
}
