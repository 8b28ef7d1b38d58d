use rst_common::standard::serde_json::{self, Value};
use rst_common::with_logging::log::{debug, warn};

use crate::doc::{Doc, Service, SERVICE_TYPE_DIDCOMM, SERVICE_TYPE_INDY_AGENT};

use super::types::{ConnectionError, TransportProtocol};

const SUPPORTED_SERVICE_TYPES: [&str; 2] = [SERVICE_TYPE_INDY_AGENT, SERVICE_TYPE_DIDCOMM];

/// `ServiceSelector` picks the one service a connection will use for its whole lifetime
///
/// Services are filtered to the supported types and then ranked: a `ws` endpoint
/// beats any other scheme, services with equal rank keep their listing order
pub struct ServiceSelector;

impl ServiceSelector {
    pub fn is_supported(kind: &str) -> bool {
        SUPPORTED_SERVICE_TYPES.contains(&kind)
    }

    fn is_supported_entry(entry: &Value) -> bool {
        entry
            .get("type")
            .and_then(Value::as_str)
            .map(ServiceSelector::is_supported)
            .unwrap_or(false)
    }

    fn rank(service: &Service) -> u8 {
        match service.scheme() {
            "ws" => 0,
            _ => 1,
        }
    }

    /// `candidates` returns every supported service in ranked order
    ///
    /// Entries are matched on their raw `type` before being parsed, so an entry
    /// of another type is never read. A supported entry that can't be parsed is
    /// skipped
    pub fn candidates(doc: &Doc) -> Vec<Service> {
        let mut services: Vec<Service> = doc
            .get_service_entries()
            .into_iter()
            .filter(ServiceSelector::is_supported_entry)
            .filter_map(|entry| match serde_json::from_value::<Service>(entry) {
                Ok(service) => Some(service),
                Err(err) => {
                    warn!("[selector] skipping malformed service entry: {}", err);
                    None
                }
            })
            .collect();

        // sort_by_key is stable
        services.sort_by_key(ServiceSelector::rank);
        services
    }

    pub fn select(doc: &Doc) -> Result<(Service, TransportProtocol), ConnectionError> {
        let service = ServiceSelector::candidates(doc)
            .into_iter()
            .next()
            .ok_or_else(|| {
                ConnectionError::SelectionError(format!(
                    "expected one of {:?} in the partner document",
                    SUPPORTED_SERVICE_TYPES
                ))
            })?;

        let protocol = TransportProtocol::from_service(&service);
        debug!(
            "[selector] selected endpoint: {} | protocol: {}",
            service.get_service_endpoint(),
            protocol
        );

        Ok((service, protocol))
    }
}
