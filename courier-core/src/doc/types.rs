use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{Map, Value};

/// Service type used by legacy Indy agents
pub const SERVICE_TYPE_INDY_AGENT: &str = "IndyAgent";

/// Service type used by DIDComm capable agents
pub const SERVICE_TYPE_DIDCOMM: &str = "did-communication";

const DOC_SERVICE_MEMBER: &str = "service";

/// `Service` is a single endpoint entry declared by a partner inside its `DID Doc`
///
/// Only parsed for entries of a supported type, members this crate doesn't
/// interpret are kept in `extra`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<String>,

    #[serde(rename = "type")]
    pub(crate) kind: String,

    #[serde(rename = "serviceEndpoint")]
    pub(crate) service_endpoint: String,

    #[serde(
        rename = "recipientKeys",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) recipient_keys: Option<Vec<String>>,

    #[serde(
        rename = "routingKeys",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) routing_keys: Option<Vec<String>>,

    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl Service {
    pub fn new(kind: &str, service_endpoint: &str, recipient_keys: Vec<String>) -> Self {
        Self {
            id: None,
            kind: kind.to_string(),
            service_endpoint: service_endpoint.to_string(),
            recipient_keys: Some(recipient_keys),
            routing_keys: None,
            extra: Map::new(),
        }
    }

    pub fn get_id(&self) -> Option<String> {
        self.id.to_owned()
    }

    pub fn get_kind(&self) -> &str {
        &self.kind
    }

    pub fn get_service_endpoint(&self) -> &str {
        &self.service_endpoint
    }

    pub fn get_recipient_keys(&self) -> Vec<String> {
        self.recipient_keys.to_owned().unwrap_or_default()
    }

    pub fn get_routing_keys(&self) -> Vec<String> {
        self.routing_keys.to_owned().unwrap_or_default()
    }

    /// `scheme` is everything before the first `:` of the endpoint
    pub fn scheme(&self) -> &str {
        match self.service_endpoint.split_once(':') {
            Some((scheme, _)) => scheme,
            None => self.service_endpoint.as_str(),
        }
    }
}

impl From<Service> for Value {
    fn from(service: Service) -> Self {
        let mut members = service.extra;
        if let Some(id) = service.id {
            members.insert("id".to_string(), Value::String(id));
        }

        members.insert("type".to_string(), Value::String(service.kind));
        members.insert(
            "serviceEndpoint".to_string(),
            Value::String(service.service_endpoint),
        );

        if let Some(keys) = service.recipient_keys {
            members.insert("recipientKeys".to_string(), Value::from(keys));
        }

        if let Some(keys) = service.routing_keys {
            members.insert("routingKeys".to_string(), Value::from(keys));
        }

        Value::Object(members)
    }
}

/// `Doc` is the partner's `DID Doc`, kept exactly as it was received
///
/// Nothing is interpreted at parse time. Service entries stay raw JSON until a
/// selector decides which ones it cares about, so entries this crate can't read
/// (an object `serviceEndpoint`, `null` members) never break the document
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(crate = "self::serde", transparent)]
pub struct Doc {
    members: Map<String, Value>,
}

impl Doc {
    pub fn new(services: Vec<Service>) -> Self {
        let entries = services.into_iter().map(Value::from).collect();

        let mut members = Map::new();
        members.insert(DOC_SERVICE_MEMBER.to_string(), Value::Array(entries));
        Self { members }
    }

    /// `get_service_entries` returns the raw `service` entries, a missing or
    /// non-array `service` member means no entries
    pub fn get_service_entries(&self) -> Vec<Value> {
        match self.members.get(DOC_SERVICE_MEMBER) {
            Some(Value::Array(entries)) => entries.to_owned(),
            _ => Vec::new(),
        }
    }

    pub fn get_member(&self, key: &str) -> Option<&Value> {
        self.members.get(key)
    }
}
