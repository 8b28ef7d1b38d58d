use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Map, Value};
use rst_common::standard::uuid::Uuid;

use super::types::ConnectionError;

/// `ReturnRoute` asks the partner to deliver replies over the same request
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde", rename_all = "lowercase")]
pub enum ReturnRoute {
    None,
    All,
    Thread,
}

/// `TransportDecorator` is the `~transport` member of a message
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(crate = "self::serde")]
pub struct TransportDecorator {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) return_route: Option<ReturnRoute>,

    #[serde(flatten)]
    pub(crate) extra: Map<String, Value>,
}

impl TransportDecorator {
    pub fn get_return_route(&self) -> Option<ReturnRoute> {
        self.return_route.to_owned()
    }
}

/// `Message` is an application message travelling inside an envelope
///
/// The envelope control members (`@id`, `@type`, `~transport`) are typed,
/// everything else lives in the open `payload` map and is serialized inline
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(crate = "self::serde")]
pub struct Message {
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<String>,

    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub(crate) kind: Option<String>,

    #[serde(rename = "~transport", default, skip_serializing_if = "Option::is_none")]
    pub(crate) transport: Option<TransportDecorator>,

    #[serde(flatten)]
    pub(crate) payload: Map<String, Value>,
}

impl Message {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: Some(kind.to_string()),
            ..Default::default()
        }
    }

    /// `from_value` accepts any JSON object as a message
    pub fn from_value(value: Value) -> Result<Self, ConnectionError> {
        if !value.is_object() {
            return Err(ConnectionError::DecodeError(
                "message must be a json object".to_string(),
            ));
        }

        serde_json::from_value(value).map_err(|err| ConnectionError::DecodeError(err.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, ConnectionError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| ConnectionError::DecodeError(err.to_string()))?;
        Self::from_value(value)
    }

    pub fn to_json(&self) -> Result<String, ConnectionError> {
        serde_json::to_string(self).map_err(|err| ConnectionError::JSONError(err.to_string()))
    }

    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.payload.insert(key.to_string(), value);
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn get_id(&self) -> Option<String> {
        self.id.to_owned()
    }

    pub fn get_kind(&self) -> Option<String> {
        self.kind.to_owned()
    }

    pub fn get_transport(&self) -> Option<TransportDecorator> {
        self.transport.to_owned()
    }

    pub fn get_payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn get_field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// `ensure_id` assigns a fresh `@id` when the message doesn't carry one yet
    pub fn ensure_id(&mut self) -> String {
        match &self.id {
            Some(id) => id.to_owned(),
            None => {
                let id = Uuid::new_v4().to_string();
                self.id = Some(id.clone());
                id
            }
        }
    }

    /// `set_return_route` writes `~transport.return_route`, other `~transport`
    /// members are left as they are
    pub fn set_return_route(&mut self, route: ReturnRoute) {
        let decorator = self.transport.get_or_insert_with(TransportDecorator::default);
        decorator.return_route = Some(route);
    }

    pub fn get_return_route(&self) -> Option<ReturnRoute> {
        self.transport
            .as_ref()
            .and_then(|decorator| decorator.get_return_route())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::standard::serde_json::json;

    #[test]
    fn test_plain_payload_roundtrip() {
        let msg = Message::from_value(json!({"foo": "bar"})).unwrap();
        assert!(msg.get_id().is_none());
        assert_eq!(msg.get_field("foo"), Some(&json!("bar")));

        let back: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(back, json!({"foo": "bar"}));
    }

    #[test]
    fn test_control_members_are_typed() {
        let msg = Message::from_value(json!({
            "@id": "abc",
            "@type": "https://didcomm.org/trust_ping/1.0/ping",
            "~transport": {"return_route": "all", "queued": true},
            "response_requested": true
        }))
        .unwrap();

        assert_eq!(msg.get_id(), Some("abc".to_string()));
        assert_eq!(
            msg.get_kind(),
            Some("https://didcomm.org/trust_ping/1.0/ping".to_string())
        );
        assert_eq!(msg.get_return_route(), Some(ReturnRoute::All));
        assert_eq!(msg.get_payload().len(), 1);
    }

    #[test]
    fn test_ensure_id_injects_once() {
        let mut msg = Message::new("test/1.0/hello");
        let id = msg.ensure_id();
        assert!(!id.is_empty());
        assert_eq!(msg.ensure_id(), id);
    }

    #[test]
    fn test_ensure_id_keeps_existing() {
        let mut msg = Message::new("test/1.0/hello").with_id("fixed");
        assert_eq!(msg.ensure_id(), "fixed");
    }

    #[test]
    fn test_set_return_route_preserves_transport_members() {
        let mut msg = Message::from_value(json!({"~transport": {"queued": true}})).unwrap();
        msg.set_return_route(ReturnRoute::All);

        let value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"~transport": {"queued": true, "return_route": "all"}})
        );
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        let msg = Message::from_value(json!(["a", "b"]));
        assert!(matches!(msg.unwrap_err(), ConnectionError::DecodeError(_)));

        let msg = Message::from_json("not json");
        assert!(matches!(msg.unwrap_err(), ConnectionError::DecodeError(_)));
    }
}
