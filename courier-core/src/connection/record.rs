use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;

use crate::doc::Doc;
use crate::keys::LocalKeypair;

use super::types::{ConnectionError, ConnectionID};

/// `KeyEncoded` is the base58 storage form of the local keypair
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct KeyEncoded {
    #[serde(rename = "privateKey")]
    pub private_key: String,

    #[serde(rename = "publicKey")]
    pub public_key: String,
}

impl KeyEncoded {
    pub fn to_keypair(&self) -> Result<LocalKeypair, ConnectionError> {
        LocalKeypair::from_b58(&self.private_key, &self.public_key)
    }
}

impl From<&LocalKeypair> for KeyEncoded {
    fn from(keypair: &LocalKeypair) -> Self {
        Self {
            private_key: keypair.get_private_key_b58().to_string(),
            public_key: keypair.get_public_key_b58().to_string(),
        }
    }
}

/// `ConnectionRecord` is everything a connection needs to be restored later
///
/// The selected service and the transport protocol are not stored, they are
/// derived again from `did_doc` on restore
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct ConnectionRecord {
    pub id: ConnectionID,
    pub label: String,
    pub did_doc: Doc,
    pub my_key_b58: KeyEncoded,
}

impl ConnectionRecord {
    pub fn to_json(&self) -> Result<String, ConnectionError> {
        serde_json::to_string(self).map_err(|err| ConnectionError::JSONError(err.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, ConnectionError> {
        serde_json::from_str(raw).map_err(|err| ConnectionError::JSONError(err.to_string()))
    }
}

impl TryInto<Vec<u8>> for ConnectionRecord {
    type Error = ConnectionError;

    fn try_into(self) -> Result<Vec<u8>, Self::Error> {
        serde_json::to_vec(&self).map_err(|err| ConnectionError::JSONError(err.to_string()))
    }
}

impl TryFrom<Vec<u8>> for ConnectionRecord {
    type Error = ConnectionError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        serde_json::from_slice(&bytes).map_err(|err| ConnectionError::JSONError(err.to_string()))
    }
}
