use std::time::Duration;

use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SOCKET_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SOCKET_WRITE_TIMEOUT_SECS: u64 = 10;

/// `Transport` holds the bounds applied to every outbound delivery
///
/// A hung POST or a socket that never opens will be cut after these durations
/// and surfaced as a transport failure
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
pub struct Transport {
    pub(super) http_timeout_secs: u64,
    pub(super) socket_connect_timeout_secs: u64,
    pub(super) socket_write_timeout_secs: u64,
}

impl Transport {
    pub fn new(
        http_timeout_secs: u64,
        socket_connect_timeout_secs: u64,
        socket_write_timeout_secs: u64,
    ) -> Self {
        Self {
            http_timeout_secs,
            socket_connect_timeout_secs,
            socket_write_timeout_secs,
        }
    }

    pub fn get_http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn get_socket_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.socket_connect_timeout_secs)
    }

    pub fn get_socket_write_timeout(&self) -> Duration {
        Duration::from_secs(self.socket_write_timeout_secs)
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            socket_connect_timeout_secs: DEFAULT_SOCKET_CONNECT_TIMEOUT_SECS,
            socket_write_timeout_secs: DEFAULT_SOCKET_WRITE_TIMEOUT_SECS,
        }
    }
}

impl ToValidate for Transport {
    fn validate(&self) -> Result<(), CommonError> {
        if self.http_timeout_secs == 0 {
            return Err(CommonError::ValidationError(
                "config: transport:http_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.socket_connect_timeout_secs == 0 {
            return Err(CommonError::ValidationError(
                "config: transport:socket_connect_timeout_secs must be greater than zero"
                    .to_string(),
            ));
        }

        if self.socket_write_timeout_secs == 0 {
            return Err(CommonError::ValidationError(
                "config: transport:socket_write_timeout_secs must be greater than zero"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::env;
    use std::path::PathBuf;

    use rstdev_config::format::use_toml;
    use rstdev_config::parser::from_file;
    use rstdev_config::{types::ConfigError, Builder};
    use table_test::table_test;

    use crate::common::helpers;

    #[test]
    fn test_parse_transport_config() -> Result<(), ConfigError> {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("src/config/fixtures");

        let toml_file = format!("{}/config_transport.toml", path.display());
        let config_toml = {
            let config_builder: Result<Transport, ConfigError> =
                Builder::new(from_file(toml_file)).fetch()?.parse(use_toml);

            config_builder
        };

        assert!(!config_toml.is_err());

        let transport = config_toml.unwrap();
        assert_eq!(transport.get_http_timeout(), Duration::from_secs(15));
        assert_eq!(transport.get_socket_connect_timeout(), Duration::from_secs(5));
        assert_eq!(transport.get_socket_write_timeout(), Duration::from_secs(3));
        Ok(())
    }

    #[test]
    fn test_default_is_valid() {
        let transport = Transport::default();
        assert!(helpers::validate(transport.clone()).is_ok());
        assert_eq!(
            transport.get_http_timeout(),
            Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_validation_failed() {
        let table = vec![
            (Transport::new(0, 10, 10), "http_timeout_secs"),
            (Transport::new(30, 0, 10), "socket_connect_timeout_secs"),
            (Transport::new(30, 10, 0), "socket_write_timeout_secs"),
        ];

        for (validator, input, expected) in table_test!(table) {
            let validation = helpers::validate(input.clone());
            assert!(validation.is_err());

            let msg = match validation.unwrap_err() {
                CommonError::ValidationError(msg) => msg,
                _ => panic!("unexpected error variant"),
            };

            validator
                .given(&format!("{:?}", input))
                .when("validate")
                .then("points to the zero field")
                .assert_eq(true, msg.contains(expected));
        }
    }
}
