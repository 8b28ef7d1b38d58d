use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

use super::Transport;

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(crate = "self::serde")]
pub struct Config {
    pub(super) transport: Transport,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transport(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }
}

impl ToValidate for Config {
    fn validate(&self) -> Result<(), CommonError> {
        self.transport.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::helpers;

    #[test]
    fn test_default_validation_success() {
        let cfg = Config::default();
        assert!(helpers::validate(cfg).is_ok());
    }

    #[test]
    fn test_from_toml_string() {
        let raw = r#"
            [transport]
            http_timeout_secs = 12
            socket_connect_timeout_secs = 6
            socket_write_timeout_secs = 2
        "#;

        let cfg: Config = toml::from_str(raw).unwrap();
        assert_eq!(cfg.transport(), &Transport::new(12, 6, 2));
        assert!(helpers::validate(cfg).is_ok());
    }

    #[test]
    fn test_missing_section_is_rejected() {
        let cfg: Result<Config, toml::de::Error> = toml::from_str("");
        assert!(cfg.is_err());
    }

    #[test]
    fn test_validation_failed() {
        let cfg = Config::with_transport(Transport::new(0, 0, 0));
        let validation = helpers::validate(cfg);
        assert!(validation.is_err());
        assert!(matches!(
            validation.unwrap_err(),
            CommonError::ValidationError(_)
        ))
    }
}
