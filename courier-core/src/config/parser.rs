use rstdev_config::format::use_toml;
use rstdev_config::parser::from_file;
use rstdev_config::{types::ConfigError, Builder};

use crate::common::helpers;

use super::Config;

pub struct Parser {
    conf_file: String,
}

impl Parser {
    pub fn new(conf_file: String) -> Self {
        Self { conf_file }
    }

    pub fn parse(&self) -> Result<Config, ConfigError> {
        let config_toml = {
            let config_builder: Result<Config, ConfigError> =
                Builder::new(from_file(self.conf_file.to_owned()))
                    .fetch()?
                    .parse(use_toml);

            config_builder
        };

        config_toml
    }

    /// `parse_validated` parses the file and rejects configs that fail [`ToValidate`](crate::common::types::ToValidate)
    pub fn parse_validated(&self) -> Result<Config, String> {
        let config = self.parse().map_err(|err| format!("{:?}", err))?;
        helpers::validate(config.clone()).map_err(|err| err.to_string())?;
        Ok(config)
    }
}
