//! Connector configuration schema (catalog TOML file)

use serde::{Deserialize, Serialize};

/// Snowflake connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnowflakeConfig {
    /// Account locator, e.g. `xy12345.us-east-1`
    pub account: String,

    /// Login name
    pub user: String,

    /// Password for password authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Path to a PEM private key for key-pair authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<std::path::PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Default database for the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Default schema for the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl SnowflakeConfig {
    /// Check that exactly one credential is configured
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account.trim().is_empty() {
            return Err(ConfigError::Invalid("snowflake.account is empty".to_string()));
        }
        if self.user.trim().is_empty() {
            return Err(ConfigError::Invalid("snowflake.user is empty".to_string()));
        }
        match (&self.password, &self.private_key_path) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (None, None) => Err(ConfigError::Invalid(
                "one of snowflake.password or snowflake.private_key_path is required".to_string(),
            )),
            (Some(_), Some(_)) => Err(ConfigError::Invalid(
                "snowflake.password and snowflake.private_key_path are mutually exclusive".to_string(),
            )),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// Name the catalog is registered under
    pub catalog_name: String,

    /// Connector type
    #[serde(rename = "type", default = "default_connector_type")]
    pub connector_type: String,

    /// Snowflake connection settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snowflake: Option<SnowflakeConfig>,
}

fn default_connector_type() -> String {
    "snowflake".to_string()
}

impl ConnectorConfig {
    /// Create a config with no connection settings
    pub fn new(catalog_name: impl Into<String>) -> Self {
        Self {
            catalog_name: catalog_name.into(),
            connector_type: default_connector_type(),
            snowflake: None,
        }
    }

    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
catalog_name = "snowflake"

[snowflake]
account = "xy12345.us-east-1"
user = "METACAT"
password = "secret"
warehouse = "COMPUTE_WH"
role = "METACAT_READER"
"#;

    #[test]
    fn parse_sample_config() {
        let config = ConnectorConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.catalog_name, "snowflake");
        assert_eq!(config.connector_type, "snowflake");

        let sf = config.snowflake.unwrap();
        assert_eq!(sf.account, "xy12345.us-east-1");
        assert_eq!(sf.warehouse.as_deref(), Some("COMPUTE_WH"));
        assert!(sf.database.is_none());
        assert!(sf.validate().is_ok());
    }

    #[test]
    fn missing_catalog_name_is_parse_error() {
        let result = ConnectorConfig::from_toml("type = \"snowflake\"");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn credentials_are_exclusive() {
        let mut sf = ConnectorConfig::from_toml(SAMPLE).unwrap().snowflake.unwrap();
        sf.private_key_path = Some("/keys/rsa.p8".into());
        assert!(matches!(sf.validate(), Err(ConfigError::Invalid(_))));

        sf.password = None;
        assert!(sf.validate().is_ok());

        sf.private_key_path = None;
        assert!(matches!(sf.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = ConnectorConfig::from_toml(SAMPLE).unwrap();
        let toml = toml::to_string(&config).unwrap();
        let parsed = ConnectorConfig::from_toml(&toml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn save_and_load_file() {
        let path = std::env::temp_dir().join(format!("metacat-config-{}.toml", std::process::id()));
        let config = ConnectorConfig::new("sf_prod");
        config.save_to_file(&path).unwrap();

        let loaded = ConnectorConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}
