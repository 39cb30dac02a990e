//! TOML-backed configuration properties.

use crate::application_service::content_handler::{ConfigError, ConfigurationSource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Named string properties, read from a `[properties]` table:
///
/// ```toml
/// [properties]
/// "shr.contenthandler.unstructureddatahandler.key" = "UnstructuredDataHandler"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertiesConfig {
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl PropertiesConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;

        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

impl ConfigurationSource for PropertiesConfig {
    fn property(&self, name: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.properties.get(name).cloned())
    }
}
