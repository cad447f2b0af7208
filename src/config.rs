//! Configuration for metakv
//!
//! Centralized configuration with sensible defaults.

/// Main configuration for a metakv instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Store Configuration
    // -------------------------------------------------------------------------
    /// Instance name, used in log output to tell stores apart
    pub name: String,

    // -------------------------------------------------------------------------
    // Key Namespace Configuration
    // -------------------------------------------------------------------------
    /// Key prefix under which the configuration adapter stores its entries
    pub config_key_prefix: Vec<u8>,

    /// Key prefix under which deployment-unit records are stored
    pub deploy_key_prefix: Vec<u8>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "metakv".to_string(),
            config_key_prefix: b"cfg.".to_vec(),
            deploy_key_prefix: b"deploy.".to_vec(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the instance name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Set the configuration key prefix
    pub fn config_key_prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.config.config_key_prefix = prefix.into();
        self
    }

    /// Set the deployment key prefix
    pub fn deploy_key_prefix(mut self, prefix: impl Into<Vec<u8>>) -> Self {
        self.config.deploy_key_prefix = prefix.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
