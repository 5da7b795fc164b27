//! Project settings read from `.taskpad/config.toml`.

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

const CONFIG_DIR: &str = ".taskpad";
const CONFIG_FILE: &str = "config.toml";

/// Collection written to when none is configured.
pub const DEFAULT_COLLECTION: &str = "tasks";

/// Top-level project configuration loaded from `.taskpad/config.toml`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Remote persistence settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl ProjectConfig {
    /// Load configuration from a working directory.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, does not parse, or
    /// names an unusable collection.
    pub fn from_workdir(workdir: impl AsRef<Path>) -> Result<Self> {
        let config_path = workdir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        Ok(config)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    /// Returns an error for malformed TOML or an invalid collection name.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let name = self.persistence.collection.as_str();
        if name.is_empty() {
            bail!("persistence.collection must not be empty");
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            bail!("persistence.collection '{name}' may only contain letters, digits, '-' and '_'");
        }
        Ok(())
    }
}

/// Remote persistence block.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PersistenceConfig {
    /// Whether new tasks are written to the document collection.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Name of the document collection.
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            collection: default_collection(),
        }
    }
}

const fn default_enabled() -> bool {
    true
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_owned()
}
