use anyhow::{Context, Result, anyhow};
use libvenue::geo::Coordinates;
use serde::{Deserialize, Deserializer};
use std::{collections::HashMap, path::Path};
use tracing::debug;

#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ListenConfig {
    pub(crate) host: String,
    pub(crate) port: u16,
}

const DEFAULT_HTTP_PORT: u16 = 80;
const DEFAULT_HOST: &str = "0.0.0.0";
fn default_listen() -> ListenConfig {
    ListenConfig {
        host: DEFAULT_HOST.to_string(),
        port: DEFAULT_HTTP_PORT,
    }
}

// This handles the case where the `listen` block is PRESENT, but a field may be missing.
fn deserialize_listen_with_default_port<'de, D>(deserializer: D) -> Result<ListenConfig, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct PartialListenConfig {
        host: Option<String>,
        port: Option<u16>,
    }

    let partial_config = PartialListenConfig::deserialize(deserializer)?;

    Ok(ListenConfig {
        host: partial_config
            .host
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: partial_config.port.unwrap_or(DEFAULT_HTTP_PORT),
    })
}

/// Certificate and key for serving over https
#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct TlsConfig {
    pub(crate) cert: String,
    pub(crate) key: String,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct EnvConfig {
    #[serde(default = "default_listen")]
    #[serde(deserialize_with = "deserialize_listen_with_default_port")]
    pub(crate) listen: ListenConfig,
    pub(crate) database: String,
    /// The point that distances are measured from when a query doesn't give one
    #[serde(default)]
    pub(crate) reference_point: Option<Coordinates>,
    pub(crate) tls: Option<TlsConfig>,
}

impl EnvConfig {
    /// The reference point for location queries
    pub(crate) fn reference_point(&self) -> Coordinates {
        self.reference_point.unwrap_or_default()
    }

    /// Load the configuration for the environment `envname` from a yaml file
    /// that contains one section per environment
    pub(crate) fn load(path: &Path, envname: &str) -> Result<Self> {
        debug!(?path, envname, "Loading configuration");
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read config file '{}'", path.display()))?;
        Self::parse(&contents, envname)
    }

    pub(crate) fn parse(yaml: &str, envname: &str) -> Result<Self> {
        let mut configs: HashMap<String, EnvConfig> =
            serde_yaml::from_str(yaml).with_context(|| "Unable to parse config file")?;
        configs
            .remove(envname)
            .ok_or_else(|| anyhow!("No configuration found for environment '{envname}'"))
    }
}
