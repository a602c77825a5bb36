use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::fixtures::{DEFAULT_METHODS, Fixture};

pub const DEFAULT_PORT: u16 = 8089;

/// Default config directory: ~/.mlmd-mock/
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mlmd-mock")
}

/// Default config file path: ~/.mlmd-mock/settings.json
pub fn default_config_path() -> PathBuf {
    config_dir().join("settings.json")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-method overrides, keyed by MetadataStoreService method name.
    #[serde(default)]
    pub routes: BTreeMap<String, RouteConfig>,
}

/// What the server answers for one method.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RouteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixture: Option<Fixture>,
    /// Raw protobuf bytes to serve instead of a canned fixture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_file: Option<PathBuf>,
    #[serde(default)]
    pub status: u32,
    #[serde(default)]
    pub message: String,
}

fn default_version() -> u32 {
    1
}
fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            port: default_port(),
            routes: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_port_override(std::env::var("MLMD_MOCK_PORT").ok())
    }

    /// Apply a raw `MLMD_MOCK_PORT` value; unparsable values keep the current port.
    fn with_port_override(mut self, raw: Option<String>) -> Self {
        let Some(raw) = raw else {
            return self;
        };
        match raw.trim().parse() {
            Ok(port) => self.port = port,
            Err(e) => warn!("Ignoring MLMD_MOCK_PORT={raw:?}: {e}; using port {}", self.port),
        }
        self
    }

    /// Built-in routes merged with the configured overrides.
    pub fn resolved_routes(&self) -> Result<BTreeMap<String, RouteConfig>> {
        let mut routes: BTreeMap<String, RouteConfig> = DEFAULT_METHODS
            .iter()
            .map(|method| {
                let route = RouteConfig {
                    fixture: Fixture::default_for(method),
                    ..Default::default()
                };
                (method.to_string(), route)
            })
            .collect();

        for (method, route) in &self.routes {
            route.validate(method)?;
            routes.insert(method.clone(), route.clone());
        }
        Ok(routes)
    }

    /// Document written by `config init`.
    pub fn default_document() -> serde_json::Value {
        let routes: serde_json::Map<String, serde_json::Value> = DEFAULT_METHODS
            .iter()
            .filter_map(|method| {
                let fixture = Fixture::default_for(method)?;
                Some((
                    method.to_string(),
                    serde_json::json!({ "fixture": fixture, "status": 0, "message": "" }),
                ))
            })
            .collect();
        serde_json::json!({
            "version": 1,
            "port": DEFAULT_PORT,
            "routes": routes,
        })
    }
}

impl RouteConfig {
    pub fn validate(&self, method: &str) -> Result<()> {
        if self.fixture.is_some() && self.payload_file.is_some() {
            bail!("Route {method}: set either `fixture` or `payload_file`, not both");
        }
        Ok(())
    }

    /// Serialized protobuf body for this route.
    pub fn load_payload(&self) -> Result<Vec<u8>> {
        if let Some(path) = &self.payload_file {
            return std::fs::read(path)
                .with_context(|| format!("Failed to read payload file {}", path.display()));
        }
        Ok(self.fixture.map(Fixture::payload).unwrap_or_default())
    }
}
