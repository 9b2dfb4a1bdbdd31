// ⚙️ Settings - TOML file with environment overrides

use crate::error::{Result, TipError};
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs};

pub const ENDPOINT_VAR: &str = "AZURE_DOCUMENT_INTELLIGENCE_ENDPOINT";
pub const KEY_VAR: &str = "AZURE_DOCUMENT_INTELLIGENCE_KEY";
pub const BIND_ADDR_VAR: &str = "TIP_POOL_BIND_ADDR";
pub const CONFIG_PATH_VAR: &str = "TIP_POOL_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "tip-pool.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub ocr: OcrSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub api_version: String,
    pub max_poll_attempts: u32,
    pub poll_interval_ms: u64,
}

impl Default for OcrSettings {
    fn default() -> Self {
        OcrSettings {
            endpoint: None,
            api_key: None,
            model: "prebuilt-layout".to_string(),
            api_version: "2023-07-31".to_string(),
            max_poll_attempts: 20,
            poll_interval_ms: 1500,
        }
    }
}

/// Endpoint and key, both present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub endpoint: String,
    pub api_key: String,
}

impl OcrSettings {
    /// # Errors
    /// `Configuration` when either value is missing or blank.
    pub fn credentials(&self) -> Result<Credentials> {
        let present = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from);

        match (present(&self.endpoint), present(&self.api_key)) {
            (Some(endpoint), Some(api_key)) => Ok(Credentials {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                api_key,
            }),
            _ => Err(TipError::Configuration(
                "Azure Document Intelligence credentials not configured".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Settings {
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Failed to parse settings TOML")
    }

    /// Read `path` when it exists, otherwise start from defaults.
    pub fn from_file_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {:?}", path))?;
        Self::from_toml(&content)
    }

    /// Settings file (`TIP_POOL_CONFIG` or `tip-pool.toml`), then environment.
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut settings = Self::from_file_or_default(path)?;
        settings.apply_overrides(|name| env::var(name).ok());
        Ok(settings)
    }

    /// Environment values win over the file. `lookup` is `env::var` outside tests.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup(ENDPOINT_VAR) {
            self.ocr.endpoint = Some(endpoint);
        }
        if let Some(key) = lookup(KEY_VAR) {
            self.ocr.api_key = Some(key);
        }
        if let Some(addr) = lookup(BIND_ADDR_VAR) {
            self.server.bind_addr = addr;
        }
    }
}
