use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use kingshelf_client::catalog::DEFAULT_API_URL;

/// Default base URL for the external credential-check service.
pub const DEFAULT_AUTH_URL: &str = "https://reqres.in/api";

/// Page size the original client hard-coded for every list request.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_url: String,
    pub auth_url: String,
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Where the config file lives, when the platform has a config
    /// directory at all.
    pub fn path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|dir| dir.join("kingshelf").join("config.json"))
    }

    pub fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(content) = std::fs::read_to_string(&path) {
                if let Ok(config) = serde_json::from_str(&content) {
                    return config;
                }
            }
        }
        Self::default()
    }

    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(path) = Self::path() {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let content = serde_json::to_string_pretty(self)?;
            std::fs::write(path, content)?;
        }
        Ok(())
    }

    /// Validate the configured endpoints and page size before anything is
    /// constructed from them.
    pub fn api_url(&self) -> Result<Url> {
        Url::parse(&self.api_url)
            .with_context(|| format!("invalid API URL: {}", self.api_url))
    }

    pub fn auth_url(&self) -> Result<Url> {
        Url::parse(&self.auth_url)
            .with_context(|| format!("invalid auth URL: {}", self.auth_url))
    }

    pub fn checked_page_size(&self) -> Result<u32> {
        anyhow::ensure!(self.page_size > 0, "page size must be at least 1");
        Ok(self.page_size)
    }
}
