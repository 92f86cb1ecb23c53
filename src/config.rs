use anyhow::{Context, Result};
use log::debug;
use std::{env, time::Duration};

pub const DEFAULT_API_URL: &str = "https://sdui-server.onrender.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {:?}", path);
        }
        Self::from_vars(
            env::var("SDUI_API_URL").ok(),
            env::var("SDUI_TIMEOUT_SECS").ok(),
        )
    }

    fn from_vars(api_url: Option<String>, timeout: Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            config.api_url = url;
        }
        if let Some(secs) = timeout {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("SDUI_TIMEOUT_SECS is not a number: {}", secs))?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_api(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        self
    }
}
