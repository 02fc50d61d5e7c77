use crate::client::{ClientConfig, DEFAULT_BASE_URL};
use crate::utils::MAX_LOOKBACK_DAYS;
use anyhow::{bail, Context};
use serde::Deserialize;
use std::env;
use std::fs;

pub const DEFAULT_STOCK_CODES: [&str; 3] = ["000001.SZ", "600000.SH", "000002.SZ"];
// Only the first stock is queried by default to stay under the upstream rate limit
pub const DEFAULT_MAX_STOCKS: usize = 1;
pub const DEFAULT_LOOKBACK_DAYS: u32 = 10;

// YAML configuration structure, every key optional
#[derive(Deserialize, Debug, Default)]
pub struct ConfigYaml {
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub stock_codes: Option<Vec<String>>,
    pub max_stocks: Option<usize>,
    pub lookback_days: Option<u32>,
}

// Holds application-wide settings
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub base_url: String,
    pub user_agent: Option<String>,
    pub stock_codes: Vec<String>,
    pub max_stocks: usize,
    pub lookback_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: None,
            stock_codes: DEFAULT_STOCK_CODES.iter().map(|s| s.to_string()).collect(),
            max_stocks: DEFAULT_MAX_STOCKS,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

impl AppConfig {
    // Load configuration from YAML file or environment variables
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            Self::from_yaml(&config_file)
        } else {
            Ok(Self::from_env())
        }
    }

    pub fn from_yaml(file_path: &str) -> anyhow::Result<Self> {
        let yaml_content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read config file {}", file_path))?;
        Self::from_yaml_str(&yaml_content)
    }

    pub fn from_yaml_str(yaml_content: &str) -> anyhow::Result<Self> {
        let yaml_config: ConfigYaml =
            serde_yaml::from_str(yaml_content).context("Failed to parse YAML config")?;
        let defaults = Self::default();

        if let Some(days) = yaml_config.lookback_days {
            if days > MAX_LOOKBACK_DAYS {
                bail!("lookback_days {} exceeds the maximum of {}", days, MAX_LOOKBACK_DAYS);
            }
        }

        Ok(Self {
            base_url: yaml_config.base_url.unwrap_or(defaults.base_url),
            user_agent: yaml_config.user_agent,
            stock_codes: yaml_config
                .stock_codes
                .filter(|codes| !codes.is_empty())
                .unwrap_or(defaults.stock_codes),
            max_stocks: yaml_config.max_stocks.unwrap_or(defaults.max_stocks),
            lookback_days: yaml_config.lookback_days.unwrap_or(defaults.lookback_days),
        })
    }

    // Load all configuration from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unparsable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("STOCK_API_BASE_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.base_url);

        let user_agent = lookup("STOCK_API_USER_AGENT").filter(|s| !s.trim().is_empty());

        let stock_codes = lookup("STOCK_CODES")
            .map(|s| parse_stock_codes(&s))
            .filter(|codes| !codes.is_empty())
            .unwrap_or(defaults.stock_codes);

        let max_stocks = lookup("DEMO_MAX_STOCKS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.max_stocks);

        let lookback_days = lookup("DEMO_LOOKBACK_DAYS")
            .and_then(|s| s.trim().parse::<u32>().ok())
            .filter(|days| *days <= MAX_LOOKBACK_DAYS)
            .unwrap_or(defaults.lookback_days);

        Self {
            base_url,
            user_agent,
            stock_codes,
            max_stocks,
            lookback_days,
        }
    }

    /// Merge command-line values over the loaded ones. Empty/absent values keep the loaded setting.
    pub fn apply_overrides(
        &mut self,
        base_url: Option<String>,
        stock_codes: Vec<String>,
        max_stocks: Option<usize>,
        lookback_days: Option<u32>,
    ) -> anyhow::Result<()> {
        if let Some(base_url) = base_url {
            self.base_url = base_url;
        }
        if !stock_codes.is_empty() {
            self.stock_codes = stock_codes;
        }
        if let Some(max_stocks) = max_stocks {
            self.max_stocks = max_stocks;
        }
        if let Some(days) = lookback_days {
            if days > MAX_LOOKBACK_DAYS {
                bail!("--days {} exceeds the maximum of {}", days, MAX_LOOKBACK_DAYS);
            }
            self.lookback_days = days;
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(&self.base_url);
        match &self.user_agent {
            Some(user_agent) => config.with_user_agent(user_agent),
            None => config,
        }
    }

    /// Stock codes the demo will actually query.
    pub fn demo_stocks(&self) -> &[String] {
        let count = self.max_stocks.min(self.stock_codes.len());
        &self.stock_codes[..count]
    }
}

pub fn parse_stock_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
